// --- File: scene.rs ---
//! Per-frame geometry for the tank, in buffer pixels. The GPU side only
//! uploads what is built here; the shaders map pixels to clip space.

use crate::constants::*;
use crate::fish::{Fish, FishKind, SwimMode};
use crate::simulation::FishTank;
use glam::{Affine2, Vec2};

// --- GPU Vertex Layouts ---
// These MUST match the vertex inputs in shader.wgsl.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ColorVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TextureSlot {
    Preset(usize),
    User(usize),
}

/// One textured quad, corners in strip order: top-left, top-right,
/// bottom-left, bottom-right (before transform).
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteQuad {
    pub texture: TextureSlot,
    pub corners: [SpriteVertex; 4],
}

impl SpriteQuad {
    pub fn triangles(&self) -> [SpriteVertex; 6] {
        let [a, b, c, d] = self.corners;
        [a, b, c, c, b, d]
    }
}

#[derive(Debug, Default, Clone)]
pub struct FrameGeometry {
    /// Triangle list: gradient, sand, then seaweed.
    pub background: Vec<ColorVertex>,
    /// Drawn in order; later quads land on top.
    pub sprites: Vec<SpriteQuad>,
}

// --- Background ---

fn color_rect(out: &mut Vec<ColorVertex>, min: Vec2, max: Vec2, top: [f32; 4], bottom: [f32; 4]) {
    let v = |x: f32, y: f32, color| ColorVertex {
        position: [x, y],
        color,
    };
    let (tl, tr) = (v(min.x, min.y, top), v(max.x, min.y, top));
    let (bl, br) = (v(min.x, max.y, bottom), v(max.x, max.y, bottom));
    out.extend_from_slice(&[tl, tr, bl, bl, tr, br]);
}

pub fn build_background(width: f32, height: f32, dpr: f32) -> Vec<ColorVertex> {
    let mut out = Vec::with_capacity(6 * (2 + SEAWEED_STRIPS.len()));
    color_rect(
        &mut out,
        Vec2::ZERO,
        Vec2::new(width, height),
        BACKGROUND_TOP,
        BACKGROUND_BOTTOM,
    );

    let sand_y = height * SAND_TOP_RATIO;
    color_rect(
        &mut out,
        Vec2::new(0.0, sand_y),
        Vec2::new(width, height),
        SAND_TOP,
        SAND_BOTTOM,
    );

    for &(x_frac, strip_w, strip_h) in SEAWEED_STRIPS.iter() {
        let x = width * x_frac;
        color_rect(
            &mut out,
            Vec2::new(x, sand_y - strip_h * dpr),
            Vec2::new(x + strip_w * dpr, sand_y),
            SEAWEED_TIP,
            SEAWEED_BASE,
        );
    }
    out
}

// --- Fish ---

fn quad(
    texture: TextureSlot,
    transform: Affine2,
    min: Vec2,
    max: Vec2,
    uvs: [[f32; 2]; 4],
) -> SpriteQuad {
    let local = [
        Vec2::new(min.x, min.y),
        Vec2::new(max.x, min.y),
        Vec2::new(min.x, max.y),
        Vec2::new(max.x, max.y),
    ];
    let corners = std::array::from_fn(|i| SpriteVertex {
        position: transform.transform_point2(local[i]).to_array(),
        uv: uvs[i],
    });
    SpriteQuad { texture, corners }
}

fn at(translation: Vec2, angle: f32) -> Affine2 {
    Affine2::from_scale_angle_translation(Vec2::ONE, angle, translation)
}

/// Body quad plus tail slices hinged at their leading edge.
fn ambient_quads(
    fish: &Fish,
    preset_index: usize,
    size: f32,
    scale: f32,
    dpr: f32,
    out: &mut Vec<SpriteQuad>,
) {
    let slot = TextureSlot::Preset(preset_index);
    let left = fish.faces_left();
    let origin = fish.position * dpr;
    let body_w = size * AMBIENT_BODY_RATIO * scale * dpr;
    let body_h = size * AMBIENT_BODY_HEIGHT_RATIO * scale * dpr;
    let r = AMBIENT_BODY_RATIO;

    let body_uv = if left {
        [[r, 0.0], [0.0, 0.0], [r, 1.0], [0.0, 1.0]]
    } else {
        [[0.0, 0.0], [r, 0.0], [0.0, 1.0], [r, 1.0]]
    };
    let body_x = if left { origin.x - body_w } else { origin.x };
    out.push(quad(
        slot,
        at(Vec2::new(body_x, origin.y), 0.0),
        Vec2::ZERO,
        Vec2::new(body_w, body_h),
        body_uv,
    ));

    let n = AMBIENT_TAIL_SLICES as f32;
    let tail_span = 1.0 - r;
    let slice_w = size * tail_span * scale * dpr / n;
    for i in 0..AMBIENT_TAIL_SLICES {
        let fi = i as f32;
        let wave = (fish.tail_phase + fi * AMBIENT_TAIL_PHASE_STEP).sin()
            * AMBIENT_TAIL_MAX_DEG.to_radians()
            * ((fi + 1.0) / n);
        let (uv, x, angle) = if left {
            let u0 = r - ((fi + 1.0) / n) * tail_span;
            let u1 = r - (fi / n) * tail_span;
            (
                [[u1, 0.0], [u0, 0.0], [u1, 1.0], [u0, 1.0]],
                origin.x + fi * slice_w,
                -wave,
            )
        } else {
            let u0 = r + (fi / n) * tail_span;
            let u1 = r + ((fi + 1.0) / n) * tail_span;
            (
                [[u0, 0.0], [u1, 0.0], [u0, 1.0], [u1, 1.0]],
                origin.x + body_w + fi * slice_w,
                wave,
            )
        };
        out.push(quad(
            slot,
            at(Vec2::new(x, origin.y), angle),
            Vec2::ZERO,
            Vec2::new(slice_w, body_h),
            uv,
        ));
    }
}

/// Head band plus tail bands of a head-up sprite turned a quarter turn so it
/// swims horizontally. Wave bends the tail bands, Pulse widens them.
fn user_quads(
    fish: &Fish,
    texture_index: usize,
    img_width: f32,
    img_height: f32,
    swim_mode: SwimMode,
    dpr: f32,
    out: &mut Vec<SpriteQuad>,
) {
    if img_width <= 0.0 {
        return;
    }
    let slot = TextureSlot::User(texture_index);
    let left = fish.faces_left();
    let center = fish.position * dpr;
    let scale = fish.target_height * dpr / img_width;
    let hw = img_width * scale / 2.0;
    let hh = img_height * scale / 2.0;
    let base = -std::f32::consts::FRAC_PI_2;

    let (head_ratio, slices) = match swim_mode {
        SwimMode::Wave => (WAVE_HEAD_RATIO, WAVE_TAIL_SLICES),
        SwimMode::Pulse => (PULSE_HEAD_RATIO, PULSE_TAIL_SLICES),
    };
    let n = slices as f32;
    let slice_ratio = (1.0 - head_ratio) / n;

    for i in 0..=slices {
        let (v0, v1) = if i == 0 {
            (0.0, head_ratio)
        } else {
            let ti = (i - 1) as f32;
            (head_ratio + ti * slice_ratio, head_ratio + (ti + 1.0) * slice_ratio)
        };
        let y0 = -hh + v0 * hh * 2.0;
        let y1 = -hh + v1 * hh * 2.0;
        let progress = i as f32 / n;

        let (angle, stretch) = match swim_mode {
            SwimMode::Wave if i > 0 => {
                let wave = (fish.tail_phase + i as f32 * WAVE_PHASE_STEP).sin()
                    * WAVE_MAX_DEG.to_radians()
                    * progress;
                (base + wave, 1.0)
            }
            SwimMode::Pulse if i > 0 => {
                let s = 1.0
                    + (fish.tail_phase + i as f32 * PULSE_PHASE_STEP).sin()
                        * PULSE_MAX_STRETCH
                        * progress;
                (base, s)
            }
            _ => (base, 1.0),
        };

        let uv = if left {
            [[0.0, v0], [1.0, v0], [0.0, v1], [1.0, v1]]
        } else {
            [[0.0, 1.0 - v0], [1.0, 1.0 - v0], [0.0, 1.0 - v1], [1.0, 1.0 - v1]]
        };
        out.push(quad(
            slot,
            at(center, angle),
            Vec2::new(-hw * stretch, y0),
            Vec2::new(hw * stretch, y1),
            uv,
        ));
    }
}

pub fn fish_quads(fish: &Fish, dpr: f32, out: &mut Vec<SpriteQuad>) {
    match fish.kind {
        FishKind::Ambient {
            preset_index,
            size,
            scale,
        } => ambient_quads(fish, preset_index, size, scale, dpr, out),
        FishKind::User {
            texture_index,
            img_width,
            img_height,
            swim_mode,
            ..
        } => user_quads(
            fish,
            texture_index,
            img_width,
            img_height,
            swim_mode,
            dpr,
            out,
        ),
    }
}

/// Geometry for the current tank state. `width`/`height` are buffer pixels.
pub fn build_frame(tank: &FishTank, width: f32, height: f32, dpr: f32) -> FrameGeometry {
    let mut sprites = Vec::with_capacity(tank.fish_count() * (1 + PULSE_TAIL_SLICES));
    for fish in tank.fishes() {
        fish_quads(fish, dpr, &mut sprites);
    }
    FrameGeometry {
        background: build_background(width, height, dpr),
        sprites,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TankConfig;
    use crate::fish::FishRecord;

    fn user_tank(mode: SwimMode) -> FishTank {
        let mut tank = FishTank::with_seed(400.0, 300.0, TankConfig::default(), 11);
        tank.add_fish(FishRecord {
            fish_id: Some("u".into()),
            texture_index: 3,
            img_width: 100.0,
            img_height: 150.0,
            likes: 0,
            swim_mode: mode,
        });
        tank
    }

    fn quads_of(fish: &Fish) -> Vec<SpriteQuad> {
        let mut out = Vec::new();
        fish_quads(fish, 1.0, &mut out);
        out
    }

    fn span(quad: &SpriteQuad, axis: usize) -> f32 {
        let values = quad.corners.map(|c| c.position[axis]);
        let max = values.iter().cloned().fold(f32::MIN, f32::max);
        let min = values.iter().cloned().fold(f32::MAX, f32::min);
        max - min
    }

    #[test]
    fn slice_counts_per_style() {
        let wave = user_tank(SwimMode::Wave);
        assert_eq!(quads_of(&wave.fishes()[0]).len(), 1 + WAVE_TAIL_SLICES);

        let pulse = user_tank(SwimMode::Pulse);
        assert_eq!(quads_of(&pulse.fishes()[0]).len(), 1 + PULSE_TAIL_SLICES);

        let mut ambient = FishTank::with_seed(400.0, 300.0, TankConfig::default(), 1);
        ambient.add_ambient_fish(4);
        let quads = quads_of(&ambient.fishes()[0]);
        assert_eq!(quads.len(), 1 + AMBIENT_TAIL_SLICES);
        assert!(quads.iter().all(|q| q.texture == TextureSlot::Preset(4)));
    }

    #[test]
    fn background_has_gradient_sand_and_seaweed() {
        let bg = build_background(800.0, 600.0, 2.0);
        assert_eq!(bg.len(), 6 * (2 + SEAWEED_STRIPS.len()));
        assert_eq!(bg[0].color, BACKGROUND_TOP);
        assert_eq!(bg[6].position[1], 600.0 * SAND_TOP_RATIO);
        // First strip: 80 logical px tall at dpr 2.
        let strip = &bg[12..18];
        assert!((strip[0].position[0] - 96.0).abs() < 1e-3);
        assert!((strip[0].position[1] - 368.0).abs() < 1e-3);
        assert_eq!(strip[0].color, SEAWEED_TIP);
    }

    #[test]
    fn ambient_body_mirrors_when_facing_left() {
        let mut tank = FishTank::with_seed(400.0, 300.0, TankConfig::default(), 5);
        tank.add_ambient_fish(0);
        let mut fish = tank.fishes()[0].clone();

        fish.vx = 0.5;
        let right = quads_of(&fish);
        assert_eq!(right[0].corners[0].uv, [0.0, 0.0]);
        assert_eq!(right[0].corners[1].uv, [AMBIENT_BODY_RATIO, 0.0]);
        assert_eq!(right[0].corners[0].position[0], fish.position.x);

        fish.vx = -0.5;
        let left = quads_of(&fish);
        assert_eq!(left[0].corners[0].uv, [AMBIENT_BODY_RATIO, 0.0]);
        assert!((left[0].corners[1].position[0] - fish.position.x).abs() < 1e-3);
    }

    #[test]
    fn ambient_tail_amplitude_grows_toward_tip() {
        let mut tank = FishTank::with_seed(400.0, 300.0, TankConfig::default(), 5);
        tank.add_ambient_fish(0);
        let mut fish = tank.fishes()[0].clone();
        fish.vx = 0.5;
        // Every slice sees sin(phase + i*0.3) near its peak.
        fish.tail_phase = std::f32::consts::FRAC_PI_2 - 0.6;
        let quads = quads_of(&fish);
        let tilt = |q: &SpriteQuad| {
            let [a, b, ..] = q.corners;
            (b.position[1] - a.position[1]).atan2(b.position[0] - a.position[0])
        };
        assert_eq!(tilt(&quads[0]), 0.0);
        let first = tilt(&quads[1]);
        let last = tilt(&quads[AMBIENT_TAIL_SLICES]);
        assert!(first > 0.0 && last > first);
        assert!(last <= AMBIENT_TAIL_MAX_DEG.to_radians() + 1e-5);
    }

    #[test]
    fn wave_head_is_rigid_and_tail_bends() {
        let tank = user_tank(SwimMode::Wave);
        let mut fish = tank.fishes()[0].clone();
        fish.tail_phase = 0.3;
        let a = quads_of(&fish);
        fish.tail_phase = 1.7;
        let b = quads_of(&fish);
        assert_eq!(a[0], b[0]);
        assert_ne!(a[WAVE_TAIL_SLICES], b[WAVE_TAIL_SLICES]);

        // Band x axis after the quarter turn plus the per-slice bend.
        let quads = quads_of(&fish);
        let base = -std::f32::consts::FRAC_PI_2;
        for (i, q) in quads.iter().enumerate() {
            let [tl, tr, ..] = q.corners;
            let angle = (tr.position[1] - tl.position[1]).atan2(tr.position[0] - tl.position[0]);
            let wave = if i == 0 {
                0.0
            } else {
                (fish.tail_phase + i as f32 * WAVE_PHASE_STEP).sin()
                    * WAVE_MAX_DEG.to_radians()
                    * (i as f32 / WAVE_TAIL_SLICES as f32)
            };
            assert!((angle - (base + wave)).abs() < 1e-4, "slice {i}: {angle}");
        }
    }

    #[test]
    fn sprite_is_turned_and_scaled_to_target_height() {
        let tank = user_tank(SwimMode::Wave);
        let fish = &tank.fishes()[0];
        let head = &quads_of(fish)[0];
        // Authored width 100 maps to a 50 px tall swimmer.
        assert!((span(head, 1) - fish.target_height).abs() < 1e-3);
        // Head band is 40% of the authored 75 px length, now along x.
        assert!((span(head, 0) - 0.4 * 75.0).abs() < 1e-3);
    }

    #[test]
    fn pulse_stretches_instead_of_rotating() {
        let tank = user_tank(SwimMode::Pulse);
        let mut fish = tank.fishes()[0].clone();
        fish.tail_phase = 1.0;
        let quads = quads_of(&fish);
        for (i, q) in quads.iter().enumerate().skip(1) {
            let s = 1.0
                + (fish.tail_phase + i as f32 * PULSE_PHASE_STEP).sin()
                    * PULSE_MAX_STRETCH
                    * (i as f32 / PULSE_TAIL_SLICES as f32);
            assert!((span(q, 1) - fish.target_height * s).abs() < 1e-3);
            // Not rotated: after the quarter turn both top corners share a column.
            assert!((q.corners[0].position[0] - q.corners[1].position[0]).abs() < 1e-3);
        }
    }

    #[test]
    fn user_uv_flips_with_heading() {
        let tank = user_tank(SwimMode::Pulse);
        let mut fish = tank.fishes()[0].clone();
        fish.vx = -0.4;
        assert_eq!(quads_of(&fish)[0].corners[0].uv, [0.0, 0.0]);
        fish.vx = 0.4;
        assert_eq!(quads_of(&fish)[0].corners[0].uv, [0.0, 1.0]);
    }

    #[test]
    fn frame_covers_every_fish() {
        let mut tank = user_tank(SwimMode::Wave);
        tank.add_ambient_fish(1);
        let frame = build_frame(&tank, 400.0, 300.0, 1.0);
        assert_eq!(frame.sprites.len(), (1 + WAVE_TAIL_SLICES) + (1 + AMBIENT_TAIL_SLICES));
        assert_eq!(frame.sprites[0].texture, TextureSlot::User(3));
    }
}
// --- End of File: scene.rs ---
