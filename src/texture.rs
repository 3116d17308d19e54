// --- File: texture.rs ---
//! Preset fish sprites, synthesized either by vector drawing or by analytic
//! per-pixel classification. Both produce straight-alpha RGBA.

use crate::constants::{EYE_WHITE, PECTORAL_FIN_ALPHA, PUPIL_COLOR, TEX_SIZE};
use crate::error::{FishbowlError, Result};
use crate::utils::{demultiply_rgba_in_place, parse_hex_color};
use std::f32::consts::PI;
use tiny_skia::{
    FillRule, LineCap, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TexturePreset {
    pub name: &'static str,
    pub body: &'static str,
    pub fin: &'static str,
    pub belly: &'static str,
}

pub const FISH_PRESETS: [TexturePreset; 5] = [
    TexturePreset { name: "小橙", body: "#FF6B35", fin: "#E85D26", belly: "#FFB088" },
    TexturePreset { name: "蓝蓝", body: "#4ECDC4", fin: "#38B2A8", belly: "#A8E6E0" },
    TexturePreset { name: "金金", body: "#FFD93D", fin: "#F0C420", belly: "#FFF0A0" },
    TexturePreset { name: "紫霞", body: "#C084FC", fin: "#A855F7", belly: "#E0C0FF" },
    TexturePreset { name: "粉粉", body: "#FB7185", fin: "#E5556A", belly: "#FECDD3" },
];

/// Square straight-alpha RGBA bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Sprite {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let o = ((y * self.width + x) * 4) as usize;
        Some([self.rgba[o], self.rgba[o + 1], self.rgba[o + 2], self.rgba[o + 3]])
    }
}

/// Shape layout shared by both strategies, in sprite pixels.
#[derive(Debug, Clone, Copy)]
pub struct SpriteGeometry {
    pub size: f32,
    pub cx: f32,
    pub cy: f32,
    pub body_rx: f32,
    pub body_ry: f32,
    pub belly_cx: f32,
    pub belly_cy: f32,
    pub belly_rx: f32,
    pub belly_ry: f32,
    pub tail_start_x: f32,
    pub tail_end_x: f32,
    pub eye_x: f32,
    pub eye_y: f32,
    pub eye_r: f32,
    pub pupil_x: f32,
    pub pupil_r: f32,
}

impl SpriteGeometry {
    pub fn new(size: u32) -> Self {
        let size = size as f32;
        let cx = size * 0.42;
        let cy = size * 0.5;
        let body_rx = size * 0.32;
        let body_ry = size * 0.22;
        let eye_r = size * 0.06;
        let eye_x = cx - body_rx * 0.45;
        Self {
            size,
            cx,
            cy,
            body_rx,
            body_ry,
            belly_cx: cx + body_rx * 0.05,
            belly_cy: cy + body_ry * 0.25,
            belly_rx: body_rx * 0.7,
            belly_ry: body_ry * 0.5,
            tail_start_x: cx + body_rx - 2.0,
            tail_end_x: cx + body_rx + size * 0.28,
            eye_x,
            eye_y: cy - body_ry * 0.2,
            eye_r,
            pupil_x: eye_x - eye_r * 0.2,
            pupil_r: eye_r * 0.55,
        }
    }

    /// Tail edges at `x`: (top, bottom), widening from the root to the tip.
    fn tail_span_at(&self, x: f32) -> Option<(f32, f32)> {
        if x < self.tail_start_x || x > self.tail_end_x {
            return None;
        }
        let t = (x - self.tail_start_x) / (self.tail_end_x - self.tail_start_x);
        let root_half = self.body_ry * 0.3;
        let tip_half = self.body_ry * 0.7;
        let half = root_half + (tip_half - root_half) * t;
        Some((self.cy - half, self.cy + half))
    }
}

#[derive(Debug, Clone, Copy)]
struct PresetColors {
    body: [u8; 4],
    fin: [u8; 4],
    belly: [u8; 4],
}

impl PresetColors {
    fn resolve(preset: &TexturePreset) -> Result<Self> {
        Ok(Self {
            body: parse_hex_color(preset.body)?,
            fin: parse_hex_color(preset.fin)?,
            belly: parse_hex_color(preset.belly)?,
        })
    }
}

pub trait SpriteSynthesizer {
    fn name(&self) -> &'static str;
    fn synthesize(&self, preset: &TexturePreset, size: u32) -> Result<Sprite>;
}

/// Draws the fish with anti-aliased vector shapes on an off-screen pixmap.
#[derive(Debug, Default, Clone, Copy)]
pub struct VectorSynthesizer;

/// Classifies each pixel centre against closed-form shape tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalyticSynthesizer;

fn solid(color: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = true;
    paint
}

fn fill_oval(pixmap: &mut Pixmap, cx: f32, cy: f32, rx: f32, ry: f32, paint: &Paint, transform: Transform) {
    let Some(path) = Rect::from_xywh(cx - rx, cy - ry, rx * 2.0, ry * 2.0).and_then(PathBuilder::from_oval)
    else {
        return;
    };
    pixmap.fill_path(&path, paint, FillRule::Winding, transform, None);
}

fn fill_circle(pixmap: &mut Pixmap, cx: f32, cy: f32, r: f32, color: [u8; 4]) {
    if let Some(path) = PathBuilder::from_circle(cx, cy, r) {
        pixmap.fill_path(&path, &solid(color), FillRule::Winding, Transform::identity(), None);
    }
}

impl SpriteSynthesizer for VectorSynthesizer {
    fn name(&self) -> &'static str {
        "vector"
    }

    fn synthesize(&self, preset: &TexturePreset, size: u32) -> Result<Sprite> {
        let colors = PresetColors::resolve(preset)?;
        let g = SpriteGeometry::new(size);
        let mut pixmap = Pixmap::new(size, size).ok_or(FishbowlError::SurfaceAllocation {
            width: size,
            height: size,
        })?;
        let identity = Transform::identity();

        fill_oval(&mut pixmap, g.cx, g.cy, g.body_rx, g.body_ry, &solid(colors.body), identity);
        fill_oval(
            &mut pixmap,
            g.belly_cx,
            g.belly_cy,
            g.belly_rx,
            g.belly_ry,
            &solid(colors.belly),
            identity,
        );

        let fin = solid(colors.fin);
        let tail_x = g.cx + g.body_rx;
        let mut pb = PathBuilder::new();
        pb.move_to(tail_x - 2.0, g.cy - g.body_ry * 0.3);
        pb.line_to(tail_x + g.size * 0.28, g.cy - g.body_ry * 0.7);
        pb.line_to(tail_x + g.size * 0.28, g.cy + g.body_ry * 0.7);
        pb.line_to(tail_x - 2.0, g.cy + g.body_ry * 0.3);
        pb.close();
        if let Some(path) = pb.finish() {
            pixmap.fill_path(&path, &fin, FillRule::Winding, identity, None);
        }

        // Dorsal fin
        let mut pb = PathBuilder::new();
        pb.move_to(g.cx - g.body_rx * 0.2, g.cy - g.body_ry);
        pb.quad_to(
            g.cx + g.body_rx * 0.1,
            g.cy - g.body_ry - g.size * 0.1,
            g.cx + g.body_rx * 0.4,
            g.cy - g.body_ry + g.body_ry * 0.1,
        );
        pb.line_to(g.cx - g.body_rx * 0.1, g.cy - g.body_ry + g.body_ry * 0.15);
        pb.close();
        if let Some(path) = pb.finish() {
            pixmap.fill_path(&path, &fin, FillRule::Winding, identity, None);
        }

        // Pectoral fin, translucent and tilted 45°.
        let mut pectoral = colors.fin;
        pectoral[3] = (PECTORAL_FIN_ALPHA * 255.0).round() as u8;
        let tilt = Transform::from_rotate(45.0)
            .post_translate(g.cx + g.body_rx * 0.1, g.cy + g.body_ry * 0.5);
        fill_oval(
            &mut pixmap,
            0.0,
            0.0,
            g.body_rx * 0.22,
            g.body_ry * 0.4,
            &solid(pectoral),
            tilt,
        );

        fill_circle(&mut pixmap, g.eye_x, g.eye_y, g.eye_r, EYE_WHITE);
        fill_circle(&mut pixmap, g.pupil_x, g.eye_y, g.pupil_r, PUPIL_COLOR);
        fill_circle(
            &mut pixmap,
            g.eye_x - g.eye_r * 0.4,
            g.eye_y - g.eye_r * 0.25,
            g.eye_r * 0.2,
            EYE_WHITE,
        );

        // Mouth
        let (mx, my, mr) = (g.cx - g.body_rx * 0.7, g.cy + g.body_ry * 0.1, g.size * 0.03);
        let (start, end) = (-0.3_f32, PI * 0.6);
        let mut pb = PathBuilder::new();
        for i in 0..=12 {
            let a = start + (end - start) * i as f32 / 12.0;
            let (x, y) = (mx + mr * a.cos(), my + mr * a.sin());
            if i == 0 {
                pb.move_to(x, y);
            } else {
                pb.line_to(x, y);
            }
        }
        if let Some(path) = pb.finish() {
            let stroke = Stroke {
                width: 1.5,
                line_cap: LineCap::Butt,
                ..Stroke::default()
            };
            pixmap.stroke_path(&path, &fin, &stroke, identity, None);
        }

        let mut rgba = pixmap.take();
        demultiply_rgba_in_place(&mut rgba);
        Ok(Sprite {
            width: size,
            height: size,
            rgba,
        })
    }
}

impl SpriteSynthesizer for AnalyticSynthesizer {
    fn name(&self) -> &'static str {
        "analytic"
    }

    fn synthesize(&self, preset: &TexturePreset, size: u32) -> Result<Sprite> {
        let colors = PresetColors::resolve(preset)?;
        let g = SpriteGeometry::new(size);
        let mut rgba = vec![0u8; (size * size * 4) as usize];

        let inside_ellipse = |x: f32, y: f32, cx: f32, cy: f32, rx: f32, ry: f32| {
            let dx = (x - cx) / rx;
            let dy = (y - cy) / ry;
            dx * dx + dy * dy <= 1.0
        };
        let inside_circle = |x: f32, y: f32, cx: f32, cy: f32, r: f32| {
            let dx = x - cx;
            let dy = y - cy;
            dx * dx + dy * dy <= r * r
        };

        for py in 0..size {
            for px in 0..size {
                // Sample at the pixel centre, where the rasterizer samples too.
                let x = px as f32 + 0.5;
                let y = py as f32 + 0.5;

                let in_body = inside_ellipse(x, y, g.cx, g.cy, g.body_rx, g.body_ry);
                let in_belly = inside_ellipse(x, y, g.belly_cx, g.belly_cy, g.belly_rx, g.belly_ry);
                let in_tail = g
                    .tail_span_at(x)
                    .is_some_and(|(top, bottom)| y >= top && y <= bottom);
                let in_eye = inside_circle(x, y, g.eye_x, g.eye_y, g.eye_r);
                let in_pupil = inside_circle(x, y, g.pupil_x, g.eye_y, g.pupil_r);

                let color = if in_pupil {
                    PUPIL_COLOR
                } else if in_eye {
                    EYE_WHITE
                } else if in_belly && in_body {
                    colors.belly
                } else if in_body {
                    colors.body
                } else if in_tail {
                    colors.fin
                } else {
                    [0, 0, 0, 0]
                };

                let o = ((py * size + px) * 4) as usize;
                rgba[o..o + 4].copy_from_slice(&color);
            }
        }

        Ok(Sprite {
            width: size,
            height: size,
            rgba,
        })
    }
}

/// Picks the vector strategy when an off-screen pixmap can be allocated,
/// otherwise the analytic one.
pub fn probe_synthesizer() -> Box<dyn SpriteSynthesizer> {
    if Pixmap::new(TEX_SIZE, TEX_SIZE).is_some() {
        Box::new(VectorSynthesizer)
    } else {
        log::warn!("off-screen drawing unavailable, using analytic sprite synthesis");
        Box::new(AnalyticSynthesizer)
    }
}

/// One sprite per preset, in preset order. Presets that fail are logged and
/// left as `None` so their fish are skipped at draw time.
pub fn synthesize_presets(synth: &dyn SpriteSynthesizer) -> Vec<Option<Sprite>> {
    FISH_PRESETS
        .iter()
        .map(|preset| match synth.synthesize(preset, TEX_SIZE) {
            Ok(sprite) => Some(sprite),
            Err(err) => {
                log::error!("{} synthesis of '{}' failed: {err}", synth.name(), preset.name);
                None
            }
        })
        .collect()
}

// --- End of File: texture.rs ---
