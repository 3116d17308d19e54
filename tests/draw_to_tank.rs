use fishbowl::config::{PainterConfig, TankConfig};
use fishbowl::constants::{AMBIENT_TAIL_SLICES, PULSE_TAIL_SLICES, WAVE_TAIL_SLICES};
use fishbowl::fish::{FishRecord, SwimMode};
use fishbowl::painter::{Painter, StrokeStyle};
use fishbowl::scene::{TextureSlot, build_frame};
use fishbowl::simulation::FishTank;
use fishbowl::surface::{PixmapSurface, Point};
use glam::Vec2;
use std::f32::consts::TAU;

fn drawn_fish() -> (Vec<u8>, u32, u32) {
    let surface = PixmapSurface::new(120.0, 160.0, 2.0).expect("surface");
    let mut painter = Painter::new(surface, PainterConfig::default());
    painter.draw_guide();

    let outline: Vec<Point> = (0..=40)
        .map(|i| {
            let a = TAU * i as f32 / 40.0;
            Point::new(60.0 + 30.0 * a.cos(), 80.0 + 50.0 * a.sin())
        })
        .collect();
    painter.begin_stroke(
        outline[0],
        StrokeStyle {
            color: "#222222".into(),
            width: 3.0,
            eraser: false,
        },
    );
    for p in &outline[1..] {
        painter.add_point(*p);
    }
    assert!(painter.end_stroke().is_some());
    painter.flood_fill(Point::new(60.0, 80.0), "#FF6B35");
    assert_eq!(painter.stroke_count(), 2);
    assert!(!painter.is_guide_visible());

    let bounds = painter.content_bounds().expect("drawing has content");
    let rgba = painter.crop_rgba(bounds).expect("crop inside surface");
    assert_eq!(rgba.len(), (bounds.width * bounds.height * 4) as usize);
    (rgba, bounds.width, bounds.height)
}

#[test]
fn drawing_crops_to_outline_plus_padding() {
    let (rgba, width, height) = drawn_fish();
    // Outline spans 60x100 logical at dpr 2, plus stroke and 4px pad each side.
    assert!((130..=150).contains(&width), "width {width}");
    assert!((210..=230).contains(&height), "height {height}");

    let center = ((height / 2 * width + width / 2) * 4) as usize;
    assert_eq!(&rgba[center..center + 4], &[0xFF, 0x6B, 0x35, 255]);
    assert_eq!(rgba[3], 0, "padding corner stays transparent");
}

#[test]
fn drawn_fish_swims_and_is_clickable() {
    let (_, width, height) = drawn_fish();
    let mut tank = FishTank::with_seed(600.0, 400.0, TankConfig::default(), 42);
    for preset in 0..3 {
        tank.add_ambient_fish(preset);
    }
    tank.add_fish(FishRecord {
        fish_id: Some("mine".into()),
        texture_index: 0,
        img_width: width as f32,
        img_height: height as f32,
        likes: 12,
        swim_mode: SwimMode::Wave,
    });
    tank.add_fish(FishRecord {
        fish_id: Some("other".into()),
        texture_index: 0,
        img_width: width as f32,
        img_height: height as f32,
        likes: 0,
        swim_mode: SwimMode::Pulse,
    });
    assert_eq!(tank.fish_count(), 5);

    for _ in 0..600 {
        tank.step();
    }

    // "other" is smaller, so some point of mine's hit box is clear of it.
    let mine = tank.get_fish_by_id("mine").expect("fish is kept");
    let other = tank.get_fish_by_id("other").expect("fish is kept");
    let (half_w, half_h) = mine.hit_half_extents().expect("user fish has a hit box");
    let clear = (0..=8)
        .flat_map(|i| (0..=8).map(move |j| (i, j)))
        .map(|(i, j)| {
            mine.position
                + Vec2::new(
                    half_w * (i as f32 / 4.0 - 1.0) * 0.95,
                    half_h * (j as f32 / 4.0 - 1.0) * 0.95,
                )
        })
        .find(|&p| !other.contains(p))
        .expect("a point only mine covers");
    let hit = tank.hit_test(clear.x, clear.y).and_then(|f| f.fish_id());
    assert_eq!(hit, Some("mine"));

    assert!(tank.pause("mine"));
    let frozen = tank.get_fish_by_id("mine").expect("fish").position;
    tank.update();
    assert_eq!(tank.get_fish_by_id("mine").expect("fish").position, frozen);
    assert!(tank.resume("mine"));

    let frame = build_frame(&tank, 1200.0, 800.0, 2.0);
    let expected = 3 * (1 + AMBIENT_TAIL_SLICES) + (1 + WAVE_TAIL_SLICES) + (1 + PULSE_TAIL_SLICES);
    assert_eq!(frame.sprites.len(), expected);
    let user_quads = frame
        .sprites
        .iter()
        .filter(|q| q.texture == TextureSlot::User(0))
        .count();
    assert_eq!(user_quads, (1 + WAVE_TAIL_SLICES) + (1 + PULSE_TAIL_SLICES));
}

#[test]
fn likes_grow_the_hit_area() {
    let mut tank = FishTank::with_seed(600.0, 400.0, TankConfig::default(), 9);
    tank.add_fish(FishRecord {
        fish_id: Some("grow".into()),
        texture_index: 0,
        img_width: 100.0,
        img_height: 100.0,
        likes: 0,
        swim_mode: SwimMode::Pulse,
    });
    let at = tank.get_fish_by_id("grow").expect("fish").position;
    // 50px square at zero likes: 40px off-centre misses.
    assert!(tank.hit_test(at.x + 40.0, at.y).is_none());
    tank.update_likes("grow", 30);
    assert!(tank.hit_test(at.x + 40.0, at.y).is_some());
}
