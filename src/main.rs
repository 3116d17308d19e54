use anyhow::{Context, anyhow};
use fishbowl::config::{PainterConfig, TankConfig};
use fishbowl::constants::*;
use fishbowl::fish::{FishRecord, SwimMode};
use fishbowl::painter::{Painter, StrokeStyle};
use fishbowl::renderer::{GpuContext, TankRenderer};
use fishbowl::surface::{PixmapSurface, Point};
use fishbowl::texture::FISH_PRESETS;
use std::{f32::consts::TAU, sync::Arc, time::Instant};
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, Event, MouseButton, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

/// A drawn fish ready for upload: cropped straight-alpha RGBA.
struct DrawnFish {
    rgba: Vec<u8>,
    width: u32,
    height: u32,
}

fn stroke(painter: &mut Painter<PixmapSurface>, points: &[Point], color: &str, width: f32) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    painter.begin_stroke(
        *first,
        StrokeStyle {
            color: color.to_string(),
            width,
            eraser: false,
        },
    );
    for p in rest {
        painter.add_point(*p);
    }
    painter.end_stroke();
}

fn ellipse(cx: f32, cy: f32, rx: f32, ry: f32) -> Vec<Point> {
    (0..=48)
        .map(|i| {
            let a = TAU * i as f32 / 48.0;
            Point::new(cx + rx * a.cos(), cy + ry * a.sin())
        })
        .collect()
}

/// Draws a head-up fish through the painter the way a user would: outline,
/// bucket fill, tail, eyes. Then crops it to its content.
fn draw_demo_fish() -> anyhow::Result<DrawnFish> {
    let surface = PixmapSurface::new(200.0, 300.0, 1.0)?;
    let mut painter = Painter::new(surface, PainterConfig::default());
    painter.draw_guide();

    stroke(&mut painter, &ellipse(100.0, 120.0, 55.0, 85.0), "#2B2D42", 5.0);
    painter.flood_fill(Point::new(100.0, 120.0), "#FF8C42");

    let tail = [
        Point::new(100.0, 200.0),
        Point::new(55.0, 270.0),
        Point::new(145.0, 270.0),
        Point::new(100.0, 200.0),
    ];
    stroke(&mut painter, &tail, "#2B2D42", 5.0);
    painter.flood_fill(Point::new(100.0, 250.0), "#4ECDC4");

    for eye_x in [78.0, 122.0] {
        stroke(
            &mut painter,
            &[Point::new(eye_x, 75.0), Point::new(eye_x + 1.0, 76.0)],
            "#1A1A2E",
            10.0,
        );
    }
    log::info!("demo fish drawn in {} operations", painter.stroke_count());

    let bounds = painter
        .content_bounds()
        .ok_or_else(|| anyhow!("demo drawing left the canvas empty"))?;
    let rgba = painter
        .crop_rgba(bounds)
        .ok_or_else(|| anyhow!("crop {bounds:?} failed"))?;
    Ok(DrawnFish {
        rgba,
        width: bounds.width,
        height: bounds.height,
    })
}

/// (Re)creates GPU resources and stocks the tank.
fn populate(ctx: &GpuContext, tank: &mut TankRenderer, drawn: &DrawnFish) {
    tank.init(&ctx.device, &ctx.queue, ctx.format());
    for i in 0..AMBIENT_FISH_COUNT {
        tank.tank_mut().add_ambient_fish(i % FISH_PRESETS.len());
    }

    let texture_index = match tank.load_user_texture(
        &ctx.device,
        &ctx.queue,
        &drawn.rgba,
        drawn.width,
        drawn.height,
    ) {
        Ok(index) => index,
        Err(err) => {
            log::error!("could not load the drawn fish: {err}");
            return;
        }
    };
    for (id, likes, swim_mode) in [
        ("drawn-wave", 4, SwimMode::Wave),
        ("drawn-pulse", 18, SwimMode::Pulse),
    ] {
        tank.tank_mut().add_fish(FishRecord {
            fish_id: Some(id.to_string()),
            texture_index,
            img_width: drawn.width as f32,
            img_height: drawn.height as f32,
            likes,
            swim_mode,
        });
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let drawn = draw_demo_fish().context("drawing the demo fish")?;

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Fishbowl")
            .with_inner_size(PhysicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT))
            .build(&event_loop)?,
    );
    let mut ctx = pollster::block_on(GpuContext::new(window.clone()))
        .context("setting up the GPU surface")?;
    let mut dpr = window.scale_factor() as f32;
    let mut tank = TankRenderer::new(ctx.size.width, ctx.size.height, dpr, TankConfig::default());
    populate(&ctx, &mut tank, &drawn);

    let mut cursor = PhysicalPosition::new(0.0, 0.0);
    let mut selected: Option<String> = None;
    let mut last_tick = Instant::now();
    let mut time_accumulator = 0.0;
    let mut last_fps_update_time = Instant::now();
    let mut frames_since_last_fps_update = 0;
    let mut current_fps = 0.0;

    event_loop.run(move |event, elwt: &EventLoopWindowTarget<()>| {
        elwt.set_control_flow(ControlFlow::Poll);
        match event {
            Event::AboutToWait => {
                // One simulation tick per drawn frame, paced to the fixed step.
                let now = Instant::now();
                time_accumulator += now.duration_since(last_tick).as_secs_f64();
                last_tick = now;
                if time_accumulator >= FIXED_TIMESTEP {
                    time_accumulator = (time_accumulator - FIXED_TIMESTEP).min(FIXED_TIMESTEP);
                    window.request_redraw();
                }
            }
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    tank.destroy();
                    elwt.exit();
                }
                WindowEvent::Resized(physical_size) => {
                    ctx.resize(physical_size);
                    tank.resize(physical_size.width, physical_size.height, dpr);
                }
                WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                    dpr = scale_factor as f32;
                    let size = window.inner_size();
                    ctx.resize(size);
                    tank.resize(size.width, size.height, dpr);
                }
                WindowEvent::CursorMoved { position, .. } => cursor = position,
                WindowEvent::MouseInput {
                    state: ElementState::Pressed,
                    button: MouseButton::Left,
                    ..
                } => {
                    let (x, y) = (cursor.x as f32 / dpr, cursor.y as f32 / dpr);
                    let hit = tank
                        .tank()
                        .hit_test(x, y)
                        .and_then(|f| f.fish_id().map(|id| (id.to_string(), f.paused)));
                    if let Some((id, paused)) = hit {
                        if paused {
                            tank.tank_mut().resume(&id);
                        } else {
                            tank.tank_mut().pause(&id);
                        }
                        log::info!("{} '{id}'", if paused { "resumed" } else { "paused" });
                        selected = Some(id);
                    }
                }
                WindowEvent::KeyboardInput {
                    event: key_event, ..
                } => {
                    if key_event.state == ElementState::Pressed && !key_event.repeat {
                        match key_event.physical_key {
                            PhysicalKey::Code(KeyCode::KeyL) => {
                                if let Some(id) = selected.as_deref() {
                                    let likes =
                                        tank.tank().get_fish_by_id(id).map_or(0, |f| f.likes);
                                    tank.tank_mut().update_likes(id, likes + 1);
                                    log::info!("'{id}' now has {} likes", likes + 1);
                                }
                            }
                            PhysicalKey::Code(KeyCode::KeyR) => {
                                tank.destroy();
                                selected = None;
                                populate(&ctx, &mut tank, &drawn);
                            }
                            PhysicalKey::Code(KeyCode::Escape) => {
                                tank.destroy();
                                elwt.exit();
                            }
                            _ => {}
                        }
                    }
                }
                WindowEvent::RedrawRequested => {
                    frames_since_last_fps_update += 1;
                    let now = Instant::now();
                    let elapsed_secs = now.duration_since(last_fps_update_time).as_secs_f64();
                    if elapsed_secs >= FPS_UPDATE_INTERVAL_SECS {
                        current_fps = frames_since_last_fps_update as f64 / elapsed_secs;
                        last_fps_update_time = now;
                        frames_since_last_fps_update = 0;
                    }
                    match ctx.render_frame(&mut tank) {
                        Ok(()) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            let size = ctx.size;
                            ctx.reconfigure();
                            tank.resize(size.width, size.height, dpr);
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("GPU out of memory");
                            tank.destroy();
                            elwt.exit();
                        }
                        Err(e) => log::warn!("frame skipped: {e:?}"),
                    }
                    let selected_text = selected
                        .as_deref()
                        .and_then(|id| tank.tank().get_fish_by_id(id))
                        .map(|f| format!(" - Selected: {} likes", f.likes))
                        .unwrap_or_default();
                    window.set_title(&format!(
                        "Fishbowl - Fish: {} - FPS: {:.1}{}",
                        tank.tank().fish_count(),
                        current_fps,
                        selected_text
                    ));
                }
                _ => {}
            },
            _ => {}
        }
    })?;
    Ok(())
}
