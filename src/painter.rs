// --- File: painter.rs ---
use crate::config::PainterConfig;
use crate::flood_fill::{FillOutcome, flood_fill};
use crate::surface::{CompositeMode, Pen, Point, RasterSurface};
use crate::utils::parse_hex_color;
use std::f32::consts::PI;

#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    /// `#RRGGBB`
    pub color: String,
    /// Logical units.
    pub width: f32,
    pub eraser: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub points: Vec<Point>,
    pub style: StrokeStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FillEntry {
    pub seed: Point,
    pub color: String,
}

/// One replayable drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEntry {
    Stroke(Stroke),
    Fill(FillEntry),
}

/// Crop rectangle in buffer pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentBounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Stroke capture, fill and undo on top of a raster surface.
///
/// The history is the source of truth: replaying it onto a cleared surface
/// reproduces the current image. A painter without a surface still keeps its
/// history but draws nothing.
pub struct Painter<S: RasterSurface> {
    surface: Option<S>,
    config: PainterConfig,
    history: Vec<HistoryEntry>,
    current: Option<Stroke>,
    current_pen: Option<Pen>,
    show_guide: bool,
}

impl<S: RasterSurface> Painter<S> {
    pub fn new(surface: S, config: PainterConfig) -> Self {
        Self::with_surface(Some(surface), config)
    }

    pub fn detached(config: PainterConfig) -> Self {
        Self::with_surface(None, config)
    }

    fn with_surface(surface: Option<S>, config: PainterConfig) -> Self {
        Self {
            surface,
            config,
            history: Vec::new(),
            current: None,
            current_pen: None,
            show_guide: true,
        }
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn stroke_count(&self) -> usize {
        self.history.len()
    }

    pub fn is_guide_visible(&self) -> bool {
        self.show_guide
    }

    // --- Guide Overlay ---

    /// Draws the dashed "draw your fish here, head up" outline.
    pub fn draw_guide(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let (width, height) = surface.logical_size();
        let cx = width / 2.0;
        let cy = height * 0.45;
        let body_rx = width * 0.18;
        let body_ry = height * 0.22;
        let head_r = body_rx * 0.7;
        let head_cy = cy - body_ry - head_r * 0.5;
        let tail_cy = cy + body_ry;

        let dashed = Pen {
            dash: Some(self.config.guide_dash),
            ..Pen::solid(self.config.guide_line_color, 2.0)
        };

        let body = arc_points(cx, cy, body_rx, body_ry, 0.0, 2.0 * PI, 64);
        surface.stroke_polyline(&body, &dashed);

        // Open at the bottom, where the body outline takes over.
        let head = arc_points(cx, head_cy, head_r, head_r, PI * 0.8, PI * 2.2, 32);
        surface.stroke_polyline(&head, &dashed);

        let eye_r = head_r * 0.15;
        for side in [-1.0, 1.0] {
            let eye = arc_points(cx + side * head_r * 0.35, head_cy, eye_r, eye_r, 0.0, 2.0 * PI, 16);
            surface.fill_polygon(&eye, self.config.guide_eye_color);
        }

        let fin_y = tail_cy + height * 0.08;
        for side in [-1.0, 1.0] {
            let edge = [
                Point::new(cx + side * body_rx * 0.3, tail_cy),
                Point::new(cx + side * body_rx * 0.7, fin_y),
            ];
            surface.stroke_polyline(&edge, &dashed);
        }
        let fin_tip = quad_points(
            Point::new(cx - body_rx * 0.7, fin_y),
            Point::new(cx, tail_cy + height * 0.12),
            Point::new(cx + body_rx * 0.7, fin_y),
            16,
        );
        surface.stroke_polyline(&fin_tip, &dashed);

        let arrow_pen = Pen::solid(self.config.guide_arrow_color, 2.5);
        let tip = Point::new(cx, head_cy - head_r - 6.0);
        for side in [-1.0, 1.0] {
            let barb = [tip, Point::new(cx + side * 8.0, head_cy - head_r + 4.0)];
            surface.stroke_polyline(&barb, &arrow_pen);
        }
    }

    /// Wipes the guide the first time the user draws or fills. Later calls are no-ops.
    pub fn clear_guide(&mut self) {
        if !self.show_guide {
            return;
        }
        self.show_guide = false;
        if let Some(surface) = self.surface.as_mut() {
            surface.clear();
        }
    }

    // --- Stroke Capture ---

    pub fn begin_stroke(&mut self, point: Point, style: StrokeStyle) {
        self.clear_guide();
        self.current_pen = pen_for(&style);
        self.current = Some(Stroke {
            points: vec![point],
            style,
        });
    }

    /// Appends a point and paints only the new segment.
    pub fn add_point(&mut self, point: Point) {
        let Some(stroke) = self.current.as_mut() else {
            return;
        };
        let previous = stroke.points.last().copied();
        stroke.points.push(point);

        if let (Some(surface), Some(pen), Some(previous)) =
            (self.surface.as_mut(), self.current_pen.as_ref(), previous)
        {
            paint_segments(surface, &[previous, point], pen);
        }
    }

    /// Finishes the open stroke. Taps (fewer than two points) are discarded.
    pub fn end_stroke(&mut self) -> Option<Stroke> {
        let stroke = self.current.take()?;
        self.current_pen = None;
        if stroke.points.len() < 2 {
            return None;
        }
        self.history.push(HistoryEntry::Stroke(stroke.clone()));
        Some(stroke)
    }

    // --- Fill ---

    /// Seed-fills at a logical point. The entry is recorded even when the
    /// seed pixel already had the target color.
    pub fn flood_fill(&mut self, seed: Point, color: &str) -> FillEntry {
        self.clear_guide();
        if let Some(surface) = self.surface.as_mut() {
            fill_direct(surface, seed, color, self.config.fill_tolerance);
        }
        let entry = FillEntry {
            seed,
            color: color.to_string(),
        };
        self.history.push(HistoryEntry::Fill(entry.clone()));
        entry
    }

    // --- History ---

    pub fn undo(&mut self) -> usize {
        if self.history.pop().is_none() {
            return 0;
        }
        self.redraw();
        self.history.len()
    }

    pub fn clear_all(&mut self) {
        self.history.clear();
        self.redraw();
        self.show_guide = true;
        self.draw_guide();
    }

    /// Clears the surface and replays every history entry in order.
    pub fn redraw(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        surface.clear();
        for entry in &self.history {
            match entry {
                HistoryEntry::Fill(fill) => {
                    fill_direct(surface, fill.seed, &fill.color, self.config.fill_tolerance);
                }
                HistoryEntry::Stroke(stroke) => {
                    if stroke.points.len() < 2 {
                        continue;
                    }
                    if let Some(pen) = pen_for(&stroke.style) {
                        paint_segments(surface, &stroke.points, &pen);
                    }
                }
            }
        }
    }

    // --- Export ---

    /// Tight box around pixels with alpha above the threshold, padded and
    /// clamped to the buffer. Scans the whole buffer.
    pub fn content_bounds(&self) -> Option<ContentBounds> {
        let surface = self.surface.as_ref()?;
        let (w, h) = (surface.buffer_width(), surface.buffer_height());
        let threshold = self.config.content_alpha_threshold;

        let mut min_x = w;
        let mut min_y = h;
        let mut max_x = 0;
        let mut max_y = 0;
        let mut has_content = false;

        for y in 0..h {
            for x in 0..w {
                if surface.alpha_at(x, y) > threshold {
                    min_x = min_x.min(x);
                    max_x = max_x.max(x);
                    min_y = min_y.min(y);
                    max_y = max_y.max(y);
                    has_content = true;
                }
            }
        }

        if !has_content {
            return None;
        }

        let pad = (self.config.content_pad * surface.device_pixel_ratio()).ceil() as u32;
        let min_x = min_x.saturating_sub(pad);
        let min_y = min_y.saturating_sub(pad);
        let max_x = (max_x + pad).min(w - 1);
        let max_y = (max_y + pad).min(h - 1);

        Some(ContentBounds {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        })
    }

    /// Straight-alpha RGBA of the whole buffer.
    pub fn export_rgba(&self) -> Option<Vec<u8>> {
        self.surface.as_ref().map(|s| s.read_rgba())
    }

    /// Straight-alpha RGBA of `bounds`, row-major, `width * height * 4` bytes.
    pub fn crop_rgba(&self, bounds: ContentBounds) -> Option<Vec<u8>> {
        let surface = self.surface.as_ref()?;
        let buffer_w = surface.buffer_width() as usize;
        let buffer_h = surface.buffer_height() as usize;
        let (x, y) = (bounds.x as usize, bounds.y as usize);
        let (w, h) = (bounds.width as usize, bounds.height as usize);
        if x + w > buffer_w || y + h > buffer_h {
            log::warn!("crop {:?} exceeds {}x{} surface", bounds, buffer_w, buffer_h);
            return None;
        }

        let full = surface.read_rgba();
        let mut out = Vec::with_capacity(w * h * 4);
        for row in y..y + h {
            let start = (row * buffer_w + x) * 4;
            out.extend_from_slice(&full[start..start + w * 4]);
        }
        Some(out)
    }
}

fn pen_for(style: &StrokeStyle) -> Option<Pen> {
    if style.eraser {
        return Some(Pen {
            mode: CompositeMode::Erase,
            ..Pen::solid([0, 0, 0, 255], style.width)
        });
    }
    match parse_hex_color(&style.color) {
        Ok(color) => Some(Pen::solid(color, style.width)),
        Err(err) => {
            log::warn!("stroke not painted: {err}");
            None
        }
    }
}

/// Strokes each consecutive pair as its own capped segment. Live drawing and
/// replay both go through here so overlapping caps blend identically.
fn paint_segments<S: RasterSurface>(surface: &mut S, points: &[Point], pen: &Pen) {
    for pair in points.windows(2) {
        surface.stroke_polyline(pair, pen);
    }
}

fn fill_direct<S: RasterSurface>(surface: &mut S, seed: Point, color: &str, tolerance: i32) {
    let color = match parse_hex_color(color) {
        Ok(color) => color,
        Err(err) => {
            log::warn!("fill skipped: {err}");
            return;
        }
    };
    let dpr = surface.device_pixel_ratio();
    let start = (
        (seed.x * dpr).round() as i64,
        (seed.y * dpr).round() as i64,
    );
    let width = surface.buffer_width() as usize;
    let height = surface.buffer_height() as usize;

    let mut pixels = surface.read_rgba();
    match flood_fill(&mut pixels, width, height, start, color, tolerance) {
        FillOutcome::Filled { pixels: count } => {
            log::debug!("filled {count} pixels from {:?}", start);
            surface.write_rgba(&pixels);
        }
        outcome => log::debug!("fill at {:?} left surface unchanged: {:?}", start, outcome),
    }
}

/// Points along an elliptical arc, clockwise in screen space.
fn arc_points(cx: f32, cy: f32, rx: f32, ry: f32, start: f32, end: f32, segments: usize) -> Vec<Point> {
    (0..=segments)
        .map(|i| {
            let a = start + (end - start) * i as f32 / segments as f32;
            Point::new(cx + rx * a.cos(), cy + ry * a.sin())
        })
        .collect()
}

fn quad_points(p0: Point, ctrl: Point, p1: Point, segments: usize) -> Vec<Point> {
    (0..=segments)
        .map(|i| {
            let t = i as f32 / segments as f32;
            let u = 1.0 - t;
            Point::new(
                u * u * p0.x + 2.0 * u * t * ctrl.x + t * t * p1.x,
                u * u * p0.y + 2.0 * u * t * ctrl.y + t * t * p1.y,
            )
        })
        .collect()
}

// --- End of File: painter.rs ---
