// --- File: surface.rs ---
use crate::error::{FishbowlError, Result};
use crate::utils::{demultiply_rgba_in_place, premultiply_rgba_in_place};
use tiny_skia::{
    BlendMode, Color, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, StrokeDash,
    Transform,
};

/// A position in logical (density independent) canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeMode {
    /// Source-over painting.
    Paint,
    /// Destination-out: removes existing coverage.
    Erase,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pen {
    pub color: [u8; 4],
    pub width: f32,
    pub mode: CompositeMode,
    pub dash: Option<[f32; 2]>,
}

impl Pen {
    pub fn solid(color: [u8; 4], width: f32) -> Self {
        Self {
            color,
            width,
            mode: CompositeMode::Paint,
            dash: None,
        }
    }
}

/// Addressable RGBA buffer the painter draws onto. Drawing calls take logical
/// coordinates; pixel access is in buffer (device) coordinates.
pub trait RasterSurface {
    fn buffer_width(&self) -> u32;
    fn buffer_height(&self) -> u32;
    fn device_pixel_ratio(&self) -> f32;

    fn logical_size(&self) -> (f32, f32) {
        let dpr = self.device_pixel_ratio();
        (
            self.buffer_width() as f32 / dpr,
            self.buffer_height() as f32 / dpr,
        )
    }

    fn clear(&mut self);
    fn stroke_polyline(&mut self, points: &[Point], pen: &Pen);
    fn fill_polygon(&mut self, points: &[Point], color: [u8; 4]);

    /// Straight-alpha copy of the whole buffer, row-major RGBA.
    fn read_rgba(&self) -> Vec<u8>;
    /// Replaces the whole buffer from straight-alpha RGBA of the same size.
    fn write_rgba(&mut self, rgba: &[u8]);
    fn alpha_at(&self, x: u32, y: u32) -> u8;
}

/// `RasterSurface` backed by a tiny-skia pixmap.
pub struct PixmapSurface {
    pixmap: Pixmap,
    dpr: f32,
}

impl PixmapSurface {
    pub fn new(logical_width: f32, logical_height: f32, dpr: f32) -> Result<Self> {
        let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        let width = (logical_width * dpr).round().max(0.0) as u32;
        let height = (logical_height * dpr).round().max(0.0) as u32;
        let pixmap =
            Pixmap::new(width, height).ok_or(FishbowlError::SurfaceAllocation { width, height })?;
        Ok(Self { pixmap, dpr })
    }

    fn transform(&self) -> Transform {
        Transform::from_scale(self.dpr, self.dpr)
    }
}

fn build_path(points: &[Point], close: bool) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    if close {
        pb.close();
    }
    pb.finish()
}

impl RasterSurface for PixmapSurface {
    fn buffer_width(&self) -> u32 {
        self.pixmap.width()
    }

    fn buffer_height(&self) -> u32 {
        self.pixmap.height()
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.dpr
    }

    fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    fn stroke_polyline(&mut self, points: &[Point], pen: &Pen) {
        if points.len() < 2 {
            return;
        }
        let Some(path) = build_path(points, false) else {
            return;
        };

        let mut paint = Paint::default();
        let [r, g, b, a] = pen.color;
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = true;
        paint.blend_mode = match pen.mode {
            CompositeMode::Paint => BlendMode::SourceOver,
            CompositeMode::Erase => BlendMode::DestinationOut,
        };

        let stroke = Stroke {
            width: pen.width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            dash: pen
                .dash
                .and_then(|[on, off]| StrokeDash::new(vec![on, off], 0.0)),
            ..Stroke::default()
        };
        let transform = self.transform();
        self.pixmap
            .stroke_path(&path, &paint, &stroke, transform, None);
    }

    fn fill_polygon(&mut self, points: &[Point], color: [u8; 4]) {
        if points.len() < 3 {
            return;
        }
        let Some(path) = build_path(points, true) else {
            return;
        };
        let mut paint = Paint::default();
        let [r, g, b, a] = color;
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = true;
        let transform = self.transform();
        self.pixmap
            .fill_path(&path, &paint, FillRule::Winding, transform, None);
    }

    fn read_rgba(&self) -> Vec<u8> {
        let mut rgba = self.pixmap.data().to_vec();
        demultiply_rgba_in_place(&mut rgba);
        rgba
    }

    fn write_rgba(&mut self, rgba: &[u8]) {
        let data = self.pixmap.data_mut();
        if rgba.len() != data.len() {
            log::warn!(
                "ignoring pixel write of {} bytes into a {} byte surface",
                rgba.len(),
                data.len()
            );
            return;
        }
        data.copy_from_slice(rgba);
        premultiply_rgba_in_place(data);
    }

    fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.pixmap
            .pixel(x, y)
            .map(|p| p.alpha())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_is_scaled_by_device_pixel_ratio() {
        let surface = PixmapSurface::new(50.0, 40.0, 2.0).expect("surface");
        assert_eq!(surface.buffer_width(), 100);
        assert_eq!(surface.buffer_height(), 80);
        assert_eq!(surface.logical_size(), (50.0, 40.0));
    }

    #[test]
    fn zero_sized_surface_is_an_error() {
        assert!(matches!(
            PixmapSurface::new(0.0, 10.0, 1.0),
            Err(FishbowlError::SurfaceAllocation { .. })
        ));
    }

    #[test]
    fn erase_mode_removes_paint() {
        let mut surface = PixmapSurface::new(20.0, 20.0, 1.0).expect("surface");
        let line = [Point::new(2.0, 10.0), Point::new(18.0, 10.0)];
        surface.stroke_polyline(&line, &Pen::solid([0, 0, 255, 255], 4.0));
        assert_eq!(surface.alpha_at(10, 10), 255);

        let eraser = Pen {
            mode: CompositeMode::Erase,
            ..Pen::solid([0, 0, 0, 255], 8.0)
        };
        surface.stroke_polyline(&line, &eraser);
        assert_eq!(surface.alpha_at(10, 10), 0);
    }

    #[test]
    fn rgba_round_trip_preserves_opaque_pixels() {
        let mut surface = PixmapSurface::new(4.0, 4.0, 1.0).expect("surface");
        let mut data = vec![0u8; 4 * 4 * 4];
        data[0..4].copy_from_slice(&[12, 34, 56, 255]);
        surface.write_rgba(&data);
        assert_eq!(&surface.read_rgba()[0..4], &[12, 34, 56, 255]);
    }
}
// --- End of File: surface.rs ---
