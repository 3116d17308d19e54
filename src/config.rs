// --- File: config.rs ---
use crate::constants::{CONTENT_ALPHA_THRESHOLD, CONTENT_BOUNDS_PAD, FILL_TOLERANCE};
use std::f32::consts::TAU;

#[derive(Debug, Clone)]
pub struct TankConfig {
    // Horizontal speed range, logical px per tick (direction applied separately).
    pub min_speed: f32,
    pub max_speed: f32,
    // Vertical spawn band: y in [band_top, tank_height - band_bottom_inset).
    pub band_top: f32,
    pub band_bottom_inset: f32,
    pub min_float_amp: f32,
    pub max_float_amp: f32,
    pub float_scale: f32,
    pub tail_phase_step: f32,
    pub float_phase_step: f32,
    pub phase_range: f32,
    // Collision radius = target height * this.
    pub radius_factor: f32,
    // Pairs closer than this are left alone (no usable push direction).
    pub separation_floor: f32,
    pub ambient_size: f32,
    pub ambient_min_scale: f32,
    pub ambient_max_scale: f32,
}

impl Default for TankConfig {
    fn default() -> Self {
        Self {
            min_speed: 0.3,
            max_speed: 0.8,
            band_top: 80.0,
            band_bottom_inset: 120.0,
            min_float_amp: 2.0,
            max_float_amp: 5.0,
            float_scale: 0.1,
            tail_phase_step: 0.08,
            float_phase_step: 0.02,
            phase_range: TAU,
            radius_factor: 0.45,
            separation_floor: 0.01,
            ambient_size: 60.0,
            ambient_min_scale: 0.8,
            ambient_max_scale: 1.2,
        }
    }
}

impl TankConfig {
    /// Vertical band for a tank of the given logical height. Tanks shorter than
    /// the insets collapse the band onto `band_top`.
    pub fn vertical_band(&self, tank_height: f32) -> (f32, f32) {
        let span = (tank_height - self.band_top - self.band_bottom_inset).max(0.0);
        (self.band_top, self.band_top + span)
    }
}

#[derive(Debug, Clone)]
pub struct PainterConfig {
    pub fill_tolerance: i32,
    pub content_alpha_threshold: u8,
    pub content_pad: f32,
    pub guide_line_color: [u8; 4],
    pub guide_eye_color: [u8; 4],
    pub guide_arrow_color: [u8; 4],
    pub guide_dash: [f32; 2],
}

impl Default for PainterConfig {
    fn default() -> Self {
        Self {
            fill_tolerance: FILL_TOLERANCE,
            content_alpha_threshold: CONTENT_ALPHA_THRESHOLD,
            content_pad: CONTENT_BOUNDS_PAD,
            guide_line_color: [0xD0, 0xD0, 0xD0, 255],
            guide_eye_color: [0x66, 0x66, 0x66, 64],
            guide_arrow_color: [0xFD, 0x59, 0x00, 178],
            guide_dash: [8.0, 5.0],
        }
    }
}
// --- End of File: config.rs ---
