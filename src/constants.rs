// --- File: constants.rs ---
// --- Drawing Surface Constants ---
pub const FILL_TOLERANCE: i32 = 32;
// Pixels with alpha above this count as drawn content when cropping.
pub const CONTENT_ALPHA_THRESHOLD: u8 = 10;
// Logical padding around the cropped drawing, scaled by the device pixel ratio.
pub const CONTENT_BOUNDS_PAD: f32 = 4.0;

// --- Size Curve (likes -> on-screen height) ---
pub const MIN_TARGET_H: f32 = 50.0;
pub const MAX_TARGET_H: f32 = 120.0;
pub const LIKES_FOR_MAX: u32 = 30;

// --- Sprite Synthesis ---
pub const TEX_SIZE: u32 = 128;
pub const EYE_WHITE: [u8; 4] = [255, 255, 255, 255];
pub const PUPIL_COLOR: [u8; 4] = [0x1A, 0x1A, 0x2E, 255];
pub const PECTORAL_FIN_ALPHA: f32 = 0.7;

// --- Swim Animation ---
pub const AMBIENT_BODY_RATIO: f32 = 0.7;
pub const AMBIENT_BODY_HEIGHT_RATIO: f32 = 0.5;
pub const AMBIENT_TAIL_SLICES: usize = 5;
pub const AMBIENT_TAIL_PHASE_STEP: f32 = 0.3;
pub const AMBIENT_TAIL_MAX_DEG: f32 = 12.0;

pub const WAVE_HEAD_RATIO: f32 = 0.4;
pub const WAVE_TAIL_SLICES: usize = 5;
pub const WAVE_PHASE_STEP: f32 = 0.35;
pub const WAVE_MAX_DEG: f32 = 10.0;

pub const PULSE_HEAD_RATIO: f32 = 0.6;
pub const PULSE_TAIL_SLICES: usize = 6;
pub const PULSE_PHASE_STEP: f32 = 0.5;
pub const PULSE_MAX_STRETCH: f32 = 0.15;

// --- Tank Decoration ---
pub const BACKGROUND_TOP: [f32; 4] = [255.0 / 255.0, 246.0 / 255.0, 235.0 / 255.0, 1.0];
pub const BACKGROUND_BOTTOM: [f32; 4] = [255.0 / 255.0, 236.0 / 255.0, 210.0 / 255.0, 1.0];
pub const SAND_TOP_RATIO: f32 = 0.88;
pub const SAND_TOP: [f32; 4] = [230.0 / 255.0, 200.0 / 255.0, 140.0 / 255.0, 1.0];
pub const SAND_BOTTOM: [f32; 4] = [210.0 / 255.0, 175.0 / 255.0, 110.0 / 255.0, 1.0];
pub const SEAWEED_BASE: [f32; 4] = [80.0 / 255.0, 160.0 / 255.0, 60.0 / 255.0, 0.6];
pub const SEAWEED_TIP: [f32; 4] = [100.0 / 255.0, 180.0 / 255.0, 80.0 / 255.0, 0.4];
// (x as a fraction of tank width, logical width, logical height)
pub const SEAWEED_STRIPS: [(f32, f32, f32); 7] = [
    (0.12, 6.0, 80.0),
    (0.18, 5.0, 60.0),
    (0.40, 6.0, 90.0),
    (0.45, 5.0, 65.0),
    (0.70, 6.0, 75.0),
    (0.75, 5.0, 55.0),
    (0.90, 5.0, 70.0),
];
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 1.0,
    g: 246.0 / 255.0,
    b: 235.0 / 255.0,
    a: 1.0,
};

// --- Demo Window ---
pub const WINDOW_WIDTH: u32 = 960;
pub const WINDOW_HEIGHT: u32 = 640;
pub const FIXED_TIMESTEP: f64 = 1.0 / 60.0;
pub const FPS_UPDATE_INTERVAL_SECS: f64 = 2.0;
pub const AMBIENT_FISH_COUNT: usize = 6;
// --- End of File: constants.rs ---
