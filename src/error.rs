use thiserror::Error;

/// Errors raised by constructors and parsers. Interactive operations never
/// return these; they log and skip instead.
#[derive(Debug, Error, PartialEq)]
pub enum FishbowlError {
    #[error("invalid color '{0}': expected #RRGGBB")]
    InvalidColor(String),
    #[error("failed to allocate a {width}x{height} raster surface")]
    SurfaceAllocation { width: u32, height: u32 },
    #[error("texture data is {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    TextureSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("renderer has no GPU resources; call init first")]
    NotInitialized,
    #[error("GPU setup failed: {0}")]
    GpuUnavailable(String),
}

pub type Result<T> = std::result::Result<T, FishbowlError>;
