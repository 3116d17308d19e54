//! Freehand fish drawing and an animated, GPU-rendered fish tank.
//!
//! The drawing side ([`painter`], [`flood_fill`], [`surface`]) produces a
//! cropped RGBA image; the tank side ([`simulation`], [`scene`], [`renderer`])
//! swims it alongside synthesized preset fish ([`texture`]).

pub mod config;
pub mod constants;
pub mod error;
pub mod fish;
pub mod flood_fill;
pub mod painter;
pub mod renderer;
pub mod scene;
pub mod simulation;
pub mod surface;
pub mod texture;
pub mod utils;

pub use error::{FishbowlError, Result};
