//! Two-pass density heatmap renderer.
//!
//! Points are drawn as disc sprites into an offscreen coverage buffer, then a
//! full-target pass maps the accumulated coverage through a color ramp. A
//! third, independent pass composites a base image.
//!
//! - [`render`]: wgpu passes and the [`render::HeatmapPipeline`] sequencer
//! - [`software`]: CPU reference backend with identical per-pixel semantics
//! - [`device`], [`window`], [`core`]: GPU + winit host runtime

pub mod config;
pub mod error;

pub mod coords;
pub mod heat;
pub mod paint;

pub mod render;
pub mod software;

pub mod core;
pub mod device;
pub mod logging;
pub mod time;
pub mod window;

pub use config::{Falloff, HeatmapConfig, Precision, RampOverflow, ShaderConstants};
pub use error::{ConfigError, PipelineError};
