//! Colors and the heatmap color ramp.
//!
//! Ramp colors are passed to the colorizer as-is: the shader interpolates and
//! scales them by opacity without any premultiplication step of its own.

pub mod color;
pub mod ramp;

pub use color::ColorRgba;
pub use ramp::{ColorRamp, ColorStop};
