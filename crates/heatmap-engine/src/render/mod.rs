//! GPU rendering subsystem.
//!
//! Three passes, each owning its GPU resources (pipelines, buffers):
//! - [`PointRasterizer`]: points → coverage in an [`OffscreenAlphaBuffer`]
//! - [`GradientColorizer`]: coverage → ramp colors in the caller's target
//! - [`ImageCompositor`]: base texture → caller's target
//!
//! [`HeatmapPipeline`] sequences the first two and owns the coverage buffer.
//! The image pass is independent; the caller orders it under or over the
//! heatmap.
//!
//! WGSL programs live in `shaders/` and mirror `software` pixel for pixel.

mod colorize;
mod common;
mod ctx;
mod image;
mod offscreen;
mod pipeline;
mod points;

pub use colorize::GradientColorizer;
pub use ctx::{RenderCtx, RenderTarget};
pub use image::{ImageCompositor, ImageLayer};
pub use offscreen::OffscreenAlphaBuffer;
pub use pipeline::{HeatmapPipeline, PassState};
pub use points::PointRasterizer;
