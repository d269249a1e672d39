//! Coordinate types and the shared viewport transform.
//!
//! Spaces:
//! - model: caller units, scaled by `density` into device pixels
//! - unit: `[0, 1]²` over the viewport resolution
//! - clip: `[-1, 1]²`, +Y up (wgpu NDC)
//!
//! Both the point pass and the image pass go through [`ViewportTransform`];
//! the WGSL in `render/shaders` mirrors it line for line.

mod rect;
mod transform;
mod vec2;
mod viewport;

pub use rect::Rect;
pub use transform::{TransformVariant, ViewportTransform};
pub use vec2::Vec2;
pub use viewport::ViewportParams;
