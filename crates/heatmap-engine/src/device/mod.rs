//! GPU device management.
//!
//! - [`Gpu`]: device + queue bound to a window surface, frame acquisition
//! - [`HeadlessGpu`]: device + queue without a surface, texture readback

mod adapter;
mod gpu;
mod headless;

pub use gpu::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction};
pub use headless::{HeadlessGpu, HeadlessInit};

#[cfg(test)]
pub(crate) use headless::test_gpu;
