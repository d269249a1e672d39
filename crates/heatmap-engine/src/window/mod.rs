//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and windows, and wires each window to its own
//! [`Gpu`](crate::device::Gpu) and frame clock.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
