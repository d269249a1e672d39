//! Heat sources: intensity-weighted points and their normalization range.

mod point;
mod range;

pub use point::HeatPoint;
pub use range::IntensityRange;
