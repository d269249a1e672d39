use std::fmt;

/// Rejected configuration.
///
/// Raised when a ramp or a constant set is built, never while rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The ramp has more stops than the configured `max_colors`.
    TooManyStops { count: usize, max: usize },
    /// The ramp has no stops at all.
    EmptyRamp,
    /// A stop offset or color channel is NaN or infinite.
    NonFiniteStop { index: usize },
    /// `offsets[index] < offsets[index - 1]`.
    UnsortedOffsets { index: usize },
    /// A shader constant is out of its legal domain.
    InvalidConstant { name: &'static str, value: f32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::TooManyStops { count, max } => {
                write!(f, "color ramp has {count} stops, at most {max} are supported")
            }
            ConfigError::EmptyRamp => write!(f, "color ramp has no stops"),
            ConfigError::NonFiniteStop { index } => {
                write!(f, "color ramp stop {index} is not finite")
            }
            ConfigError::UnsortedOffsets { index } => {
                write!(f, "color ramp offset {index} is smaller than its predecessor")
            }
            ConfigError::InvalidConstant { name, value } => {
                write!(f, "invalid shader constant `{name}` = {value}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Misuse of the pass pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// A pass was requested from a state that does not allow it.
    InvalidTransition {
        from: crate::render::PassState,
        to: crate::render::PassState,
    },
    /// The viewport resolution has a zero dimension.
    EmptyViewport { width: u32, height: u32 },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::InvalidTransition { from, to } => {
                write!(f, "heatmap pipeline cannot move from {from:?} to {to:?}")
            }
            PipelineError::EmptyViewport { width, height } => {
                write!(f, "viewport {width}x{height} has no pixels")
            }
        }
    }
}

impl std::error::Error for PipelineError {}
