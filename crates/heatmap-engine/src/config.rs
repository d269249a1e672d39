//! Process-wide shader constants and persistent layer settings.
//!
//! Every renderer receives a copy of [`ShaderConstants`] at construction; no
//! pass reads a literal of its own.

use crate::error::ConfigError;
use crate::heat::IntensityRange;
use crate::paint::ColorRamp;

/// Capacity of the ramp uniform arrays. `ShaderConstants::max_colors` may
/// lower the honored count but never raise it past this.
pub const MAX_COLORS: usize = 20;

/// Hard floor applied to the zoom factor.
pub const MIN_ZOOM: f32 = 0.1;

/// Alpha the coverage buffer is cleared to before each point pass.
pub const DEFAULT_ALPHA: f32 = 0.0;

/// Texels with alpha below this are dropped by the image pass.
pub const IMAGE_ALPHA_CUTOFF: f32 = 0.01;

/// Floor for the intensity range denominator.
pub const INTENSITY_EPSILON: f32 = 1e-6;

/// Numeric precision of the coverage buffer.
///
/// Shader arithmetic is always `f32`; precision selects how accumulated
/// coverage is stored between the two passes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Precision {
    #[default]
    High,
    Medium,
}

impl Precision {
    pub fn alpha_buffer_format(self) -> wgpu::TextureFormat {
        match self {
            Precision::High => wgpu::TextureFormat::Rgba16Float,
            Precision::Medium => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

/// Constants shared by the point, colorize and image passes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShaderConstants {
    pub max_colors: usize,
    pub min_zoom: f32,
    pub default_alpha: f32,
    pub precision: Precision,
}

impl ShaderConstants {
    pub const STANDARD: ShaderConstants = ShaderConstants {
        max_colors: MAX_COLORS,
        min_zoom: MIN_ZOOM,
        default_alpha: DEFAULT_ALPHA,
        precision: Precision::High,
    };

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_colors == 0 || self.max_colors > MAX_COLORS {
            return Err(ConfigError::InvalidConstant {
                name: "max_colors",
                value: self.max_colors as f32,
            });
        }
        if !(self.min_zoom.is_finite() && self.min_zoom > 0.0) {
            return Err(ConfigError::InvalidConstant { name: "min_zoom", value: self.min_zoom });
        }
        if !(0.0..=1.0).contains(&self.default_alpha) {
            return Err(ConfigError::InvalidConstant {
                name: "default_alpha",
                value: self.default_alpha,
            });
        }
        Ok(())
    }
}

impl Default for ShaderConstants {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Edge profile of a point disc.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Falloff {
    /// Constant alpha across the disc.
    #[default]
    Hard,
    /// Alpha scaled by `1 - sqrt(r)`, `r` being the squared disc-local radius.
    Soft,
}

impl Falloff {
    pub(crate) fn as_u32(self) -> u32 {
        match self {
            Falloff::Hard => 0,
            Falloff::Soft => 1,
        }
    }
}

/// Colorizer output when the accumulated alpha lies above every ramp offset.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum RampOverflow {
    /// Use the color of the last honored stop.
    #[default]
    ClampToLast,
    /// Emit transparent black.
    Transparent,
}

impl RampOverflow {
    pub(crate) fn as_u32(self) -> u32 {
        match self {
            RampOverflow::ClampToLast => 0,
            RampOverflow::Transparent => 1,
        }
    }
}

/// Settings that persist across frames until the caller changes them.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapConfig {
    pub constants: ShaderConstants,
    /// Point sprite edge length in logical pixels.
    pub point_size: f32,
    pub intensity_range: IntensityRange,
    /// Multiplier applied to normalized intensity before clamping.
    pub intensity_scale: f32,
    pub falloff: Falloff,
    pub opacity: f32,
    pub ramp: ColorRamp,
    pub overflow: RampOverflow,
}

impl HeatmapConfig {
    pub fn with_point_size(mut self, size: f32) -> Self {
        self.point_size = size.max(0.0);
        self
    }

    pub fn with_intensity_range(mut self, range: IntensityRange) -> Self {
        self.intensity_range = range;
        self
    }

    pub fn with_intensity_scale(mut self, scale: f32) -> Self {
        self.intensity_scale = scale;
        self
    }

    pub fn with_falloff(mut self, falloff: Falloff) -> Self {
        self.falloff = falloff;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_ramp(mut self, ramp: ColorRamp) -> Self {
        self.ramp = ramp;
        self
    }

    pub fn with_overflow(mut self, overflow: RampOverflow) -> Self {
        self.overflow = overflow;
        self
    }

    /// Checks the constants and re-validates the ramp against them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.constants.validate()?;
        self.ramp.check_capacity(self.constants.max_colors)
    }
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            constants: ShaderConstants::STANDARD,
            point_size: 20.0,
            intensity_range: IntensityRange::new(0.0, 1.0),
            intensity_scale: 1.0,
            falloff: Falloff::Hard,
            opacity: 1.0,
            ramp: ColorRamp::classic(),
            overflow: RampOverflow::ClampToLast,
        }
    }
}
