use crate::config::{MAX_COLORS, RampOverflow};
use crate::error::ConfigError;

use super::ColorRgba;

/// Floor for the distance between two adjacent offsets.
const OFFSET_EPSILON: f32 = 1e-6;

/// A single ramp stop.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: ColorRgba,
}

impl ColorStop {
    #[inline]
    pub const fn new(offset: f32, color: ColorRgba) -> Self {
        Self { offset, color }
    }
}

/// Piecewise-linear color ramp over accumulated coverage.
///
/// Invariants (checked by [`ColorRamp::new`]):
/// - 1 ..= [`MAX_COLORS`] stops
/// - finite offsets and colors
/// - non-decreasing offsets
///
/// `offsets[0]` doubles as a threshold: coverage at or below it takes the
/// first color verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    stops: Vec<ColorStop>,
}

impl ColorRamp {
    pub fn new(stops: Vec<ColorStop>) -> Result<Self, ConfigError> {
        if stops.is_empty() {
            return Err(ConfigError::EmptyRamp);
        }
        if stops.len() > MAX_COLORS {
            return Err(ConfigError::TooManyStops { count: stops.len(), max: MAX_COLORS });
        }
        for (index, s) in stops.iter().enumerate() {
            if !(s.offset.is_finite() && s.color.is_finite()) {
                return Err(ConfigError::NonFiniteStop { index });
            }
            if index > 0 && s.offset < stops[index - 1].offset {
                return Err(ConfigError::UnsortedOffsets { index });
            }
        }
        if stops.len() < 2 {
            log::debug!("color ramp with a single stop; every covered pixel gets one color");
        }
        Ok(Self { stops })
    }

    /// Spreads `colors` evenly over `[0, 1]`.
    pub fn evenly_spaced(colors: &[ColorRgba]) -> Result<Self, ConfigError> {
        let n = colors.len();
        let stops = colors
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let t = if n > 1 { i as f32 / (n - 1) as f32 } else { 0.0 };
                ColorStop::new(t, c)
            })
            .collect();
        Self::new(stops)
    }

    /// Transparent blue through cyan, green and yellow to red.
    pub fn classic() -> Self {
        Self {
            stops: vec![
                ColorStop::new(0.0, ColorRgba::new(0.0, 0.0, 1.0, 0.0)),
                ColorStop::new(0.25, ColorRgba::new(0.0, 0.0, 1.0, 1.0)),
                ColorStop::new(0.45, ColorRgba::new(0.0, 1.0, 1.0, 1.0)),
                ColorStop::new(0.6, ColorRgba::new(0.0, 1.0, 0.0, 1.0)),
                ColorStop::new(0.8, ColorRgba::new(1.0, 1.0, 0.0, 1.0)),
                ColorStop::new(1.0, ColorRgba::new(1.0, 0.0, 0.0, 1.0)),
            ],
        }
    }

    #[inline]
    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub(crate) fn check_capacity(&self, max_colors: usize) -> Result<(), ConfigError> {
        if self.stops.len() > max_colors {
            return Err(ConfigError::TooManyStops { count: self.stops.len(), max: max_colors });
        }
        Ok(())
    }

    /// Color for coverage `alpha`, before opacity.
    ///
    /// Only the first `max_colors` stops take part. The scan returns on the
    /// first stop whose offset is `>= alpha`; if none qualifies, `overflow`
    /// decides the result.
    pub fn lookup(&self, alpha: f32, max_colors: usize, overflow: RampOverflow) -> ColorRgba {
        let Some(first) = self.stops.first() else {
            return ColorRgba::transparent();
        };
        if alpha <= first.offset {
            return first.color;
        }

        let honored = self.stops.len().min(max_colors.max(1));
        for i in 1..honored {
            let hi = self.stops[i];
            if alpha <= hi.offset {
                let lo = self.stops[i - 1];
                let span = (hi.offset - lo.offset).max(OFFSET_EPSILON);
                let t = (alpha - lo.offset) / span;
                return lo.color.lerp(hi.color, t);
            }
        }

        match overflow {
            RampOverflow::ClampToLast => self.stops[honored - 1].color,
            RampOverflow::Transparent => ColorRgba::transparent(),
        }
    }

    /// Colors and offsets laid out for the colorizer uniform.
    ///
    /// Offsets are packed four to a `vec4` to satisfy uniform array stride.
    pub(crate) fn pack(&self) -> ([[f32; 4]; MAX_COLORS], [[f32; 4]; MAX_COLORS / 4]) {
        let mut colors = [[0.0f32; 4]; MAX_COLORS];
        let mut offsets = [[0.0f32; 4]; MAX_COLORS / 4];
        for (i, s) in self.stops.iter().take(MAX_COLORS).enumerate() {
            colors[i] = s.color.to_array();
            offsets[i / 4][i % 4] = s.offset;
        }
        (colors, offsets)
    }
}

impl Default for ColorRamp {
    fn default() -> Self {
        Self::classic()
    }
}
