use crate::config::INTENSITY_EPSILON;

/// Raw intensity bounds mapped onto `[0, 1]`.
///
/// `max <= min` is accepted; the denominator is floored at
/// [`INTENSITY_EPSILON`] so normalization never divides by zero.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct IntensityRange {
    pub min: f32,
    pub max: f32,
}

impl IntensityRange {
    #[inline]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Range spanning every intensity in `values`, or `[0, 1]` when empty.
    pub fn spanning(values: impl IntoIterator<Item = f32>) -> Self {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for v in values.into_iter().filter(|v| v.is_finite()) {
            min = min.min(v);
            max = max.max(v);
        }
        if min > max { Self::new(0.0, 1.0) } else { Self::new(min, max) }
    }

    #[inline]
    pub fn denominator(self) -> f32 {
        (self.max - self.min).max(INTENSITY_EPSILON)
    }

    /// `(value - min) / max(max - min, 1e-6)`. Not clamped.
    #[inline]
    pub fn normalize(self, value: f32) -> f32 {
        (value - self.min) / self.denominator()
    }
}

impl Default for IntensityRange {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_map_to_zero_and_one() {
        let r = IntensityRange::new(2.0, 10.0);
        assert_eq!(r.normalize(10.0), 1.0);
        assert_eq!(r.normalize(2.0), 0.0);
        assert_eq!(r.normalize(6.0), 0.5);
    }

    #[test]
    fn degenerate_range_stays_finite() {
        let r = IntensityRange::new(5.0, 5.0);
        assert_eq!(r.denominator(), INTENSITY_EPSILON);
        assert_eq!(r.normalize(5.0), 0.0);
        assert!(r.normalize(5.5).is_finite());
    }

    #[test]
    fn inverted_range_uses_epsilon_floor() {
        let r = IntensityRange::new(3.0, 1.0);
        assert_eq!(r.denominator(), INTENSITY_EPSILON);
    }

    #[test]
    fn spanning_ignores_non_finite_values() {
        let r = IntensityRange::spanning([4.0, f32::NAN, -1.0, 2.5]);
        assert_eq!(r, IntensityRange::new(-1.0, 4.0));
        assert_eq!(IntensityRange::spanning([]), IntensityRange::new(0.0, 1.0));
    }
}
