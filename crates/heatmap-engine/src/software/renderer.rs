use crate::config::HeatmapConfig;
use crate::coords::ViewportParams;
use crate::error::ConfigError;
use crate::heat::HeatPoint;

use super::{AlphaBuffer, Frame, colorize, rasterize_points};

/// CPU counterpart of `render::HeatmapPipeline`.
///
/// Owns the coverage buffer and reuses it across frames, resizing it to the
/// frame it renders into.
#[derive(Debug, Clone)]
pub struct SoftwareRenderer {
    config: HeatmapConfig,
    buffer: AlphaBuffer,
}

impl SoftwareRenderer {
    pub fn new(config: HeatmapConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let buffer = AlphaBuffer::new(0, 0, config.constants.default_alpha);
        Ok(Self { config, buffer })
    }

    #[inline]
    pub fn config(&self) -> &HeatmapConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: HeatmapConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Coverage left by the last [`render`](Self::render).
    #[inline]
    pub fn coverage(&self) -> &AlphaBuffer {
        &self.buffer
    }

    /// Clears coverage, rasterizes `points`, colorizes over `frame`.
    pub fn render(&mut self, points: &[HeatPoint], params: &ViewportParams, frame: &mut Frame) {
        let k = &self.config.constants;
        self.buffer.resize(frame.width(), frame.height(), k.default_alpha);
        rasterize_points(&mut self.buffer, points, &self.config, params);
        colorize(
            &self.buffer,
            frame,
            &self.config.ramp,
            self.config.opacity,
            k,
            self.config.overflow,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::{ColorRamp, ColorRgba, ColorStop};

    fn single_stop(c0: ColorRgba) -> HeatmapConfig {
        HeatmapConfig::default()
            .with_point_size(6.0)
            .with_ramp(ColorRamp::new(vec![ColorStop::new(0.0, c0)]).unwrap())
    }

    #[test]
    fn isolated_point_paints_first_color_inside_disc_only() {
        let c0 = ColorRgba::new(0.2, 0.6, 0.4, 1.0);
        let opacity = 0.5;
        let mut r = SoftwareRenderer::new(single_stop(c0).with_opacity(opacity)).unwrap();
        let params = ViewportParams::new(20, 20);
        let mut frame = Frame::new(20, 20, ColorRgba::transparent());

        r.render(&[HeatPoint::new(10.0, 10.0, 1.0)], &params, &mut frame);

        let expected = c0.scale(opacity);
        let mut inside = 0;
        for y in 0..20 {
            for x in 0..20 {
                let covered = r.coverage().get(x, 19 - y) > 0.0;
                let px = frame.get(x, y);
                if covered {
                    inside += 1;
                    assert_eq!(px, expected);
                } else {
                    assert_eq!(px, ColorRgba::transparent());
                }
            }
        }
        assert!(inside > 0);
    }

    #[test]
    fn nan_point_does_not_erase_overlapping_point() {
        let c0 = ColorRgba::new(0.9, 0.1, 0.1, 1.0);
        let params = ViewportParams::new(16, 16);
        let mut r = SoftwareRenderer::new(single_stop(c0)).unwrap();

        let mut clean = Frame::new(16, 16, ColorRgba::transparent());
        r.render(&[HeatPoint::new(8.0, 8.0, 0.5)], &params, &mut clean);
        let mut mixed = Frame::new(16, 16, ColorRgba::transparent());
        let pts = [HeatPoint::new(8.0, 8.0, 0.5), HeatPoint::new(8.0, 8.0, f32::NAN)];
        r.render(&pts, &params, &mut mixed);

        assert_eq!(mixed, clean);
        assert_eq!(mixed.get(8, 8), c0);
    }

    #[test]
    fn rendering_twice_is_identical() {
        let points = [
            HeatPoint::new(4.0, 5.0, 0.3),
            HeatPoint::new(6.0, 5.0, 0.9),
            HeatPoint::new(5.0, 7.0, 0.6),
        ];
        let params = ViewportParams::new(12, 12).with_angle(0.3).with_zoom(1.2);
        let mut r = SoftwareRenderer::new(HeatmapConfig::default().with_point_size(5.0)).unwrap();

        let mut a = Frame::new(12, 12, ColorRgba::transparent());
        r.render(&points, &params, &mut a);
        let mut b = Frame::new(12, 12, ColorRgba::transparent());
        r.render(&points, &params, &mut b);

        assert_eq!(a, b);
    }

    #[test]
    fn resizes_coverage_with_frame() {
        let mut r = SoftwareRenderer::new(HeatmapConfig::default()).unwrap();
        let mut f = Frame::new(7, 3, ColorRgba::transparent());
        r.render(&[], &ViewportParams::new(7, 3), &mut f);
        assert_eq!((r.coverage().width(), r.coverage().height()), (7, 3));
    }

    #[test]
    fn rejects_invalid_config() {
        let mut cfg = HeatmapConfig::default();
        cfg.constants.min_zoom = -1.0;
        assert!(SoftwareRenderer::new(cfg).is_err());
    }
}
