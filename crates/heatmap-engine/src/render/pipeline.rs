use crate::config::HeatmapConfig;
use crate::coords::ViewportParams;
use crate::error::{ConfigError, PipelineError};
use crate::heat::HeatPoint;
use crate::paint::ColorRamp;

use super::colorize::GradientColorizer;
use super::offscreen::OffscreenAlphaBuffer;
use super::points::PointRasterizer;
use super::{RenderCtx, RenderTarget};

/// Where a frame is within the two-pass sequence.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum PassState {
    #[default]
    Idle,
    RasterizingPoints,
    Colorizing,
}

impl PassState {
    /// Validates `self → to`.
    ///
    /// Legal moves: `Idle → RasterizingPoints → Colorizing → Idle`.
    pub fn advance(self, to: PassState) -> Result<PassState, PipelineError> {
        use PassState::*;
        match (self, to) {
            (Idle, RasterizingPoints) | (RasterizingPoints, Colorizing) | (Colorizing, Idle) => {
                Ok(to)
            }
            (from, to) => Err(PipelineError::InvalidTransition { from, to }),
        }
    }
}

/// Two-pass heatmap renderer: points → coverage buffer → colored target.
///
/// Owns the coverage buffer and both passes. [`render`](Self::render) runs a
/// whole frame; [`rasterize`](Self::rasterize) and
/// [`colorize`](Self::colorize) expose the two halves for callers that
/// interleave other work, and are checked against [`PassState`].
pub struct HeatmapPipeline {
    config: HeatmapConfig,
    state: PassState,
    coverage: Option<OffscreenAlphaBuffer>,
    points: PointRasterizer,
    colorizer: GradientColorizer,
}

impl HeatmapPipeline {
    pub fn new(config: HeatmapConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            points: PointRasterizer::new(config.constants),
            colorizer: GradientColorizer::new(config.constants),
            config,
            state: PassState::Idle,
            coverage: None,
        })
    }

    #[inline]
    pub fn config(&self) -> &HeatmapConfig {
        &self.config
    }

    /// Replaces every setting. New shader constants rebuild both passes and
    /// drop the coverage buffer.
    pub fn set_config(&mut self, config: HeatmapConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if config.constants != self.config.constants {
            log::debug!("heatmap shader constants changed, rebuilding passes");
            self.points = PointRasterizer::new(config.constants);
            self.colorizer = GradientColorizer::new(config.constants);
            self.coverage = None;
        }
        self.config = config;
        Ok(())
    }

    pub fn set_ramp(&mut self, ramp: ColorRamp) -> Result<(), ConfigError> {
        ramp.check_capacity(self.config.constants.max_colors)?;
        self.config.ramp = ramp;
        Ok(())
    }

    #[inline]
    pub fn state(&self) -> PassState {
        self.state
    }

    /// Coverage written by the last point pass.
    #[inline]
    pub fn coverage(&self) -> Option<&OffscreenAlphaBuffer> {
        self.coverage.as_ref()
    }

    /// Sizes the coverage buffer. Called implicitly by [`rasterize`](Self::rasterize).
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> Result<(), PipelineError> {
        if width == 0 || height == 0 {
            return Err(PipelineError::EmptyViewport { width, height });
        }
        match self.coverage.as_mut() {
            Some(buffer) => {
                buffer.ensure_size(device, width, height);
            }
            None => {
                self.coverage = Some(OffscreenAlphaBuffer::new(
                    device,
                    width,
                    height,
                    self.config.constants.precision,
                ));
            }
        }
        Ok(())
    }

    /// Point pass: clears the coverage buffer and accumulates `points`.
    pub fn rasterize(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        points: &[HeatPoint],
        params: &ViewportParams,
    ) -> Result<(), PipelineError> {
        let next = self.state.advance(PassState::RasterizingPoints)?;
        let (width, height) = params.pixel_size();
        self.resize(ctx.device, width, height)?;
        let Some(coverage) = self.coverage.as_ref() else {
            return Err(PipelineError::EmptyViewport { width, height });
        };

        log::trace!("heatmap point pass: {} points into {width}x{height}", points.len());
        self.points.render(ctx, encoder, coverage, points, &self.config, params);
        self.state = next;
        Ok(())
    }

    /// Colorize pass: maps the coverage buffer through the ramp into `target`.
    ///
    /// `target` must have the size of the last point pass. Target pixels
    /// beyond the coverage buffer are left untouched.
    pub fn colorize(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
    ) -> Result<(), PipelineError> {
        self.state = self.state.advance(PassState::Colorizing)?;
        let Some(coverage) = self.coverage.as_ref() else {
            self.state = PassState::Idle;
            return Err(PipelineError::EmptyViewport { width: 0, height: 0 });
        };

        log::trace!("heatmap colorize pass");
        self.colorizer.render(
            ctx,
            target,
            coverage,
            &self.config.ramp,
            self.config.opacity,
            self.config.overflow,
        );
        self.state = self.state.advance(PassState::Idle)?;
        Ok(())
    }

    /// Runs both passes, leaving the heatmap composited over `target`.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        points: &[HeatPoint],
        params: &ViewportParams,
    ) -> Result<(), PipelineError> {
        self.rasterize(ctx, &mut *target.encoder, points, params)?;
        self.colorize(ctx, target)
    }

    /// Drops an unfinished frame and returns to [`PassState::Idle`].
    pub fn abandon(&mut self) {
        if self.state != PassState::Idle {
            log::debug!("heatmap frame abandoned in {:?}", self.state);
        }
        self.state = PassState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RampOverflow;
    use crate::device::{HeadlessGpu, test_gpu};
    use crate::paint::{ColorRgba, ColorStop};
    use crate::software::{Frame, SoftwareRenderer};

    // ── state machine ─────────────────────────────────────────────────────

    #[test]
    fn legal_cycle() {
        let s = PassState::Idle;
        let s = s.advance(PassState::RasterizingPoints).unwrap();
        let s = s.advance(PassState::Colorizing).unwrap();
        assert_eq!(s.advance(PassState::Idle).unwrap(), PassState::Idle);
    }

    #[test]
    fn colorize_before_rasterize_is_rejected() {
        assert_eq!(
            PassState::Idle.advance(PassState::Colorizing),
            Err(PipelineError::InvalidTransition {
                from: PassState::Idle,
                to: PassState::Colorizing
            })
        );
    }

    #[test]
    fn double_rasterize_is_rejected() {
        assert!(PassState::RasterizingPoints.advance(PassState::RasterizingPoints).is_err());
    }

    #[test]
    fn new_pipeline_is_idle_and_validates_config() {
        let p = HeatmapPipeline::new(HeatmapConfig::default()).unwrap();
        assert_eq!(p.state(), PassState::Idle);
        assert!(p.coverage().is_none());

        let mut bad = HeatmapConfig::default();
        bad.constants.max_colors = 0;
        assert!(HeatmapPipeline::new(bad).is_err());
    }

    #[test]
    fn set_ramp_enforces_max_colors() {
        let mut cfg = HeatmapConfig::default();
        cfg.constants.max_colors = 2;
        cfg.ramp = ColorRamp::evenly_spaced(&[ColorRgba::black(), ColorRgba::white()]).unwrap();
        let mut p = HeatmapPipeline::new(cfg).unwrap();
        let three = ColorRamp::evenly_spaced(&[ColorRgba::black(); 3]).unwrap();
        assert!(matches!(p.set_ramp(three), Err(ConfigError::TooManyStops { count: 3, max: 2 })));
    }

    #[test]
    fn changing_constants_drops_coverage() {
        let mut p = HeatmapPipeline::new(HeatmapConfig::default()).unwrap();
        let mut cfg = HeatmapConfig::default();
        cfg.constants.precision = crate::config::Precision::Medium;
        p.set_config(cfg).unwrap();
        assert_eq!(p.config().constants.precision, crate::config::Precision::Medium);
        assert!(p.coverage().is_none());
    }

    #[test]
    fn abandon_returns_to_idle() {
        let mut p = HeatmapPipeline::new(HeatmapConfig::default()).unwrap();
        p.state = PassState::RasterizingPoints;
        p.abandon();
        assert_eq!(p.state(), PassState::Idle);
    }

    // ── GPU ───────────────────────────────────────────────────────────────

    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    fn render_gpu(
        gpu: &HeadlessGpu,
        pipeline: &mut HeatmapPipeline,
        points: &[HeatPoint],
        params: &ViewportParams,
    ) -> Vec<u8> {
        let (w, h) = params.pixel_size();
        let (texture, view) = gpu.create_target(w, h, FORMAT);
        gpu.clear(&view, wgpu::Color::TRANSPARENT);
        let ctx = RenderCtx::new(gpu.device(), gpu.queue(), FORMAT);
        let mut encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        let mut target = RenderTarget::new(&mut encoder, &view);
        pipeline.render(&ctx, &mut target, points, params).unwrap();
        gpu.queue().submit(std::iter::once(encoder.finish()));
        gpu.read_rgba8(&texture).unwrap()
    }

    fn assert_close(gpu: &[u8], cpu: &[u8], tolerance: u8) {
        assert_eq!(gpu.len(), cpu.len());
        for (i, (a, b)) in gpu.iter().zip(cpu).enumerate() {
            assert!(a.abs_diff(*b) <= tolerance, "byte {i}: gpu {a} vs cpu {b}");
        }
    }

    #[test]
    fn gpu_matches_software_for_isolated_point() {
        let Some(gpu) = test_gpu() else { return };
        let ramp = ColorRamp::new(vec![ColorStop::new(0.0, ColorRgba::new(0.2, 0.6, 0.4, 1.0))])
            .unwrap();
        let config = HeatmapConfig::default().with_point_size(6.0).with_ramp(ramp).with_opacity(0.5);
        let params = ViewportParams::new(20, 20);
        let points = [HeatPoint::new(10.0, 10.0, 1.0)];

        let mut pipeline = HeatmapPipeline::new(config.clone()).unwrap();
        let out = render_gpu(&gpu, &mut pipeline, &points, &params);
        assert_eq!(pipeline.state(), PassState::Idle);

        let mut sw = SoftwareRenderer::new(config).unwrap();
        let mut frame = Frame::new(20, 20, ColorRgba::transparent());
        sw.render(&points, &params, &mut frame);
        assert_close(&out, &frame.to_rgba8(), 1);
    }

    #[test]
    fn gpu_matches_software_for_overlapping_soft_points() {
        let Some(gpu) = test_gpu() else { return };
        // Transparent at zero so pixels on the disc rim stay near zero either way.
        let ramp = ColorRamp::evenly_spaced(&[ColorRgba::transparent(), ColorRgba::white()])
            .unwrap();
        let config = HeatmapConfig::default()
            .with_point_size(9.0)
            .with_ramp(ramp)
            .with_falloff(crate::config::Falloff::Soft)
            .with_overflow(RampOverflow::Transparent);
        let params = ViewportParams::new(24, 16).with_zoom(1.25).with_translate(1.0, -1.0);
        let points = [
            HeatPoint::new(10.2, 7.7, 0.5),
            HeatPoint::new(12.6, 8.3, 0.8),
            HeatPoint::new(11.1, 9.4, 0.35),
        ];

        let mut pipeline = HeatmapPipeline::new(config.clone()).unwrap();
        let out = render_gpu(&gpu, &mut pipeline, &points, &params);

        let mut sw = SoftwareRenderer::new(config).unwrap();
        let mut frame = Frame::new(24, 16, ColorRgba::transparent());
        sw.render(&points, &params, &mut frame);
        // Half-float coverage and GPU interpolation differ from f32 by a few ulps.
        assert_close(&out, &frame.to_rgba8(), 3);
    }

    /// Soft discs over a ramp that starts transparent, so rim pixels stay
    /// near zero whichever side of the disc edge they round to.
    fn soft_config() -> HeatmapConfig {
        let ramp = ColorRamp::evenly_spaced(&[ColorRgba::transparent(), ColorRgba::white()])
            .unwrap();
        HeatmapConfig::default()
            .with_point_size(5.5)
            .with_ramp(ramp)
            .with_falloff(crate::config::Falloff::Soft)
            .with_overflow(RampOverflow::Transparent)
    }

    fn render_cpu(config: &HeatmapConfig, points: &[HeatPoint], params: &ViewportParams) -> Vec<u8> {
        let (w, h) = params.pixel_size();
        let mut sw = SoftwareRenderer::new(config.clone()).unwrap();
        let mut frame = Frame::new(w, h, ColorRgba::transparent());
        sw.render(points, params, &mut frame);
        frame.to_rgba8()
    }

    #[test]
    fn gpu_follows_viewport_resizes() {
        let Some(gpu) = test_gpu() else { return };
        let config = soft_config();
        let points = [HeatPoint::new(3.2, 2.9, 0.9), HeatPoint::new(6.7, 4.4, 0.6)];
        let mut pipeline = HeatmapPipeline::new(config.clone()).unwrap();

        for (w, h) in [(8, 8), (12, 6), (8, 8)] {
            let params = ViewportParams::new(w, h);
            let out = render_gpu(&gpu, &mut pipeline, &points, &params);
            assert_eq!(pipeline.coverage().map(|c| c.size()), Some((w, h)));
            assert_close(&out, &render_cpu(&config, &points, &params), 3);
        }
    }

    #[test]
    fn gpu_matches_software_when_rotated_on_wide_viewport() {
        let Some(gpu) = test_gpu() else { return };
        let config = soft_config();
        let params = ViewportParams::new(24, 16)
            .with_angle(0.5)
            .with_zoom(1.3)
            .with_translate(-0.7, 1.2);
        let points = [
            HeatPoint::new(8.3, 6.1, 0.7),
            HeatPoint::new(14.8, 9.6, 1.0),
            HeatPoint::new(11.4, 4.2, 0.4),
        ];

        let mut pipeline = HeatmapPipeline::new(config.clone()).unwrap();
        let out = render_gpu(&gpu, &mut pipeline, &points, &params);
        let cpu = render_cpu(&config, &points, &params);
        assert_close(&out, &cpu, 3);
        assert!(cpu.iter().any(|&b| b > 0));
    }

    #[test]
    fn empty_batch_leaves_target_untouched() {
        let Some(gpu) = test_gpu() else { return };
        let mut pipeline = HeatmapPipeline::new(HeatmapConfig::default()).unwrap();
        let out = render_gpu(&gpu, &mut pipeline, &[], &ViewportParams::new(8, 8));
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn zero_viewport_is_rejected_without_leaving_idle() {
        let Some(gpu) = test_gpu() else { return };
        let mut pipeline = HeatmapPipeline::new(HeatmapConfig::default()).unwrap();
        let ctx = RenderCtx::new(gpu.device(), gpu.queue(), FORMAT);
        let mut encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        let err = pipeline.rasterize(&ctx, &mut encoder, &[], &ViewportParams::new(0, 4));
        assert_eq!(err, Err(PipelineError::EmptyViewport { width: 0, height: 4 }));
        assert_eq!(pipeline.state(), PassState::Idle);
    }
}
