use anyhow::{Context, Result};
use winit::dpi::LogicalSize;

use heatmap_engine::HeatmapConfig;
use heatmap_engine::config::Falloff;
use heatmap_engine::coords::Rect;
use heatmap_engine::core::{App, AppControl, FrameCtx};
use heatmap_engine::device::GpuInit;
use heatmap_engine::heat::{HeatPoint, IntensityRange};
use heatmap_engine::logging::{LoggingConfig, init_logging};
use heatmap_engine::paint::{ColorRamp, ColorRgba};
use heatmap_engine::render::{HeatmapPipeline, ImageCompositor, ImageLayer};
use heatmap_engine::window::{Runtime, RuntimeConfig};

/// Model-space extent of the demo scene.
const SCENE_W: f32 = 1280.0;
const SCENE_H: f32 = 720.0;

/// Radians per second.
const SPIN: f32 = 0.05;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let backdrop = match std::env::var_os("HEATMAP_BACKDROP") {
        Some(path) => Backdrop::load(std::path::Path::new(&path))?,
        None => Backdrop::checkerboard(256, 144, 16),
    };
    let points = cluster_cloud(0x5eed_1234, 8, 600);
    log::info!(
        "studio: {} points, backdrop {}x{}",
        points.len(),
        backdrop.width,
        backdrop.height
    );

    let config = HeatmapConfig::default()
        .with_point_size(48.0)
        .with_intensity_range(IntensityRange::spanning(points.iter().map(|p| p.intensity)))
        .with_intensity_scale(0.3)
        .with_falloff(Falloff::Soft)
        .with_opacity(0.85)
        .with_ramp(ColorRamp::classic());

    let app = Studio {
        images: ImageCompositor::new(config.constants),
        heatmap: HeatmapPipeline::new(config).context("invalid heatmap configuration")?,
        backdrop,
        layer: None,
        points,
    };

    let runtime = RuntimeConfig {
        title: "heatmap studio".to_string(),
        initial_size: LogicalSize::new(SCENE_W as f64, SCENE_H as f64),
    };
    Runtime::run(runtime, GpuInit::default(), app)
}

struct Studio {
    images: ImageCompositor,
    heatmap: HeatmapPipeline,
    backdrop: Backdrop,
    /// Uploaded on the first frame, once a device exists.
    layer: Option<ImageLayer>,
    points: Vec<HeatPoint>,
}

impl App for Studio {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let params = ctx.window.viewport_params().with_angle(ctx.time.elapsed * SPIN);
        if !params.is_valid() {
            return AppControl::Continue;
        }

        let images = &mut self.images;
        let heatmap = &mut self.heatmap;
        let layer = &mut self.layer;
        let backdrop = &self.backdrop;
        let points = &self.points;

        ctx.render(ColorRgba::new(0.05, 0.05, 0.07, 1.0), |rctx, target| {
            if layer.is_none() {
                let rect = Rect::new(0.0, 0.0, SCENE_W, SCENE_H);
                match images.create_layer(rctx, backdrop.width, backdrop.height, &backdrop.rgba, rect) {
                    Ok(l) => *layer = Some(l),
                    Err(err) => log::error!("backdrop upload failed: {err:#}"),
                }
            }
            if let Some(layer) = layer.as_ref() {
                images.render(rctx, target, layer, &params);
            }
            if let Err(err) = heatmap.render(rctx, target, points, &params) {
                log::warn!("heatmap frame dropped: {err}");
                heatmap.abandon();
            }
        })
    }
}

// ── backdrop ──────────────────────────────────────────────────────────────

struct Backdrop {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Backdrop {
    fn load(path: &std::path::Path) -> Result<Self> {
        let img = image::open(path)
            .with_context(|| format!("failed to decode backdrop {}", path.display()))?
            .to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self { width, height, rgba: img.into_raw() })
    }

    fn checkerboard(width: u32, height: u32, cell: u32) -> Self {
        let cell = cell.max(1);
        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = if (x / cell + y / cell) % 2 == 0 { 58 } else { 40 };
                rgba.extend_from_slice(&[v, v, v + 6, 255]);
            }
        }
        Self { width, height, rgba }
    }
}

// ── procedural points ─────────────────────────────────────────────────────

/// Standard normal sample (Box-Muller).
fn gaussian(rng: &mut fastrand::Rng) -> f32 {
    let u1 = 1.0 - rng.f32();
    let u2 = rng.f32();
    (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos()
}

/// `clusters` blobs of `per_cluster` points inside the scene extent.
fn cluster_cloud(seed: u64, clusters: usize, per_cluster: usize) -> Vec<HeatPoint> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut points = Vec::with_capacity(clusters * per_cluster);
    for _ in 0..clusters {
        let cx = SCENE_W * (0.1 + 0.8 * rng.f32());
        let cy = SCENE_H * (0.1 + 0.8 * rng.f32());
        let spread = 30.0 + 60.0 * rng.f32();
        let weight = 0.3 + 0.7 * rng.f32();
        for _ in 0..per_cluster {
            let x = (cx + gaussian(&mut rng) * spread).clamp(0.0, SCENE_W);
            let y = (cy + gaussian(&mut rng) * spread).clamp(0.0, SCENE_H);
            points.push(HeatPoint::new(x, y, weight * rng.f32()));
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloud_is_repeatable_and_inside_scene() {
        let a = cluster_cloud(7, 3, 50);
        let b = cluster_cloud(7, 3, 50);
        assert_eq!(a, b);
        assert_ne!(a, cluster_cloud(8, 3, 50));
        assert_eq!(a.len(), 150);
        for p in &a {
            let [x, y] = p.position;
            assert!((0.0..=SCENE_W).contains(&x) && (0.0..=SCENE_H).contains(&y));
            assert!((0.0..1.0).contains(&p.intensity));
        }
    }

    #[test]
    fn checkerboard_is_opaque_rgba() {
        let b = Backdrop::checkerboard(4, 2, 1);
        assert_eq!(b.rgba.len(), 4 * 2 * 4);
        assert!(b.rgba.chunks(4).all(|px| px[3] == 255));
        assert_ne!(b.rgba[0], b.rgba[4]);
    }
}
