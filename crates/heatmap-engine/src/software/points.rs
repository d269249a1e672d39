use crate::config::{Falloff, HeatmapConfig};
use crate::coords::{TransformVariant, Vec2, ViewportParams, ViewportTransform};
use crate::heat::{HeatPoint, IntensityRange};

use super::{AlphaBuffer, clip_to_pixel};

/// Coverage written by one disc fragment, or `None` outside the disc.
///
/// `local` is the disc-local coordinate `2 * pointCoord - 1`.
#[inline]
pub fn point_alpha(
    local: Vec2,
    intensity: f32,
    range: IntensityRange,
    scale: f32,
    falloff: Falloff,
) -> Option<f32> {
    let r = local.dot(local);
    if r > 1.0 {
        return None;
    }
    let mut alpha = range.normalize(intensity) * scale;
    if falloff == Falloff::Soft {
        alpha *= 1.0 - r.sqrt();
    }
    Some(alpha.clamp(0.0, 1.0))
}

/// Point pass: blends one disc per point into `buffer`.
///
/// Does not clear; callers clear to `default_alpha` first. Points with a
/// non-finite coordinate or intensity are skipped.
pub fn rasterize_points(
    buffer: &mut AlphaBuffer,
    points: &[HeatPoint],
    config: &HeatmapConfig,
    params: &ViewportParams,
) {
    let transform = ViewportTransform::new(&config.constants);
    let (w, h) = (buffer.width(), buffer.height());
    if w == 0 || h == 0 || !params.is_valid() {
        return;
    }

    let side = transform.point_size(config.point_size, params);
    if !(side > 0.0) {
        return;
    }
    let half = side * 0.5;

    for p in points.iter().filter(|p| p.is_finite()) {
        let clip = transform.project(p.pos(), params, TransformVariant::Point);
        let center = clip_to_pixel(clip, w, h);
        if !center.is_finite() {
            continue;
        }

        // Pixel centers inside [center - half, center + half).
        let x0 = (center.x - half - 0.5).ceil().max(0.0);
        let y0 = (center.y - half - 0.5).ceil().max(0.0);
        let x1 = (center.x + half - 0.5).ceil().min(w as f32);
        let y1 = (center.y + half - 0.5).ceil().min(h as f32);
        if x0 >= x1 || y0 >= y1 {
            continue;
        }

        for y in y0 as u32..y1 as u32 {
            for x in x0 as u32..x1 as u32 {
                let pc = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let local = (pc - center) / half;
                if let Some(a) = point_alpha(
                    local,
                    p.intensity,
                    config.intensity_range,
                    config.intensity_scale,
                    config.falloff,
                ) {
                    buffer.blend(x, y, a);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(size: f32) -> HeatmapConfig {
        HeatmapConfig::default().with_point_size(size)
    }

    // ── per-fragment alpha ────────────────────────────────────────────────

    #[test]
    fn alpha_at_max_and_min_intensity() {
        let r = IntensityRange::new(0.0, 4.0);
        assert_eq!(point_alpha(Vec2::zero(), 4.0, r, 1.0, Falloff::Hard), Some(1.0));
        assert_eq!(point_alpha(Vec2::zero(), 0.0, r, 1.0, Falloff::Hard), Some(0.0));
    }

    #[test]
    fn alpha_is_clamped() {
        let r = IntensityRange::new(0.0, 1.0);
        assert_eq!(point_alpha(Vec2::zero(), 3.0, r, 1.0, Falloff::Hard), Some(1.0));
        assert_eq!(point_alpha(Vec2::zero(), -3.0, r, 1.0, Falloff::Hard), Some(0.0));
    }

    #[test]
    fn outside_disc_is_discarded() {
        let r = IntensityRange::new(0.0, 1.0);
        assert_eq!(point_alpha(Vec2::new(0.8, 0.8), 1.0, r, 1.0, Falloff::Hard), None);
        assert!(point_alpha(Vec2::new(1.0, 0.0), 1.0, r, 1.0, Falloff::Hard).is_some());
    }

    #[test]
    fn hard_edge_is_flat_soft_edge_fades() {
        let r = IntensityRange::new(0.0, 1.0);
        let edge = Vec2::new(0.9, 0.0);
        assert_eq!(point_alpha(edge, 0.5, r, 1.0, Falloff::Hard), Some(0.5));
        let soft = point_alpha(edge, 0.5, r, 1.0, Falloff::Soft).unwrap();
        assert!((soft - 0.5 * (1.0 - 0.9)).abs() < 1e-6);
    }

    #[test]
    fn identical_intensities_do_not_produce_nan() {
        let r = IntensityRange::new(7.0, 7.0);
        let a = point_alpha(Vec2::zero(), 7.0, r, 1.0, Falloff::Hard).unwrap();
        assert!(a.is_finite());
    }

    // ── rasterization ─────────────────────────────────────────────────────

    #[test]
    fn empty_batch_leaves_buffer_cleared() {
        let mut b = AlphaBuffer::new(8, 8, 0.0);
        rasterize_points(&mut b, &[], &cfg(4.0), &ViewportParams::new(8, 8));
        assert!(b.as_slice().iter().all(|&a| a == 0.0));
    }

    #[test]
    fn disc_is_centered_and_hard_edged() {
        // Model (8, 8) in a 16x16 viewport → clip (0, 0) → pixel center (8, 8).
        let mut b = AlphaBuffer::new(16, 16, 0.0);
        let pts = [HeatPoint::new(8.0, 8.0, 1.0)];
        rasterize_points(&mut b, &pts, &cfg(8.0), &ViewportParams::new(16, 16));

        assert_eq!(b.get(7, 7), 1.0);
        assert_eq!(b.get(8, 8), 1.0);
        assert_eq!(b.get(4, 7), 1.0); // local x = -0.875, y = -0.125
        assert_eq!(b.get(4, 4), 0.0); // corner of the sprite, outside the disc
        assert_eq!(b.get(12, 8), 0.0); // past the sprite
    }

    #[test]
    fn overlapping_discs_accumulate() {
        let mut b = AlphaBuffer::new(16, 16, 0.0);
        let pts = [HeatPoint::new(8.0, 8.0, 0.5), HeatPoint::new(8.0, 8.0, 0.5)];
        rasterize_points(&mut b, &pts, &cfg(4.0), &ViewportParams::new(16, 16));
        assert_eq!(b.get(8, 8), 0.75);
    }

    #[test]
    fn non_finite_points_are_skipped() {
        let params = ViewportParams::new(16, 16);
        let mut expected = AlphaBuffer::new(16, 16, 0.0);
        rasterize_points(&mut expected, &[HeatPoint::new(8.0, 8.0, 0.5)], &cfg(4.0), &params);

        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let mut b = AlphaBuffer::new(16, 16, 0.0);
            let pts = [
                HeatPoint::new(8.0, 8.0, 0.5),
                HeatPoint::new(8.0, 8.0, bad),
                HeatPoint::new(bad, 8.0, 1.0),
            ];
            rasterize_points(&mut b, &pts, &cfg(4.0), &params);
            assert_eq!(b.as_slice(), expected.as_slice(), "intensity {bad}");
        }
        assert_eq!(expected.get(8, 8), 0.5);
    }

    #[test]
    fn point_pass_keeps_model_y_in_clip_orientation() {
        // Model y near 0 projects to clip y near -1, i.e. the bottom rows.
        let mut b = AlphaBuffer::new(16, 16, 0.0);
        let pts = [HeatPoint::new(8.0, 1.0, 1.0)];
        rasterize_points(&mut b, &pts, &cfg(2.0), &ViewportParams::new(16, 16));
        assert_eq!(b.get(8, 14), 1.0);
        assert_eq!(b.get(8, 1), 0.0);
    }

    #[test]
    fn density_enlarges_sprite() {
        let params = ViewportParams::new(32, 32).with_density(2.0);
        let mut b = AlphaBuffer::new(32, 32, 0.0);
        // (8 * 2) / 32 → clip 0 → pixel 16; side = 4 * 2 = 8 px.
        rasterize_points(&mut b, &[HeatPoint::new(8.0, 8.0, 1.0)], &cfg(4.0), &params);
        assert_eq!(b.get(13, 16), 1.0);
        assert_eq!(b.get(11, 16), 0.0);
    }
}
