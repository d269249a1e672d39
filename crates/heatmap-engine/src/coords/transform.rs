use crate::config::ShaderConstants;

use super::{Vec2, ViewportParams};

/// Which pass a position is projected for.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TransformVariant {
    /// Point pass: Y kept as-is, rotation by `angle`.
    Point,
    /// Image pass: Y inverted in unit space, rotation by `-angle`.
    ///
    /// The point pass lands in the coverage buffer, which the colorizer
    /// presents flipped; the image pass draws straight to the target. The
    /// inverted Y and negated angle keep both layers registered on screen.
    Image,
}

/// Model → clip projection shared by the point and image passes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportTransform {
    min_zoom: f32,
}

impl ViewportTransform {
    pub fn new(constants: &ShaderConstants) -> Self {
        Self { min_zoom: constants.min_zoom }
    }

    #[inline]
    pub fn min_zoom(&self) -> f32 {
        self.min_zoom
    }

    /// `max(zoom, min_zoom)`. NaN collapses to the floor.
    #[inline]
    pub fn effective_zoom(&self, zoom: f32) -> f32 {
        zoom.max(self.min_zoom)
    }

    /// Projects a model-space position into clip space.
    pub fn project(&self, position: Vec2, params: &ViewportParams, variant: TransformVariant) -> Vec2 {
        let d = params.density;
        let mut unit = (position * d + params.translate * d).div_elem(params.resolution);
        if variant == TransformVariant::Image {
            unit.y = 1.0 - unit.y;
        }

        let mut clip = unit * 2.0 - Vec2::splat(1.0);
        clip = clip / self.effective_zoom(params.zoom);

        if params.angle != 0.0 {
            clip = rotate(clip, signed_angle(params.angle, variant), params.aspect());
        }
        clip
    }

    /// Inverse of [`project`](Self::project).
    pub fn unproject(&self, clip: Vec2, params: &ViewportParams, variant: TransformVariant) -> Vec2 {
        let mut c = clip;
        if params.angle != 0.0 {
            c = rotate(c, -signed_angle(params.angle, variant), params.aspect());
        }
        c = c * self.effective_zoom(params.zoom);

        let mut unit = (c + Vec2::splat(1.0)) * 0.5;
        if variant == TransformVariant::Image {
            unit.y = 1.0 - unit.y;
        }
        unit.mul_elem(params.resolution) / params.density - params.translate
    }

    /// Sprite edge length in device pixels.
    #[inline]
    pub fn point_size(&self, size: f32, params: &ViewportParams) -> f32 {
        size * params.density
    }
}

#[inline]
fn signed_angle(angle: f32, variant: TransformVariant) -> f32 {
    match variant {
        TransformVariant::Point => angle,
        TransformVariant::Image => -angle,
    }
}

/// Aspect-corrected rotation `S⁻¹ · R(a) · S · v`, `S = diag(aspect, 1)`.
///
/// `R` is the column-major `mat2(c, -s, s, c)`, so positive angles turn
/// clockwise in clip space.
pub(crate) fn rotate(v: Vec2, angle: f32, aspect: f32) -> Vec2 {
    let (s, c) = angle.sin_cos();
    let x = v.x * aspect;
    let y = v.y;
    let rx = c * x + s * y;
    let ry = -s * x + c * y;
    Vec2::new(rx / aspect, ry)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS
    }

    fn xf() -> ViewportTransform {
        ViewportTransform::new(&ShaderConstants::STANDARD)
    }

    // ── zoom floor ────────────────────────────────────────────────────────

    #[test]
    fn zoom_at_or_below_floor_is_exactly_floor() {
        let t = xf();
        for z in [0.1, 0.05, 0.0, -3.0, f32::NAN] {
            assert_eq!(t.effective_zoom(z), 0.1);
        }
        assert_eq!(t.effective_zoom(2.0), 2.0);
    }

    #[test]
    fn negative_zoom_does_not_invert() {
        let t = xf();
        let p = ViewportParams::new(100, 100).with_zoom(-1.0);
        let clip = t.project(Vec2::new(75.0, 75.0), &p, TransformVariant::Point);
        assert!(clip.x > 0.0 && clip.y > 0.0);
        assert!(approx(clip, Vec2::new(5.0, 5.0)));
    }

    // ── base mapping ──────────────────────────────────────────────────────

    #[test]
    fn viewport_corners_map_to_clip_corners() {
        let t = xf();
        let p = ViewportParams::new(200, 100);
        assert!(approx(t.project(Vec2::zero(), &p, TransformVariant::Point), Vec2::new(-1.0, -1.0)));
        assert!(approx(
            t.project(Vec2::new(200.0, 100.0), &p, TransformVariant::Point),
            Vec2::new(1.0, 1.0)
        ));
    }

    #[test]
    fn image_variant_inverts_y() {
        let t = xf();
        let p = ViewportParams::new(200, 100);
        assert!(approx(t.project(Vec2::zero(), &p, TransformVariant::Image), Vec2::new(-1.0, 1.0)));
    }

    #[test]
    fn translate_and_density_scale_together() {
        let t = xf();
        let p = ViewportParams::new(100, 100).with_translate(10.0, 0.0).with_density(2.0);
        // (15 + 10) * 2 / 100 = 0.5 → clip 0
        let clip = t.project(Vec2::new(15.0, 25.0), &p, TransformVariant::Point);
        assert!(approx(clip, Vec2::zero()));
    }

    // ── rotation ──────────────────────────────────────────────────────────

    #[test]
    fn zero_angle_matches_unrotated_computation() {
        let t = xf();
        let p = ViewportParams::new(300, 150).with_zoom(1.7).with_translate(3.0, -4.0);
        let pos = Vec2::new(120.0, 33.0);
        let unit = (pos + p.translate).div_elem(p.resolution);
        let expected = (unit * 2.0 - Vec2::splat(1.0)) / 1.7;
        assert_eq!(t.project(pos, &p, TransformVariant::Point), expected);
    }

    #[test]
    fn quarter_turn_is_clockwise_in_square_viewport() {
        let r = rotate(Vec2::new(1.0, 0.0), std::f32::consts::FRAC_PI_2, 1.0);
        assert!(approx(r, Vec2::new(0.0, -1.0)));
    }

    #[test]
    fn rotation_is_aspect_corrected() {
        // In a 2:1 viewport the clip-space x unit is twice as long on screen.
        let r = rotate(Vec2::new(0.0, 1.0), std::f32::consts::FRAC_PI_2, 2.0);
        assert!(approx(r, Vec2::new(0.5, 0.0)));
    }

    #[test]
    fn image_variant_rotates_the_other_way() {
        let t = xf();
        let a = 0.6;
        let p = ViewportParams::new(100, 100).with_angle(a);
        let pos = Vec2::new(80.0, 50.0);
        let point = t.project(pos, &p, TransformVariant::Point);
        let image = t.project(pos, &p, TransformVariant::Image);
        // Same horizontal clip, rotations in opposite directions over a mirrored y.
        assert!(approx(image, Vec2::new(point.x, -point.y)));
    }

    // ── inverse ───────────────────────────────────────────────────────────

    #[test]
    fn unproject_inverts_project() {
        let t = xf();
        let p = ViewportParams::new(640, 360)
            .with_translate(12.0, -8.0)
            .with_zoom(1.3)
            .with_angle(0.4)
            .with_density(2.0);
        for variant in [TransformVariant::Point, TransformVariant::Image] {
            let pos = Vec2::new(101.0, 57.0);
            let back = t.unproject(t.project(pos, &p, variant), &p, variant);
            assert!((back.x - pos.x).abs() < 1e-3 && (back.y - pos.y).abs() < 1e-3);
        }
    }

    #[test]
    fn point_size_scales_by_density() {
        let p = ViewportParams::new(10, 10).with_density(3.0);
        assert_eq!(xf().point_size(4.0, &p), 12.0);
    }
}
