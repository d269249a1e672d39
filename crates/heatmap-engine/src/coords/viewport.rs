use super::Vec2;

/// Per-frame view parameters shared by every pass.
///
/// `resolution` is in device pixels; `translate` is in model units and is
/// scaled by `density` together with positions.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportParams {
    pub translate: Vec2,
    pub zoom: f32,
    /// Radians. `0.0` skips the rotation entirely.
    pub angle: f32,
    pub density: f32,
    pub resolution: Vec2,
}

impl ViewportParams {
    /// Identity view over a `width` × `height` device-pixel viewport.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            translate: Vec2::zero(),
            zoom: 1.0,
            angle: 0.0,
            density: 1.0,
            resolution: Vec2::new(width as f32, height as f32),
        }
    }

    pub fn with_translate(mut self, x: f32, y: f32) -> Self {
        self.translate = Vec2::new(x, y);
        self
    }

    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    /// Density below 1 is raised to 1.
    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density.max(1.0);
        self
    }

    #[inline]
    pub fn aspect(self) -> f32 {
        self.resolution.x / self.resolution.y
    }

    /// Resolution rounded to whole pixels, as `(width, height)`.
    #[inline]
    pub fn pixel_size(self) -> (u32, u32) {
        (self.resolution.x.max(0.0).round() as u32, self.resolution.y.max(0.0).round() as u32)
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.resolution.x > 0.0
            && self.resolution.y > 0.0
            && self.resolution.is_finite()
            && self.translate.is_finite()
            && self.zoom.is_finite()
            && self.angle.is_finite()
            && self.density.is_finite()
    }
}
