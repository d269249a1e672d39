use super::Vec2;

/// Axis-aligned placement rectangle in model space.
///
/// Used by image layers: texture coordinate `(0, 0)` sits at `origin`,
/// `(1, 1)` at `origin + size`.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { origin: Vec2::new(x, y), size: Vec2::new(w, h) }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Corners in quad order: (0,0), (1,0), (1,1), (0,1) in texture space.
    pub fn corners(self) -> [Vec2; 4] {
        let Rect { origin: o, size: s } = self;
        [
            o,
            Vec2::new(o.x + s.x, o.y),
            Vec2::new(o.x + s.x, o.y + s.y),
            Vec2::new(o.x, o.y + s.y),
        ]
    }

    /// Maps a model-space point to texture coordinates.
    ///
    /// Returns `None` outside the half-open rectangle `[origin, origin + size)`.
    pub fn to_uv(self, p: Vec2) -> Option<Vec2> {
        if self.is_empty() {
            return None;
        }
        let uv = (p - self.origin).div_elem(self.size);
        let inside = uv.x >= 0.0 && uv.y >= 0.0 && uv.x < 1.0 && uv.y < 1.0;
        inside.then_some(uv)
    }
}
