/// RGBA color with `f32` channels, nominally in `[0, 1]`.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ColorRgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ColorRgba {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn transparent() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    #[inline]
    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    #[inline]
    pub const fn white() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }

    /// From 8-bit channels, as found in hex literals and decoded images.
    #[inline]
    pub fn from_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a as f32 / 255.0)
    }

    /// Quantizes to 8-bit channels, clamping to `[0, 1]` first.
    #[inline]
    pub fn to_u8(self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// `self * (1 - t) + other * t`, per channel (GLSL `mix`).
    #[inline]
    pub fn lerp(self, other: ColorRgba, t: f32) -> ColorRgba {
        let m = |a: f32, b: f32| a * (1.0 - t) + b * t;
        ColorRgba::new(m(self.r, other.r), m(self.g, other.g), m(self.b, other.b), m(self.a, other.a))
    }

    /// Multiplies all four channels.
    #[inline]
    pub fn scale(self, k: f32) -> ColorRgba {
        ColorRgba::new(self.r * k, self.g * k, self.b * k, self.a * k)
    }

    /// Source-over with a premultiplied source: `src + dst * (1 - src.a)`.
    #[inline]
    pub fn over(self, dst: ColorRgba) -> ColorRgba {
        let k = 1.0 - self.a;
        ColorRgba::new(
            self.r + dst.r * k,
            self.g + dst.g * k,
            self.b + dst.b * k,
            self.a + dst.a * k,
        )
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }
}

impl From<[f32; 4]> for ColorRgba {
    #[inline]
    fn from(c: [f32; 4]) -> Self {
        ColorRgba::new(c[0], c[1], c[2], c[3])
    }
}
