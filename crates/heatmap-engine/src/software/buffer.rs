use crate::paint::ColorRgba;

/// Single-channel coverage buffer.
///
/// The GPU keeps coverage in the alpha channel of an RGBA target whose color
/// channels stay zero; only the alpha is stored here.
#[derive(Debug, Clone, PartialEq)]
pub struct AlphaBuffer {
    width: u32,
    height: u32,
    alpha: Vec<f32>,
}

impl AlphaBuffer {
    pub fn new(width: u32, height: u32, clear_alpha: f32) -> Self {
        Self { width, height, alpha: vec![clear_alpha; (width as usize) * (height as usize)] }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self, alpha: f32) {
        self.alpha.fill(alpha);
    }

    /// Reallocates when the size changed; contents are cleared either way.
    pub fn resize(&mut self, width: u32, height: u32, clear_alpha: f32) {
        if width != self.width || height != self.height {
            log::debug!("software alpha buffer resized to {width}x{height}");
            *self = Self::new(width, height, clear_alpha);
        } else {
            self.clear(clear_alpha);
        }
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.alpha[self.index(x, y)]
    }

    /// Blends `src` over the stored coverage: `src + dst * (1 - src)`.
    #[inline]
    pub fn blend(&mut self, x: u32, y: u32, src: f32) {
        let i = self.index(x, y);
        let dst = self.alpha[i];
        self.alpha[i] = src + dst * (1.0 - src);
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.alpha
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y as usize * self.width as usize + x as usize
    }
}

/// RGBA color target, row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<ColorRgba>,
}

impl Frame {
    pub fn new(width: u32, height: u32, clear: ColorRgba) -> Self {
        Self { width, height, pixels: vec![clear; (width as usize) * (height as usize)] }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self, color: ColorRgba) {
        self.pixels.fill(color);
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> ColorRgba {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, color: ColorRgba) {
        let i = y as usize * self.width as usize + x as usize;
        self.pixels[i] = color;
    }

    #[inline]
    pub fn pixels(&self) -> &[ColorRgba] {
        &self.pixels
    }

    /// Tightly packed RGBA8, row-major.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|c| c.to_u8()).collect()
    }
}

/// Sampled source for the image pass, row 0 at texture coordinate `v = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTexture {
    width: u32,
    height: u32,
    texels: Vec<ColorRgba>,
}

impl ImageTexture {
    /// Returns `None` if `texels.len() != width * height`.
    pub fn new(width: u32, height: u32, texels: Vec<ColorRgba>) -> Option<Self> {
        (texels.len() == width as usize * height as usize && width > 0 && height > 0)
            .then_some(Self { width, height, texels })
    }

    /// From tightly packed RGBA8 bytes.
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != width as usize * height as usize * 4 {
            return None;
        }
        let texels = bytes.chunks_exact(4).map(|p| ColorRgba::from_u8(p[0], p[1], p[2], p[3])).collect();
        Self::new(width, height, texels)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Nearest-texel lookup with clamp-to-edge addressing.
    pub fn sample_nearest(&self, u: f32, v: f32) -> ColorRgba {
        let tx = ((u * self.width as f32).floor() as i64).clamp(0, self.width as i64 - 1) as usize;
        let ty = ((v * self.height as f32).floor() as i64).clamp(0, self.height as i64 - 1) as usize;
        self.texels[ty * self.width as usize + tx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_blend_saturates_at_one() {
        let mut b = AlphaBuffer::new(1, 1, 0.0);
        for _ in 0..64 {
            b.blend(0, 0, 0.5);
        }
        assert!(b.get(0, 0) <= 1.0);
        assert!(b.get(0, 0) > 0.999);
    }

    #[test]
    fn alpha_blend_of_two_halves() {
        let mut b = AlphaBuffer::new(1, 1, 0.0);
        b.blend(0, 0, 0.5);
        b.blend(0, 0, 0.5);
        assert_eq!(b.get(0, 0), 0.75);
    }

    #[test]
    fn resize_clears_contents() {
        let mut b = AlphaBuffer::new(2, 2, 0.0);
        b.blend(1, 1, 0.3);
        b.resize(2, 2, 0.0);
        assert!(b.as_slice().iter().all(|&a| a == 0.0));
        b.resize(3, 1, 0.0);
        assert_eq!((b.width(), b.height()), (3, 1));
    }

    #[test]
    fn texture_rejects_wrong_length() {
        assert!(ImageTexture::from_rgba8(2, 2, &[0u8; 12]).is_none());
        assert!(ImageTexture::from_rgba8(2, 2, &[0u8; 16]).is_some());
    }

    #[test]
    fn nearest_sampling_picks_quadrants() {
        let t = ImageTexture::new(
            2,
            2,
            vec![
                ColorRgba::new(1.0, 0.0, 0.0, 1.0),
                ColorRgba::new(0.0, 1.0, 0.0, 1.0),
                ColorRgba::new(0.0, 0.0, 1.0, 1.0),
                ColorRgba::white(),
            ],
        )
        .unwrap();
        assert_eq!(t.sample_nearest(0.25, 0.25).r, 1.0);
        assert_eq!(t.sample_nearest(0.75, 0.25).g, 1.0);
        assert_eq!(t.sample_nearest(0.25, 0.75).b, 1.0);
        assert_eq!(t.sample_nearest(1.5, 1.5), ColorRgba::white());
    }
}
