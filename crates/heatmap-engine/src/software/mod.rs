//! CPU reference backend.
//!
//! Executes the three passes pixel by pixel with the same f32 arithmetic as
//! the WGSL programs. It is the executable definition the GPU path is tested
//! against and a fallback for hosts without an adapter.
//!
//! Pixel conventions follow wgpu: row 0 is the top of a target, clip +Y is
//! up, and a pixel is covered when its center lies inside a primitive.

mod buffer;
mod colorize;
mod image;
mod points;
mod renderer;

pub use buffer::{AlphaBuffer, Frame, ImageTexture};
pub use colorize::{colorize, shade};
pub use image::composite_image;
pub use points::{point_alpha, rasterize_points};
pub use renderer::SoftwareRenderer;

use crate::coords::Vec2;

/// Clip-space position → framebuffer pixel coordinates (not rounded).
#[inline]
pub(crate) fn clip_to_pixel(clip: Vec2, width: u32, height: u32) -> Vec2 {
    Vec2::new(
        (clip.x + 1.0) * 0.5 * width as f32,
        (1.0 - clip.y) * 0.5 * height as f32,
    )
}

/// Center of pixel `(x, y)` in clip space.
#[inline]
pub(crate) fn pixel_center_to_clip(x: u32, y: u32, width: u32, height: u32) -> Vec2 {
    Vec2::new(
        (x as f32 + 0.5) / width as f32 * 2.0 - 1.0,
        1.0 - (y as f32 + 0.5) / height as f32 * 2.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_corners_land_on_framebuffer_corners() {
        assert_eq!(clip_to_pixel(Vec2::new(-1.0, 1.0), 8, 4), Vec2::new(0.0, 0.0));
        assert_eq!(clip_to_pixel(Vec2::new(1.0, -1.0), 8, 4), Vec2::new(8.0, 4.0));
    }

    #[test]
    fn pixel_center_round_trips() {
        let c = pixel_center_to_clip(3, 1, 8, 4);
        assert_eq!(clip_to_pixel(c, 8, 4), Vec2::new(3.5, 1.5));
    }
}
