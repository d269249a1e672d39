use crate::config::{IMAGE_ALPHA_CUTOFF, ShaderConstants};
use crate::coords::{Rect, TransformVariant, ViewportParams, ViewportTransform};

use super::{Frame, ImageTexture, pixel_center_to_clip};

/// Image pass: draws `texture` placed at `rect` (model space) into `frame`.
///
/// Texels with alpha below [`IMAGE_ALPHA_CUTOFF`] are skipped; all others
/// overwrite the target unchanged.
pub fn composite_image(
    frame: &mut Frame,
    texture: &ImageTexture,
    rect: Rect,
    params: &ViewportParams,
    constants: &ShaderConstants,
) {
    if rect.is_empty() || !params.is_valid() {
        return;
    }
    let transform = ViewportTransform::new(constants);
    let (w, h) = (frame.width(), frame.height());

    for y in 0..h {
        for x in 0..w {
            let clip = pixel_center_to_clip(x, y, w, h);
            let model = transform.unproject(clip, params, TransformVariant::Image);
            let Some(uv) = rect.to_uv(model) else { continue };

            let texel = texture.sample_nearest(uv.x, uv.y);
            if texel.a < IMAGE_ALPHA_CUTOFF {
                continue;
            }
            frame.set(x, y, texel);
        }
    }
}
