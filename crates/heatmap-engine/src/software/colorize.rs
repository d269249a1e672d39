use crate::config::{RampOverflow, ShaderConstants};
use crate::paint::{ColorRamp, ColorRgba};

use super::{AlphaBuffer, Frame};

/// Colorizer fragment: coverage → output color, or `None` to discard.
///
/// Discards when `alpha <= 0`, `alpha > 1` or `alpha` is NaN. Kept colors are
/// scaled by `opacity` with the resulting alpha floored at 0.
pub fn shade(
    alpha: f32,
    ramp: &ColorRamp,
    opacity: f32,
    constants: &ShaderConstants,
    overflow: RampOverflow,
) -> Option<ColorRgba> {
    if !(alpha > 0.0 && alpha <= 1.0) {
        return None;
    }
    let mut color = ramp.lookup(alpha, constants.max_colors, overflow).scale(opacity);
    color.a = color.a.max(0.0);
    Some(color)
}

/// Colorize pass: reads `buffer`, blends shaded pixels over `frame`.
///
/// Output row `y` reads coverage row `height - 1 - y`; see
/// `render::colorize` for the full-screen quad this mirrors.
pub fn colorize(
    buffer: &AlphaBuffer,
    frame: &mut Frame,
    ramp: &ColorRamp,
    opacity: f32,
    constants: &ShaderConstants,
    overflow: RampOverflow,
) {
    if buffer.width() != frame.width() || buffer.height() != frame.height() {
        log::warn!(
            "colorize skipped: coverage {}x{} does not match frame {}x{}",
            buffer.width(),
            buffer.height(),
            frame.width(),
            frame.height()
        );
        return;
    }

    let h = frame.height();
    for y in 0..h {
        for x in 0..frame.width() {
            let a = buffer.get(x, h - 1 - y);
            if let Some(src) = shade(a, ramp, opacity, constants, overflow) {
                let dst = frame.get(x, y);
                frame.set(x, y, src.over(dst));
            }
        }
    }
}
