//! Extracting a crop window from a pixel buffer.

use super::RgbBuffer;
use crate::geometry::CropWindow;

/// Cut the clamped `window` out of `image`.
///
/// The window is clamped to the image bounds first, so a selection partly
/// outside the image silently loses the outside portion. A window fully
/// outside the image produces an empty buffer, not an error; whether to
/// persist it is the caller's decision.
pub fn crop(image: &RgbBuffer, window: &CropWindow) -> RgbBuffer {
    let clamped = window.clamp(image.size());

    let left = clamped.upper_left.x.round() as u32;
    let top = clamped.upper_left.y.round() as u32;
    let right = clamped.lower_right.x.round() as u32;
    let bottom = clamped.lower_right.y.round() as u32;

    let out_w = right.saturating_sub(left);
    let out_h = bottom.saturating_sub(top);
    if out_w == 0 || out_h == 0 {
        return RgbBuffer::blank(0, 0);
    }

    let mut output = RgbBuffer::blank(out_w, out_h);
    let row_bytes = (out_w * 3) as usize;
    for y in 0..out_h {
        let src = image.pixel_index(left, top + y);
        let dst = output.pixel_index(0, y);
        output.pixels[dst..dst + row_bytes].copy_from_slice(&image.pixels[src..src + row_bytes]);
    }
    output
}
