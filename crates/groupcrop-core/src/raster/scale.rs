//! Horizontal flip and nearest-neighbor display zoom.

use super::RgbBuffer;

/// Mirror the image left to right.
pub fn flip_horizontal(image: &RgbBuffer) -> RgbBuffer {
    let mut output = vec![0u8; image.pixels.len()];
    for y in 0..image.height {
        for x in 0..image.width {
            let src = image.pixel_index(x, y);
            let dst = image.pixel_index(image.width - 1 - x, y);
            output[dst..dst + 3].copy_from_slice(&image.pixels[src..src + 3]);
        }
    }
    RgbBuffer::new(image.width, image.height, output)
}

/// Uniformly scale the image by `factor` with nearest-neighbor sampling.
///
/// Display-only: the preview is zoomed so the operator can draw precisely,
/// while the stored resolution never changes. A factor of 1 is a clone
/// fast path. Output dimensions are rounded and never below 1x1.
pub fn zoom_nearest(image: &RgbBuffer, factor: f64) -> RgbBuffer {
    if factor == 1.0 {
        return image.clone();
    }

    let out_w = ((image.width as f64 * factor).round() as u32).max(1);
    let out_h = ((image.height as f64 * factor).round() as u32).max(1);
    let mut output = RgbBuffer::blank(out_w, out_h);

    for y in 0..out_h {
        let src_y = ((y as f64 / factor) as u32).min(image.height - 1);
        for x in 0..out_w {
            let src_x = ((x as f64 / factor) as u32).min(image.width - 1);
            let src = image.pixel_index(src_x, src_y);
            let dst = output.pixel_index(x, y);
            output.pixels[dst..dst + 3].copy_from_slice(&image.pixels[src..src + 3]);
        }
    }
    output
}
