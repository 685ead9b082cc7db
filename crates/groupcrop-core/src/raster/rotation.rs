//! Area-expanding image rotation.
//!
//! Rotation uses inverse mapping: for each pixel of the output canvas the
//! contributing source position is computed and sampled with bilinear
//! interpolation. The canvas is expanded to bound the rotated content, so
//! no source pixel is ever clipped; uncovered canvas corners stay black.

use super::RgbBuffer;

/// Compute the bounding canvas for an image rotated by `angle_degrees`.
///
/// # Example
///
/// ```ignore
/// // 90-degree rotation swaps dimensions
/// let (w, h) = compute_rotated_bounds(100, 50, 90.0);
/// assert_eq!((w, h), (50, 100));
/// ```
pub fn compute_rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    let normalized = angle_degrees.rem_euclid(360.0);

    // Exact multiples of 90 keep pixel-perfect dimensions
    if near(normalized, 0.0) || near(normalized, 180.0) || near(normalized, 360.0) {
        return (width, height);
    }
    if near(normalized, 90.0) || near(normalized, 270.0) {
        return (height, width);
    }

    let (sin, cos) = angle_degrees.to_radians().sin_cos();
    let (sin, cos) = (sin.abs(), cos.abs());
    let w = width as f64;
    let h = height as f64;
    let new_w = (w * cos + h * sin).round() as u32;
    let new_h = (w * sin + h * cos).round() as u32;
    (new_w.max(1), new_h.max(1))
}

/// Rotate the image around its center by `angle_degrees`, positive being
/// counter-clockwise, onto an expanded canvas.
pub fn rotate(image: &RgbBuffer, angle_degrees: f64) -> RgbBuffer {
    if angle_degrees.abs() < 0.001 {
        return image.clone();
    }

    let (dst_w, dst_h) = compute_rotated_bounds(image.width, image.height, angle_degrees);
    let mut output = RgbBuffer::blank(dst_w, dst_h);

    // Inverse transform: negate so a positive angle reads visually
    // counter-clockwise
    let (sin, cos) = (-angle_degrees.to_radians()).sin_cos();
    let src_cx = image.width as f64 / 2.0;
    let src_cy = image.height as f64 / 2.0;
    let dst_cx = dst_w as f64 / 2.0;
    let dst_cy = dst_h as f64 / 2.0;

    for dst_y in 0..dst_h {
        let dy = dst_y as f64 - dst_cy;
        for dst_x in 0..dst_w {
            let dx = dst_x as f64 - dst_cx;
            let src_x = dx * cos - dy * sin + src_cx;
            let src_y = dx * sin + dy * cos + src_cy;

            let pixel = sample_bilinear(image, src_x, src_y);
            let dst = output.pixel_index(dst_x, dst_y);
            output.pixels[dst..dst + 3].copy_from_slice(&pixel);
        }
    }
    output
}

/// Sample a source position with bilinear interpolation over the four
/// surrounding pixels. Out-of-bounds positions sample black.
fn sample_bilinear(image: &RgbBuffer, x: f64, y: f64) -> [u8; 3] {
    let (w, h) = (image.width as i64, image.height as i64);
    if x < 0.0 || y < 0.0 || x >= (w - 1) as f64 || y >= (h - 1) as f64 {
        return [0, 0, 0];
    }

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let fetch = |px: u32, py: u32| -> [f64; 3] {
        let idx = image.pixel_index(px, py);
        [
            image.pixels[idx] as f64,
            image.pixels[idx + 1] as f64,
            image.pixels[idx + 2] as f64,
        ]
    };
    let p00 = fetch(x0, y0);
    let p10 = fetch(x0 + 1, y0);
    let p01 = fetch(x0, y0 + 1);
    let p11 = fetch(x0 + 1, y0 + 1);

    let mut result = [0u8; 3];
    for (i, out) in result.iter_mut().enumerate() {
        let v = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
        *out = v.clamp(0.0, 255.0).round() as u8;
    }
    result
}

fn near(value: f64, target: f64) -> bool {
    (value - target).abs() < 0.001
}
