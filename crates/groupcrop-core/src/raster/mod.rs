//! Pixel-level transform operations.
//!
//! Operations over packed RGB8 buffers: horizontal flip, nearest-neighbor
//! display zoom, area-expanding rotation and crop-window extraction. These
//! are the raster counterparts of the coordinate math in
//! [`transform`](crate::transform): the preview shown to the operator is
//! `flip -> zoom` (plus `rotate` once a rotation is committed), and the
//! final crop is cut from the flip-applied, unzoomed source.

mod crop;
mod rotation;
mod scale;

pub use crop::crop;
pub use rotation::{compute_rotated_bounds, rotate};
pub use scale::{flip_horizontal, zoom_nearest};

use crate::geometry::Size;

/// A packed RGB8 image buffer, 3 bytes per pixel in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbBuffer {
    /// Wrap existing pixel data. `pixels` must hold exactly
    /// `width * height * 3` bytes.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), (width as usize) * (height as usize) * 3);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// An all-black buffer of the given dimensions.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; (width as usize) * (height as usize) * 3],
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// True if the buffer holds no pixels (a degenerate crop result).
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub(crate) fn pixel_index(&self, x: u32, y: u32) -> usize {
        ((y * self.width + x) * 3) as usize
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::RgbBuffer;

    /// A test image where each pixel has a unique value based on position.
    pub fn position_image(width: u32, height: u32) -> RgbBuffer {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = ((y * width + x) % 256) as u8;
                pixels.push(v);
                pixels.push(v);
                pixels.push(v);
            }
        }
        RgbBuffer::new(width, height, pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_buffer() {
        let buf = RgbBuffer::blank(4, 3);
        assert_eq!(buf.pixels.len(), 36);
        assert!(!buf.is_empty());
        assert!(buf.pixels.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_empty_buffer() {
        let buf = RgbBuffer::blank(0, 5);
        assert!(buf.is_empty());
        assert!(buf.pixels.is_empty());
    }
}
