//! Planar geometry primitives shared by the selection rectangle and the
//! coordinate transform engine.
//!
//! # Coordinate System
//!
//! All points live in screen coordinates: origin at the top-left corner,
//! x growing to the right, y growing downward. Rotation helpers use the
//! same convention, which flips the usual sign of the sine terms.

use serde::{Deserialize, Serialize};

/// A point in display or image space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Offset of `self` from `center`.
    pub fn offset_from(self, center: Point) -> Point {
        Point::new(self.x - center.x, self.y - center.y)
    }

    /// Translate by the given offset.
    pub fn translate(self, offset: Point) -> Point {
        Point::new(self.x + offset.x, self.y + offset.y)
    }

    /// Round both components to the nearest integer.
    pub fn round(self) -> Point {
        Point::new(self.x.round(), self.y.round())
    }
}

/// Pixel dimensions of an image or canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Center of a canvas with these dimensions.
    pub fn center(self) -> Point {
        Point::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }
}

/// An axis-aligned crop window in pixel coordinates.
///
/// `upper_left` is componentwise less than or equal to `lower_right`
/// whenever the window was produced by [`enforce_corners`]. A window where
/// the two corners coincide on either axis is degenerate (zero area).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CropWindow {
    pub upper_left: Point,
    pub lower_right: Point,
}

impl CropWindow {
    pub fn new(upper_left: Point, lower_right: Point) -> Self {
        Self {
            upper_left,
            lower_right,
        }
    }

    pub fn width(&self) -> f64 {
        self.lower_right.x - self.upper_left.x
    }

    pub fn height(&self) -> f64 {
        self.lower_right.y - self.upper_left.y
    }

    /// True if the window encloses no pixels.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Clamp the window to the given image bounds.
    ///
    /// Coordinates below zero are raised to zero and coordinates past an
    /// image dimension are lowered to that dimension. This never fails: a
    /// window partly outside the image silently loses the outside portion,
    /// and a window fully outside degenerates to zero area.
    pub fn clamp(&self, bounds: Size) -> CropWindow {
        let w = bounds.width as f64;
        let h = bounds.height as f64;
        CropWindow::new(
            Point::new(
                self.upper_left.x.clamp(0.0, w),
                self.upper_left.y.clamp(0.0, h),
            ),
            Point::new(
                self.lower_right.x.clamp(0.0, w),
                self.lower_right.y.clamp(0.0, h),
            ),
        )
    }
}

/// Collapse a set of points into a canonical (upper-left, lower-right) pair.
///
/// Returns the componentwise minimum and maximum across all given points.
/// This is the only sanctioned way to obtain an axis-aligned box from the
/// possibly unsorted selection corners, or from rotated-rectangle corners
/// after they have been mapped into rotated-image space.
///
/// The result is invariant under permutation of `points`, and an
/// already-sorted axis-aligned pair passes through unchanged. `points`
/// must be non-empty.
pub fn enforce_corners(points: &[Point]) -> CropWindow {
    debug_assert!(!points.is_empty(), "enforce_corners on empty point set");
    let mut upper_left = Point::new(f64::INFINITY, f64::INFINITY);
    let mut lower_right = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        upper_left.x = upper_left.x.min(p.x);
        upper_left.y = upper_left.y.min(p.y);
        lower_right.x = lower_right.x.max(p.x);
        lower_right.y = lower_right.y.max(p.y);
    }
    CropWindow::new(upper_left, lower_right)
}

/// Rotate a point around `center` by `angle_radians`.
///
/// Screen-coordinate rotation (origin at the upper-left corner, y axis
/// pointing down):
///
/// ```text
/// x' =  x cos(a) + y sin(a)
/// y' = -x sin(a) + y cos(a)
/// ```
pub fn rotate_point(p: Point, center: Point, angle_radians: f64) -> Point {
    let x = p.x - center.x;
    let y = p.y - center.y;
    let (sin, cos) = angle_radians.sin_cos();
    Point::new(x * cos + y * sin + center.x, -x * sin + y * cos + center.y)
}
