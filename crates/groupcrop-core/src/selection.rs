//! The rotatable selection rectangle drawn over the preview image.
//!
//! This is a pure input-driven model: pointer and key events arrive as
//! method calls and the rectangle tracks its corners, center and rotation
//! angle. It performs no drawing and no I/O.
//!
//! # State machine
//!
//! ```text
//! Empty --begin_drag--> Dragging --release--> Committed
//!                       (release with no drag resets to Empty)
//! Committed --rotate_begin--> Rotating --rotate_end--> Committed
//! ```
//!
//! In `Committed`, pointer motion repositions the rectangle instead of
//! resizing it, matching the click-to-move behavior of the original tool.
//!
//! # Corner ordering
//!
//! The stored corners are unordered: the first corner is wherever the drag
//! started, which may be any of the four rectangle corners. Consumers must
//! pass corners through [`enforce_corners`](crate::geometry::enforce_corners)
//! (directly or via [`SelectionGeometry`]) before using them as a crop box.

use crate::geometry::{rotate_point, Point};

/// Which corner pairs a discrete resize step applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAxis {
    /// Grow or shrink both dimensions symmetrically.
    Both,
    /// Grow or shrink the width only.
    Horizontal,
    /// Grow or shrink the height only.
    Vertical,
}

/// Explicit lifecycle state of the selection rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    /// No rectangle exists.
    #[default]
    Empty,
    /// The first corner is fixed; the second follows the pointer.
    Dragging,
    /// Both corners are fixed; the rectangle can be moved, resized and
    /// rotated.
    Committed,
    /// A rotation drag is in progress; only the angle changes.
    Rotating,
}

/// Committed selection geometry, ready for the transform engine.
///
/// A value snapshot taken at commit time so the transform engine stays
/// stateless. `corner_a`/`corner_b` are the stored (unrotated, unordered)
/// corners; `display_corners` are the four corners as drawn on screen,
/// rotated by `angle` around `center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionGeometry {
    pub corner_a: Point,
    pub corner_b: Point,
    pub display_corners: [Point; 4],
    pub center: Point,
    /// Total rotation angle in radians (UI sign convention).
    pub angle: f64,
}

/// A rotatable bounding box driven by pointer-like input events.
#[derive(Debug, Clone, Default)]
pub struct SelectionRectangle {
    state: SelectionState,
    corner_a: Option<Point>,
    corner_b: Option<Point>,
    center: Point,
    /// Angle accumulated over finished rotation sessions, radians.
    committed_angle: f64,
    /// In-progress rotation offset, merged into `committed_angle` on
    /// session end.
    angle_delta: f64,
    rotate_start_y: Option<f64>,
}

impl SelectionRectangle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// Total rotation angle: committed sessions plus the live delta.
    pub fn angle(&self) -> f64 {
        self.committed_angle + self.angle_delta
    }

    pub fn center(&self) -> Point {
        self.center
    }

    /// The stored corners, unordered. `None` until a drag has started.
    pub fn corners(&self) -> Option<(Point, Point)> {
        Some((self.corner_a?, self.corner_b?))
    }

    /// Start a drag. In `Empty` this fixes the first corner; on a committed
    /// rectangle a click repositions it to the clicked point instead.
    pub fn begin_drag(&mut self, p: Point) {
        match self.state {
            SelectionState::Empty => {
                self.corner_a = Some(p);
                self.state = SelectionState::Dragging;
            }
            SelectionState::Committed => self.reposition(p),
            SelectionState::Dragging | SelectionState::Rotating => {}
        }
    }

    /// Pointer motion. While dragging, the second corner follows the
    /// pointer; on a committed rectangle the motion repositions it.
    pub fn drag_to(&mut self, p: Point) {
        match self.state {
            SelectionState::Dragging => {
                self.corner_b = Some(p);
                self.recompute_center();
            }
            SelectionState::Committed => self.reposition(p),
            SelectionState::Empty | SelectionState::Rotating => {}
        }
    }

    /// End the drag. A click that never moved, or a drag that ended back
    /// on its start point, is disregarded and the rectangle returns to
    /// `Empty`; otherwise it commits.
    pub fn release(&mut self) {
        if self.state != SelectionState::Dragging {
            return;
        }
        if self.corner_b.is_none() || self.corner_b == self.corner_a {
            self.corner_a = None;
            self.corner_b = None;
            self.state = SelectionState::Empty;
        } else {
            self.state = SelectionState::Committed;
        }
    }

    /// Translate the rectangle so its center lands on `new_center`.
    ///
    /// Pure translation: corner offsets from the old center are preserved,
    /// so the size and the rotation angle are untouched.
    pub fn reposition(&mut self, new_center: Point) {
        let (Some(a), Some(b)) = (self.corner_a, self.corner_b) else {
            return;
        };
        let old = self.center;
        self.corner_a = Some(a.offset_from(old).translate(new_center));
        self.corner_b = Some(b.offset_from(old).translate(new_center));
        self.center = new_center;
    }

    /// Begin a rotation session at the given pointer y coordinate.
    pub fn rotate_begin(&mut self, y: f64) {
        if self.state == SelectionState::Committed {
            self.rotate_start_y = Some(y);
            self.state = SelectionState::Rotating;
        }
    }

    /// Update the in-progress rotation from the current pointer y.
    ///
    /// The delta is a linear proxy for angle rather than a trigonometric
    /// measurement: a drag across half the display height sweeps one
    /// radian. Stored corner coordinates never change during rotation.
    pub fn rotate_drag(&mut self, y: f64, display_height: f64) {
        let (SelectionState::Rotating, Some(start_y)) = (self.state, self.rotate_start_y) else {
            return;
        };
        self.angle_delta = (y - start_y) / (display_height / 2.0);
    }

    /// End the rotation session, folding the delta into the committed
    /// angle so the next session continues where this one left off.
    pub fn rotate_end(&mut self) {
        if self.state != SelectionState::Rotating {
            return;
        }
        self.committed_angle += self.angle_delta;
        self.angle_delta = 0.0;
        self.rotate_start_y = None;
        self.state = SelectionState::Committed;
    }

    /// Apply a discrete resize step of `delta_per_side` pixels to one or
    /// both corner pairs.
    ///
    /// Driven by wheel or key events, not pointer motion. The result is
    /// deliberately not clamped to image bounds; out-of-bounds selections
    /// are resolved at crop time.
    pub fn resize(&mut self, axis: ResizeAxis, delta_per_side: f64) {
        let (Some(mut a), Some(mut b)) = (self.corner_a, self.corner_b) else {
            return;
        };
        if axis != ResizeAxis::Vertical {
            a.x -= delta_per_side;
            b.x += delta_per_side;
        }
        if axis != ResizeAxis::Horizontal {
            a.y -= delta_per_side;
            b.y += delta_per_side;
        }
        self.corner_a = Some(a);
        self.corner_b = Some(b);
        self.recompute_center();
    }

    /// Discard the rectangle and all accumulated rotation.
    pub fn reset(&mut self) {
        *self = SelectionRectangle::new();
    }

    /// The four on-screen corners, rotated by the current angle around the
    /// center.
    pub fn display_corners(&self) -> Option<[Point; 4]> {
        let (a, b) = self.corners()?;
        let angle = self.angle();
        let raw = [
            a,
            Point::new(b.x, a.y),
            b,
            Point::new(a.x, b.y),
        ];
        Some(raw.map(|p| rotate_point(p, self.center, angle)))
    }

    /// Snapshot the committed geometry for the transform engine.
    ///
    /// Returns `None` unless the rectangle is committed (an in-flight drag
    /// or rotation is not a valid crop source).
    pub fn geometry(&self) -> Option<SelectionGeometry> {
        if self.state != SelectionState::Committed {
            return None;
        }
        let (corner_a, corner_b) = self.corners()?;
        Some(SelectionGeometry {
            corner_a,
            corner_b,
            display_corners: self.display_corners()?,
            center: self.center,
            angle: self.angle(),
        })
    }

    /// Center is the rounded midpoint of the stored corners.
    fn recompute_center(&mut self) {
        if let (Some(a), Some(b)) = (self.corner_a, self.corner_b) {
            self.center = Point::new(
                ((a.x + b.x) / 2.0).round(),
                ((a.y + b.y) / 2.0).round(),
            );
        }
    }
}
