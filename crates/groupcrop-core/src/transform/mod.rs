//! The coordinate transform engine.
//!
//! Reconciles a selection rectangle drawn on the on-screen preview with
//! pixel coordinates in the source image. The preview is built from the
//! source by applying, in this fixed order:
//!
//! 1. optional horizontal flip of the raw pixels,
//! 2. uniform nearest-neighbor scale by the zoom factor (display only),
//! 3. for a committed non-zero rotation, an area-correct rotation of the
//!    flipped-but-unzoomed raw pixels by the negated angle in degrees,
//!    expanding the canvas to bound the rotated content.
//!
//! Everything here is stateless: a committed [`SelectionGeometry`] goes in,
//! an axis-aligned [`CropWindow`] in source space comes out. Clamping to
//! image bounds is a separate, explicit step
//! ([`CropWindow::clamp`](crate::geometry::CropWindow::clamp)).
//!
//! [`SelectionGeometry`]: crate::selection::SelectionGeometry
//! [`CropWindow`]: crate::geometry::CropWindow

mod window;

pub use window::{compute_crop_window, invert_zoom, line_angle_degrees, rotation_degrees};
