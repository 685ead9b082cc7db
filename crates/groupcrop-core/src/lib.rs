//! Groupcrop Core - batch image cropping engine
//!
//! This crate provides the core logic for groupcrop: the rotatable
//! selection-rectangle model, the coordinate transform engine that maps an
//! on-screen selection back to source-image pixels, the raster operations
//! that realize those crops, and the resumable group queue that walks a
//! directory tree of images.
//!
//! Everything here is synchronous, single-threaded and free of interactive
//! I/O; the frontend crate owns event wiring, persistence and image
//! encoding.

pub mod geometry;
pub mod queue;
pub mod raster;
pub mod selection;
pub mod transform;

pub use geometry::{enforce_corners, rotate_point, CropWindow, Point, Size};
pub use queue::{Group, GroupQueue, GroupView, GroupingMode, QueueError, ScanError};
pub use raster::RgbBuffer;
pub use selection::{ResizeAxis, SelectionGeometry, SelectionRectangle, SelectionState};
pub use transform::{compute_crop_window, invert_zoom, rotation_degrees};
