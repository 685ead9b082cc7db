//! Mapping a committed selection into a source-space crop window.

use crate::geometry::{enforce_corners, rotate_point, CropWindow, Point, Size};
use crate::selection::SelectionGeometry;

/// The rotation applied to the source pixels, in degrees.
///
/// The UI angle direction is defined opposite to the image rotation
/// direction, so the image is rotated by the negated angle.
pub fn rotation_degrees(angle_radians: f64) -> f64 {
    -angle_radians.to_degrees()
}

/// Compute the crop window for a committed selection.
///
/// # Arguments
///
/// * `geom` - Committed selection geometry in display coordinates
/// * `zoom` - Display zoom factor the preview was scaled by
/// * `raw_size` - Dimensions of the raw (flip-applied, unzoomed) image
/// * `rotated_size` - Dimensions of the rotated raw image; equal to
///   `raw_size` when the angle is zero
///
/// # Behavior
///
/// With no rotation the two stored corners are simply canonicalized with
/// [`enforce_corners`] and used directly against the raw image: the
/// primary rectangle is drawn, and the raw image read, at the same
/// resolution, so no zoom inversion happens on this path (the detail crop
/// variant is [`invert_zoom`]).
///
/// With rotation, each display corner is expressed as an offset from the
/// display image's center, counter-rotated by the selection angle to line
/// it up with the rotated source canvas, then translated to the rotated
/// image's center (scaled by zoom to stay in the offsets' scale) and
/// rounded. The window is the axis-aligned hull of the four mapped points.
///
/// The result is not clamped; callers clamp against the image actually
/// being cropped.
pub fn compute_crop_window(
    geom: &SelectionGeometry,
    zoom: f64,
    raw_size: Size,
    rotated_size: Size,
) -> CropWindow {
    if geom.angle == 0.0 {
        return enforce_corners(&[geom.corner_a, geom.corner_b]);
    }

    let display_center = scaled_center(raw_size, zoom);
    let rotated_center = scaled_center(rotated_size, zoom);
    let origin = Point::default();

    let mapped = geom.display_corners.map(|corner| {
        let offset = corner.offset_from(display_center);
        rotate_point(offset, origin, -geom.angle)
            .translate(rotated_center)
            .round()
    });
    enforce_corners(&mapped)
}

/// Undo the display zoom on a crop window drawn over a zoomed preview.
///
/// Used by the detail crop, where the rectangle is drawn at display
/// resolution but the crop is taken from the unzoomed source. Floors the
/// upper-left and ceils the lower-right so the window never shrinks below
/// what the operator selected.
pub fn invert_zoom(window: CropWindow, zoom: f64) -> CropWindow {
    CropWindow::new(
        Point::new(
            (window.upper_left.x / zoom).floor(),
            (window.upper_left.y / zoom).floor(),
        ),
        Point::new(
            (window.lower_right.x / zoom).ceil(),
            (window.lower_right.y / zoom).ceil(),
        ),
    )
}

/// Rotation in degrees implied by a line drawn between two points, from
/// the slope of the line.
pub fn line_angle_degrees(a: Point, b: Point) -> f64 {
    let slope = (b.y - a.y) / (b.x - a.x);
    slope.atan().to_degrees()
}

fn scaled_center(size: Size, zoom: f64) -> Point {
    let c = size.center();
    Point::new(c.x * zoom, c.y * zoom)
}
