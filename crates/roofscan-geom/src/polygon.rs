//! Planar polygon measurements on noisy 3D boundary loops.
//!
//! Boundaries come from sensor samples and are rarely exactly planar.
//! Every routine here fits the loop to the plane given by its Newell
//! normal and works on the projected 2D coordinates.

use roofscan_math::{up, Dir3, Point2, Point3, Tolerance, Vec3};

use crate::frame::{canonical_up, PlaneFrame};

/// Newell's vector for a closed loop.
///
/// Its direction is the loop normal (following the winding) and its
/// magnitude is twice the enclosed area for planar loops.
pub fn newell_vector(points: &[Point3]) -> Vec3 {
    let n = points.len();
    if n < 3 {
        return Vec3::zeros();
    }
    let mut acc = Vec3::zeros();
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        acc.x += (a.y - b.y) * (a.z + b.z);
        acc.y += (a.z - b.z) * (a.x + b.x);
        acc.z += (a.x - b.x) * (a.y + b.y);
    }
    acc
}

/// Whether the loop is too small or too thin to define a plane.
pub fn is_degenerate(points: &[Point3]) -> bool {
    points.len() < 3 || Tolerance::DEFAULT.is_degenerate(&newell_vector(points))
}

/// Unit normal of the loop by Newell's method, following the winding.
///
/// Degenerate loops (fewer than 3 vertices, collinear or coincident
/// points) get the world up direction; callers should treat such a
/// plane as low-confidence.
pub fn estimate_normal(points: &[Point3]) -> Dir3 {
    let newell = newell_vector(points);
    if points.len() < 3 || Tolerance::DEFAULT.is_degenerate(&newell) {
        return up();
    }
    Dir3::new_normalize(newell)
}

/// Normal of the loop's best-fit plane, flipped into the upper half-space.
///
/// This is the fixed reference against which signed areas are measured,
/// so it does not depend on the winding.
pub fn reference_normal(points: &[Point3]) -> Dir3 {
    canonical_up(&estimate_normal(points))
}

/// Average of the loop vertices.
pub fn centroid(points: &[Point3]) -> Point3 {
    if points.is_empty() {
        return Point3::origin();
    }
    let sum = points
        .iter()
        .fold(Vec3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / points.len() as f64)
}

/// Signed area of a 3D loop on its best-fit plane, in square meters.
///
/// The loop is projected onto the plane through its centroid with the
/// [`reference_normal`] and measured with the shoelace formula. The result
/// is positive for loops wound counter-clockwise around the upward
/// reference normal and negative for the reverse winding. Degenerate input
/// yields `0.0`.
pub fn polygon_area_3d(points: &[Point3]) -> f64 {
    if is_degenerate(points) {
        return 0.0;
    }
    let frame = PlaneFrame::from_normal(centroid(points), &reference_normal(points));
    let projected: Vec<Point2> = points.iter().map(|p| frame.project(p)).collect();
    shoelace(&projected)
}

/// Shoelace signed area of a 2D loop.
pub(crate) fn shoelace(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }
    area / 2.0
}

/// Test whether `point` lies inside the loop `boundaries` on the plane with `normal`.
///
/// Both the point and the loop are projected onto the plane's local 2D
/// basis, then an even-odd crossing test is applied. The point's offset
/// along the normal is ignored.
pub fn point_in_polygon(point: &Point3, boundaries: &[Point3], normal: &Dir3) -> bool {
    if boundaries.len() < 3 {
        return false;
    }
    let frame = PlaneFrame::from_normal(boundaries[0], normal);
    let loop_2d: Vec<Point2> = boundaries.iter().map(|p| frame.project(p)).collect();
    crossing_test(&frame.project(point), &loop_2d)
}

/// Even-odd ray crossing test in 2D.
fn crossing_test(point: &Point2, polygon: &[Point2]) -> bool {
    let n = polygon.len();
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[j];
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
