//! Local 2D coordinate frames on planes.

use roofscan_math::{Dir3, Point2, Point3, Vec3};

/// An orthonormal frame lying in a plane.
///
/// Parameterization: `P(u, v) = origin + u * x_dir + v * y_dir`, with
/// `x_dir × y_dir = normal`, so shoelace areas computed in `(u, v)` are
/// positive for loops wound counter-clockwise around `normal`.
#[derive(Debug, Clone)]
pub struct PlaneFrame {
    /// Origin point on the plane.
    pub origin: Point3,
    /// Unit vector along the u direction.
    pub x_dir: Dir3,
    /// Unit vector along the v direction.
    pub y_dir: Dir3,
    /// Unit normal (x_dir × y_dir).
    pub normal: Dir3,
}

impl PlaneFrame {
    /// Create a frame from an origin and normal. X/Y directions are chosen arbitrarily
    /// but deterministically from the normal.
    pub fn from_normal(origin: Point3, normal: &Dir3) -> Self {
        let n = normal.as_ref();
        let arbitrary = if n.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
        let x = Dir3::new_normalize(arbitrary.cross(n));
        let y = Dir3::new_normalize(n.cross(x.as_ref()));
        Self {
            origin,
            x_dir: x,
            y_dir: y,
            normal: *normal,
        }
    }

    /// Project a 3D point onto this frame's (u, v) coordinates.
    pub fn project(&self, p: &Point3) -> Point2 {
        let d = p - self.origin;
        Point2::new(d.dot(self.x_dir.as_ref()), d.dot(self.y_dir.as_ref()))
    }

    /// Signed distance from a point to the plane of this frame.
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        (p - self.origin).dot(self.normal.as_ref())
    }
}

/// Flip a direction so it points into the upper half-space.
///
/// Vertical directions (zero Y) break the tie on +X, then +Z, so the
/// result is the same for a direction and its negation.
pub fn canonical_up(dir: &Dir3) -> Dir3 {
    const EPS: f64 = 1e-12;
    let d = dir.as_ref();
    let keep = if d.y.abs() > EPS {
        d.y > 0.0
    } else if d.x.abs() > EPS {
        d.x > 0.0
    } else {
        d.z >= 0.0
    };
    if keep {
        *dir
    } else {
        -*dir
    }
}
