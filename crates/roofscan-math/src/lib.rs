#![warn(missing_docs)]

//! Math types for the roofscan plane detection engine.
//!
//! Thin wrappers around nalgebra providing the types used by the
//! geometry kernel and the session engine: points, vectors, unit
//! directions, tolerance constants and a few angle helpers.
//!
//! World frame: right-handed, meters, +Y up, -Z is "north" (forward).

use nalgebra::{Unit, Vector3};

/// A point in 3D world space (meters).
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A point in a plane's local 2D coordinates.
pub type Point2 = nalgebra::Point2<f64>;

/// World up direction.
pub fn up() -> Dir3 {
    Dir3::new_unchecked(Vec3::y())
}

/// Tolerance for deciding whether a vector defines a direction.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Magnitude below which a Newell vector counts as degenerate.
    pub normal_epsilon: f64,
}

impl Tolerance {
    /// Default tolerance (1e-10 normal magnitude).
    pub const DEFAULT: Self = Self {
        normal_epsilon: 1e-10,
    };

    /// Check if a vector is too short to define a direction.
    pub fn is_degenerate(&self, v: &Vec3) -> bool {
        !v.norm().is_finite() || v.norm() < self.normal_epsilon
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Wrap an angle in degrees into `[0, 360)`.
pub fn wrap_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Angle between two directions, in degrees, ignoring orientation
/// (a direction and its negation are 0° apart).
pub fn unsigned_angle_deg(a: &Dir3, b: &Dir3) -> f64 {
    a.as_ref().dot(b.as_ref()).abs().clamp(0.0, 1.0).acos().to_degrees()
}
