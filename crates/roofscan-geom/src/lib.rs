#![warn(missing_docs)]

//! Geometry kernel for roof plane detection.
//!
//! Everything here is a pure, total function: degenerate input produces a
//! well-defined degenerate result (zero area, default up normal, no hit)
//! instead of an error, so the engine can treat geometry results as values.
//!
//! # Architecture
//!
//! - [`PlaneFrame`] - local 2D basis on a plane, used for projection
//! - [`polygon`] - Newell normals, projected shoelace area, containment
//! - [`hull`] - convex hull used as the polygon-union approximation
//! - [`Ray`] - pick rays and ray/polygon intersection
//!
//! # Example
//!
//! ```
//! use roofscan_geom::polygon::polygon_area_3d;
//! use roofscan_math::Point3;
//!
//! let square = [
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(0.0, 0.0, 2.0),
//!     Point3::new(2.0, 0.0, 2.0),
//!     Point3::new(2.0, 0.0, 0.0),
//! ];
//! assert!((polygon_area_3d(&square).abs() - 4.0).abs() < 1e-12);
//! ```

mod frame;
pub mod hull;
pub mod polygon;
mod ray;

pub use frame::{canonical_up, PlaneFrame};
pub use hull::{convex_hull_2d, union_approximate, union_approximate_indices};
pub use polygon::{
    centroid, estimate_normal, is_degenerate, newell_vector, point_in_polygon, polygon_area_3d,
    reference_normal,
};
pub use ray::{intersect_plane, intersect_polygon, Ray, RayHit};
