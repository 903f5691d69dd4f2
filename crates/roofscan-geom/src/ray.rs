//! Pick rays and ray/polygon intersection.

use roofscan_math::{Dir3, Point3, Tolerance, Vec3};

use crate::polygon::{is_degenerate, point_in_polygon};

/// A ray in 3D space defined by origin and direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3,
    /// Unit direction of the ray.
    pub direction: Dir3,
}

impl Ray {
    /// Create a new ray from origin and direction.
    ///
    /// The direction will be normalized. A zero-length or non-finite
    /// direction falls back to straight down (-Y), the direction of a
    /// top-down pick.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        let direction = if Tolerance::DEFAULT.is_degenerate(&direction) {
            Dir3::new_unchecked(-Vec3::y())
        } else {
            Dir3::new_normalize(direction)
        };
        Self { origin, direction }
    }

    /// Ray from `origin` passing through `target`.
    pub fn through(origin: Point3, target: Point3) -> Self {
        Self::new(origin, target - origin)
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction.as_ref()
    }
}

/// Result of a ray intersection.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    /// Distance along the ray (the direction is unit length).
    pub t: f64,
    /// 3D intersection point.
    pub point: Point3,
}

/// Intersect a ray with the infinite plane through `origin` with `normal`.
///
/// Returns `None` if the ray is parallel to the plane or meets it at
/// `t <= 0` (at or behind the ray origin).
pub fn intersect_plane(ray: &Ray, origin: &Point3, normal: &Dir3) -> Option<RayHit> {
    let n = normal.as_ref();
    let denom = ray.direction.as_ref().dot(n);

    // Ray is parallel to plane
    if denom.abs() < 1e-12 {
        return None;
    }

    let t = (origin - ray.origin).dot(n) / denom;
    if !t.is_finite() || t <= 0.0 {
        return None;
    }

    Some(RayHit { t, point: ray.at(t) })
}

/// Intersect a ray with a bounded polygon.
///
/// The supporting plane passes through the first boundary vertex with the
/// given `normal`; the hit is kept only if it projects inside the loop.
/// Degenerate loops are never hit.
pub fn intersect_polygon(ray: &Ray, boundaries: &[Point3], normal: &Dir3) -> Option<RayHit> {
    if is_degenerate(boundaries) {
        return None;
    }
    let hit = intersect_plane(ray, &boundaries[0], normal)?;
    if point_in_polygon(&hit.point, boundaries, normal) {
        Some(hit)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roofscan_math::up;

    fn roof_square(height: f64) -> Vec<Point3> {
        vec![
            Point3::new(-1.0, height, -1.0),
            Point3::new(-1.0, height, 1.0),
            Point3::new(1.0, height, 1.0),
            Point3::new(1.0, height, -1.0),
        ]
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        let p = ray.at(5.0);
        assert!((p.x - 5.0).abs() < 1e-12);
        assert!(p.y.abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_direction_points_down() {
        let ray = Ray::new(Point3::origin(), Vec3::zeros());
        assert!((ray.direction.y + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ray_plane_perpendicular() {
        let ray = Ray::new(Point3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        let hit = intersect_plane(&ray, &Point3::origin(), &up()).unwrap();
        assert!((hit.t - 5.0).abs() < 1e-10);
        assert!(hit.point.y.abs() < 1e-10);
    }

    #[test]
    fn test_ray_plane_parallel() {
        let ray = Ray::new(Point3::new(0.0, 5.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(intersect_plane(&ray, &Point3::origin(), &up()).is_none());
    }

    #[test]
    fn test_ray_plane_behind() {
        let ray = Ray::new(Point3::new(0.0, -5.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        assert!(intersect_plane(&ray, &Point3::origin(), &up()).is_none());
    }

    #[test]
    fn test_ray_plane_at_origin_rejected() {
        let ray = Ray::new(Point3::origin(), Vec3::new(0.0, -1.0, 0.0));
        assert!(intersect_plane(&ray, &Point3::origin(), &up()).is_none());
    }

    #[test]
    fn test_ray_plane_angled() {
        let ray = Ray::new(Point3::new(0.0, 10.0, 0.0), Vec3::new(1.0, -1.0, 0.0));
        let hit = intersect_plane(&ray, &Point3::origin(), &up()).unwrap();
        let expected_t = 10.0 * 2.0_f64.sqrt();
        assert!((hit.t - expected_t).abs() < 1e-10);
    }

    #[test]
    fn test_ray_polygon_inside_and_outside() {
        let square = roof_square(3.0);
        let down = Ray::new(Point3::new(0.2, 10.0, 0.3), Vec3::new(0.0, -1.0, 0.0));
        let hit = intersect_polygon(&down, &square, &up()).unwrap();
        assert!((hit.t - 7.0).abs() < 1e-10);
        assert!((hit.point.x - 0.2).abs() < 1e-10);

        let miss = Ray::new(Point3::new(4.0, 10.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        assert!(intersect_polygon(&miss, &square, &up()).is_none());
    }

    #[test]
    fn test_ray_polygon_degenerate_never_hit() {
        let line = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let ray = Ray::through(Point3::new(1.0, 5.0, 0.0), Point3::new(1.0, 0.0, 0.0));
        assert!(intersect_polygon(&ray, &line, &up()).is_none());
    }
}
