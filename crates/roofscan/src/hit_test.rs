//! Hit testing screen taps against stored planes.

use roofscan_geom::{intersect_polygon, Ray};
use serde::{Deserialize, Serialize};

use crate::mapper::{CoordinateMapper, HeuristicMapper, Viewport};
use crate::types::{ArPoint, PlaneId, RoofPlane, SensorAccuracy};

/// A ray hit on a specific plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaneHit {
    /// Plane that was hit.
    pub plane_id: PlaneId,
    /// Distance from the ray origin in meters.
    pub distance: f64,
    /// Hit point on the plane surface.
    pub point: ArPoint,
}

/// Intersect a ray with a plane's bounded surface.
///
/// Hits at or behind the ray origin and hits outside the boundary are
/// rejected, as are degenerate planes. The point carries the plane's
/// confidence.
pub fn ray_plane_intersect(ray: &Ray, plane: &RoofPlane) -> Option<ArPoint> {
    plane_hit(ray, plane).map(|hit| hit.point)
}

fn plane_hit(ray: &Ray, plane: &RoofPlane) -> Option<PlaneHit> {
    let hit = intersect_polygon(ray, &plane.positions(), &plane.unit_normal())?;
    Some(PlaneHit {
        plane_id: plane.id.clone(),
        distance: hit.t,
        point: ArPoint::from_position(&hit.point, plane.confidence, SensorAccuracy::Medium),
    })
}

/// Clearance kept between a lifted pick-ray origin and the highest vertex.
const CAMERA_CLEARANCE: f64 = 1.0;

/// All plane hits for a screen tap, nearest first.
///
/// A downward pick ray whose origin sits at or below the highest plane
/// vertex is moved back along itself until it starts above every plane,
/// so tall structures are never behind the camera. Distances are measured
/// from the moved origin.
pub fn hit_test_detailed<'a, M, I>(
    mapper: &M,
    x: f64,
    y: f64,
    viewport: &Viewport,
    planes: I,
) -> Vec<PlaneHit>
where
    M: CoordinateMapper + ?Sized,
    I: IntoIterator<Item = &'a RoofPlane>,
{
    let planes: Vec<&RoofPlane> = planes.into_iter().collect();
    let ray = above_planes(mapper.pick_ray(x, y, viewport), &planes);
    let mut hits: Vec<PlaneHit> = planes
        .iter()
        .filter_map(|p| plane_hit(&ray, p))
        .collect();
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

fn above_planes(ray: Ray, planes: &[&RoofPlane]) -> Ray {
    let ceiling = planes
        .iter()
        .flat_map(|p| p.boundaries.iter().map(|v| v.y))
        .filter(|y| y.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    let down = -ray.direction.y;
    if ray.origin.y > ceiling || down <= 0.0 {
        return ray;
    }
    let back = (ceiling + CAMERA_CLEARANCE - ray.origin.y) / down;
    Ray {
        origin: ray.at(-back),
        direction: ray.direction,
    }
}

/// Hit points for a screen tap, nearest first.
///
/// Never empty: when no plane is hit the mapper's ground estimate is
/// returned as the only element.
pub fn hit_test_with<'a, M, I>(
    mapper: &M,
    x: f64,
    y: f64,
    viewport: &Viewport,
    planes: I,
) -> Vec<ArPoint>
where
    M: CoordinateMapper + ?Sized,
    I: IntoIterator<Item = &'a RoofPlane>,
{
    let hits = hit_test_detailed(mapper, x, y, viewport, planes);
    if hits.is_empty() {
        return vec![mapper.screen_to_world(x, y, viewport)];
    }
    hits.into_iter().map(|h| h.point).collect()
}

/// Hit test with the default heuristic mapper.
pub fn perform_hit_test(
    screen_x: f64,
    screen_y: f64,
    screen_width: f64,
    screen_height: f64,
    planes: &[RoofPlane],
) -> Vec<ArPoint> {
    hit_test_with(
        &HeuristicMapper::default(),
        screen_x,
        screen_y,
        &Viewport::new(screen_width, screen_height),
        planes,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::ESTIMATE_CONFIDENCE;
    use crate::types::PlaneType;
    use approx::assert_relative_eq;
    use roofscan_math::{Point3, Vec3};

    /// Horizontal square centered on the origin at the given height.
    fn deck(height: f64, half: f64, id: &str, confidence: f64) -> RoofPlane {
        RoofPlane::from_boundaries(
            vec![
                ArPoint::new(-half, height, -half),
                ArPoint::new(-half, height, half),
                ArPoint::new(half, height, half),
                ArPoint::new(half, height, -half),
            ],
            PlaneType::Primary,
            confidence,
        )
        .with_id(id)
    }

    #[test]
    fn test_empty_planes_returns_fallback() {
        let hits = perform_hit_test(100.0, 100.0, 390.0, 844.0, &[]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].confidence, ESTIMATE_CONFIDENCE);
        assert_eq!(hits[0].y, 0.0);
    }

    #[test]
    fn test_hits_sorted_nearest_first() {
        let planes = vec![deck(2.0, 3.0, "low", 0.8), deck(5.0, 3.0, "high", 0.9)];
        let hits = hit_test_detailed(
            &HeuristicMapper::default(),
            195.0,
            422.0,
            &Viewport::default(),
            &planes,
        );
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].plane_id, "high");
        assert_relative_eq!(hits[0].distance, 5.0, epsilon = 1e-9);
        assert_relative_eq!(hits[0].point.y, 5.0, epsilon = 1e-9);
        assert_eq!(hits[0].point.confidence, 0.9);
        assert_eq!(hits[1].plane_id, "low");

        let points = perform_hit_test(195.0, 422.0, 390.0, 844.0, &planes);
        assert_eq!(points.len(), 2);
        assert_relative_eq!(points[1].y, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_planes_above_camera_height_are_hit() {
        let mapper = HeuristicMapper::default();
        let planes = vec![deck(15.0, 3.0, "tower", 0.9), deck(2.0, 3.0, "low", 0.8)];
        let hits = hit_test_detailed(&mapper, 195.0, 422.0, &Viewport::default(), &planes);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].plane_id, "tower");
        assert_relative_eq!(hits[0].point.y, 15.0, epsilon = 1e-9);
        assert_relative_eq!(hits[0].distance, CAMERA_CLEARANCE, epsilon = 1e-9);
        assert_relative_eq!(hits[1].distance, 13.0 + CAMERA_CLEARANCE, epsilon = 1e-9);
    }

    #[test]
    fn test_tap_outside_every_plane_falls_back() {
        let planes = vec![deck(2.0, 0.2, "small", 0.8)];
        let hits = perform_hit_test(0.0, 0.0, 390.0, 844.0, &planes);
        assert_eq!(hits.len(), 1);
        assert_relative_eq!(hits[0].x, -1.25);
        assert_eq!(hits[0].confidence, ESTIMATE_CONFIDENCE);
    }

    #[test]
    fn test_ray_plane_intersect_rejects_behind() {
        let plane = deck(2.0, 1.0, "p", 0.8);
        let up_ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vec3::y());
        assert!(ray_plane_intersect(&up_ray, &plane).is_some());
        let down_ray = Ray::new(Point3::new(0.0, 0.0, 0.0), -Vec3::y());
        assert!(ray_plane_intersect(&down_ray, &plane).is_none());
    }

    #[test]
    fn test_degenerate_plane_never_hit() {
        let mut plane = deck(2.0, 1.0, "p", 0.8);
        plane.boundaries.truncate(2);
        let ray = Ray::new(Point3::new(0.0, 10.0, 0.0), -Vec3::y());
        assert!(ray_plane_intersect(&ray, &plane).is_none());
    }
}
