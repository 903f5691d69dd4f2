//! Core data model: sensor points and roof planes.

use std::time::{SystemTime, UNIX_EPOCH};

use roofscan_geom::{canonical_up, estimate_normal, is_degenerate, polygon_area_3d};
use roofscan_math::{wrap_degrees, Dir3, Point3, Tolerance, Vec3};
use serde::{Deserialize, Serialize};

/// Identifier of a plane in the store.
pub type PlaneId = String;

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Accuracy class reported by the sensor for a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SensorAccuracy {
    /// Sensor-fused, well-tracked sample.
    High,
    /// Usable sample, or an engine-side estimate.
    #[default]
    Medium,
    /// Noisy or poorly tracked sample.
    Low,
}

/// A 3D sample in the world frame (meters, right-handed, +Y up).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArPoint {
    /// X coordinate (east).
    pub x: f64,
    /// Y coordinate (height).
    pub y: f64,
    /// Z coordinate (south).
    pub z: f64,
    /// Trust in the sample, 0.0 to 1.0.
    pub confidence: f64,
    /// Capture time in milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: u64,
    /// Accuracy class.
    #[serde(default)]
    pub sensor_accuracy: SensorAccuracy,
}

impl ArPoint {
    /// A fully trusted, high-accuracy sample taken now.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            confidence: 1.0,
            timestamp: now_millis(),
            sensor_accuracy: SensorAccuracy::High,
        }
    }

    /// A sample at `position` with the given trust, taken now.
    pub fn from_position(position: &Point3, confidence: f64, accuracy: SensorAccuracy) -> Self {
        Self {
            x: position.x,
            y: position.y,
            z: position.z,
            confidence,
            timestamp: now_millis(),
            sensor_accuracy: accuracy,
        }
    }

    /// Position as a nalgebra point.
    pub fn position(&self) -> Point3 {
        Point3::new(self.x, self.y, self.z)
    }
}

/// Classification of a roof surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaneType {
    /// Main roof face.
    #[default]
    Primary,
    /// Smaller secondary face.
    Secondary,
    /// Dormer face.
    Dormer,
    /// Hip face.
    Hip,
    /// Chimney surface.
    Chimney,
    /// Anything else detected.
    Other,
    /// User-drawn surface.
    Custom,
}

/// A detected or confirmed roof surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoofPlane {
    /// Unique id; empty means "assign one on insertion".
    #[serde(default)]
    pub id: PlaneId,
    /// Boundary loop (at least 3 vertices, simple polygon, in winding order).
    pub boundaries: Vec<ArPoint>,
    /// Unit surface normal.
    pub normal: Vec3,
    /// Degrees from horizontal, 0 (flat) to 90 (vertical).
    pub pitch_angle: f64,
    /// Compass heading of the downslope direction in degrees, `[0, 360)`.
    pub azimuth_angle: f64,
    /// True surface area in m².
    pub area: f64,
    /// Footprint area seen from above, `area * cos(pitch)`.
    pub projected_area: f64,
    /// Surface classification.
    #[serde(rename = "type", default)]
    pub plane_type: PlaneType,
    /// Aggregate trust in the measurement, 0.0 to 1.0.
    pub confidence: f64,
    /// Free-form material tag, not interpreted by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
}

impl RoofPlane {
    /// Build a plane from its boundary, deriving orientation and areas.
    ///
    /// The normal comes from Newell's method flipped to face upward, so
    /// the derived values do not depend on the boundary winding.
    pub fn from_boundaries(boundaries: Vec<ArPoint>, plane_type: PlaneType, confidence: f64) -> Self {
        let positions: Vec<Point3> = boundaries.iter().map(ArPoint::position).collect();
        let normal = canonical_up(&estimate_normal(&positions));
        let area = polygon_area_3d(&positions).abs();
        let pitch_angle = pitch_from_normal(&normal);
        Self {
            id: PlaneId::new(),
            boundaries,
            normal: normal.into_inner(),
            pitch_angle,
            azimuth_angle: azimuth_from_normal(&normal),
            area,
            projected_area: area * pitch_angle.to_radians().cos(),
            plane_type,
            confidence,
            material: None,
        }
    }

    /// Set the id.
    pub fn with_id(mut self, id: impl Into<PlaneId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the material tag.
    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    /// Boundary positions.
    pub fn positions(&self) -> Vec<Point3> {
        self.boundaries.iter().map(ArPoint::position).collect()
    }

    /// Unit normal for intersection work.
    ///
    /// Uses the stored normal when it is usable, otherwise re-estimates
    /// from the boundary.
    pub fn unit_normal(&self) -> Dir3 {
        if Tolerance::DEFAULT.is_degenerate(&self.normal) {
            estimate_normal(&self.positions())
        } else {
            Dir3::new_normalize(self.normal)
        }
    }

    /// Whether the boundary defines no plane.
    pub fn is_degenerate(&self) -> bool {
        is_degenerate(&self.positions())
    }
}

/// Pitch in degrees of a surface with the given normal.
pub fn pitch_from_normal(normal: &Dir3) -> f64 {
    normal.y.abs().clamp(0.0, 1.0).acos().to_degrees()
}

/// Compass heading (north = -Z, east = +X) of the downslope direction of
/// an upward-facing surface normal. Flat surfaces report 0.
pub fn azimuth_from_normal(normal: &Dir3) -> f64 {
    let n = canonical_up(normal);
    if n.x.hypot(n.z) < 1e-9 {
        return 0.0;
    }
    wrap_degrees(n.x.atan2(-n.z).to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// 4 m x 3 m face rising toward the north at the given pitch.
    fn south_facing(pitch_deg: f64) -> Vec<ArPoint> {
        let (s, c) = pitch_deg.to_radians().sin_cos();
        vec![
            ArPoint::new(0.0, 0.0, 0.0),
            ArPoint::new(4.0, 0.0, 0.0),
            ArPoint::new(4.0, 3.0 * s, -3.0 * c),
            ArPoint::new(0.0, 3.0 * s, -3.0 * c),
        ]
    }

    #[test]
    fn test_from_boundaries_flat() {
        let plane = RoofPlane::from_boundaries(
            vec![
                ArPoint::new(0.0, 2.0, 0.0),
                ArPoint::new(0.0, 2.0, 2.0),
                ArPoint::new(5.0, 2.0, 2.0),
                ArPoint::new(5.0, 2.0, 0.0),
            ],
            PlaneType::Primary,
            0.9,
        );
        assert_relative_eq!(plane.area, 10.0, epsilon = 1e-9);
        assert_relative_eq!(plane.projected_area, 10.0, epsilon = 1e-9);
        assert_relative_eq!(plane.pitch_angle, 0.0, epsilon = 1e-9);
        assert_eq!(plane.azimuth_angle, 0.0);
        assert!(plane.id.is_empty());
    }

    #[test]
    fn test_from_boundaries_pitched() {
        let plane = RoofPlane::from_boundaries(south_facing(30.0), PlaneType::Primary, 0.8);
        assert_relative_eq!(plane.area, 12.0, epsilon = 1e-9);
        assert_relative_eq!(plane.pitch_angle, 30.0, epsilon = 1e-9);
        assert_relative_eq!(plane.projected_area, 12.0 * 30f64.to_radians().cos(), epsilon = 1e-9);
        // Rises toward north, so it drains to the south
        assert_relative_eq!(plane.azimuth_angle, 180.0, epsilon = 1e-9);
        assert!(plane.normal.y > 0.0);
        assert!(plane.projected_area <= plane.area);
    }

    #[test]
    fn test_from_boundaries_ignores_winding() {
        let mut reversed = south_facing(25.0);
        reversed.reverse();
        let a = RoofPlane::from_boundaries(south_facing(25.0), PlaneType::Hip, 0.7);
        let b = RoofPlane::from_boundaries(reversed, PlaneType::Hip, 0.7);
        assert_relative_eq!(a.area, b.area, epsilon = 1e-9);
        assert_relative_eq!(a.azimuth_angle, b.azimuth_angle, epsilon = 1e-9);
        assert_relative_eq!((a.normal - b.normal).norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_azimuth_compass_headings() {
        let east = Dir3::new_normalize(Vec3::new(1.0, 1.0, 0.0));
        assert_relative_eq!(azimuth_from_normal(&east), 90.0, epsilon = 1e-9);
        let north = Dir3::new_normalize(Vec3::new(0.0, 1.0, -1.0));
        assert_relative_eq!(azimuth_from_normal(&north), 0.0, epsilon = 1e-9);
        let west = Dir3::new_normalize(Vec3::new(-1.0, 1.0, 0.0));
        assert_relative_eq!(azimuth_from_normal(&west), 270.0, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_plane_defaults() {
        let plane = RoofPlane::from_boundaries(
            vec![ArPoint::new(0.0, 0.0, 0.0), ArPoint::new(1.0, 0.0, 0.0)],
            PlaneType::Other,
            0.4,
        );
        assert!(plane.is_degenerate());
        assert_eq!(plane.area, 0.0);
        assert_relative_eq!(plane.normal.y, 1.0);
    }

    #[test]
    fn test_unit_normal_falls_back_when_zero() {
        let mut plane = RoofPlane::from_boundaries(south_facing(0.0), PlaneType::Primary, 0.9);
        plane.normal = Vec3::zeros();
        assert!(plane.unit_normal().y.abs() > 0.99);
    }

    #[test]
    fn test_serde_field_names() {
        let plane = RoofPlane::from_boundaries(south_facing(20.0), PlaneType::Dormer, 0.6)
            .with_id("p1")
            .with_material("slate");
        let json = serde_json::to_value(&plane).unwrap();
        assert_eq!(json["type"], "dormer");
        assert!(json.get("pitchAngle").is_some());
        assert!(json.get("projectedArea").is_some());
        assert_eq!(json["boundaries"][0]["sensorAccuracy"], "high");
        let back: RoofPlane = serde_json::from_value(json).unwrap();
        assert_eq!(back.id, "p1");
        assert_eq!(back.plane_type, PlaneType::Dormer);
        assert_eq!(back.material.as_deref(), Some("slate"));
    }
}
