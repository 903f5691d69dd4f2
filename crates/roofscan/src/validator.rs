//! Plane validation.

use roofscan_geom::{is_degenerate, polygon_area_3d};
use roofscan_math::Point3;

use crate::config::DetectionConfig;
use crate::error::ValidationError;
use crate::types::{ArPoint, RoofPlane};

/// Check a candidate plane against the configured thresholds.
///
/// Checks run in a fixed order and the first failure wins: vertex count,
/// measured area, confidence, then degeneracy. The area is recomputed from
/// the boundary rather than trusted from `plane.area`.
pub fn validate_plane(plane: &RoofPlane, config: &DetectionConfig) -> Result<(), ValidationError> {
    let count = plane.boundaries.len();
    if count < 3 {
        return Err(ValidationError::InsufficientVertices { count });
    }

    let positions: Vec<Point3> = plane.boundaries.iter().map(ArPoint::position).collect();
    let area = polygon_area_3d(&positions).abs();
    let min = config.effective_min_area();
    if area.is_nan() || area < min {
        return Err(ValidationError::AreaTooSmall { area, min });
    }

    if plane.confidence.is_nan() || plane.confidence < config.min_confidence {
        return Err(ValidationError::LowConfidence {
            confidence: plane.confidence,
            min: config.min_confidence,
        });
    }

    if is_degenerate(&positions) {
        return Err(ValidationError::DegenerateGeometry);
    }

    Ok(())
}

/// Convenience wrapper returning only the verdict.
pub fn is_valid(plane: &RoofPlane, config: &DetectionConfig) -> bool {
    validate_plane(plane, config).is_ok()
}
