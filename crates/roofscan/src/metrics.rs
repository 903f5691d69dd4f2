//! Session quality metrics.

use serde::{Deserialize, Serialize};

use crate::config::DetectionConfig;
use crate::store::PlaneStore;
use crate::tracking::TrackingState;

/// Weight of tracking stability in the overall score.
pub const STABILITY_WEIGHT: f64 = 0.6;
/// Weight of point density in the overall score.
pub const DENSITY_WEIGHT: f64 = 0.4;

/// Quality figures derived from the session state. All scores are in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    /// `0.6 * tracking_stability + 0.4 * point_density`.
    pub overall_score: f64,
    /// Derived from the tracking state.
    pub tracking_stability: f64,
    /// Boundary vertices relative to the configured target, saturating at 1.
    pub point_density: f64,
    /// Number of stored planes.
    pub plane_count: usize,
    /// Sum of plane areas in m².
    pub total_area: f64,
    /// Mean plane confidence, 0 when there are no planes.
    pub average_confidence: f64,
    /// Planes that failed validation or were never checked.
    pub unvalidated_plane_count: usize,
    /// Raw point observations currently retained.
    pub observed_point_count: usize,
}

impl QualityMetrics {
    /// Compute metrics from the current session state.
    pub fn compute(
        tracking: TrackingState,
        store: &PlaneStore,
        observed_point_count: usize,
        config: &DetectionConfig,
    ) -> Self {
        let tracking_stability = tracking.stability().clamp(0.0, 1.0);
        let target = config.target_vertex_count.max(1) as f64;
        let point_density = (store.vertex_count() as f64 / target).clamp(0.0, 1.0);
        let overall_score = (STABILITY_WEIGHT * tracking_stability + DENSITY_WEIGHT * point_density)
            .clamp(0.0, 1.0);

        let plane_count = store.len();
        let average_confidence = if plane_count == 0 {
            0.0
        } else {
            store.iter().map(|p| p.confidence).sum::<f64>() / plane_count as f64
        };

        Self {
            overall_score,
            tracking_stability,
            point_density,
            plane_count,
            total_area: store.iter().map(|p| p.area).sum(),
            average_confidence,
            unvalidated_plane_count: store.unvalidated_count(),
            observed_point_count,
        }
    }

    /// Metrics of a session with no planes and no observations.
    pub fn baseline(tracking: TrackingState) -> Self {
        Self::compute(tracking, &PlaneStore::new(), 0, &DetectionConfig::default())
    }
}
