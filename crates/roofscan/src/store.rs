//! Plane store: the lifecycle authority for detected roof planes.
//!
//! Planes are kept in insertion order. Callers only ever receive copies;
//! the store is mutated through the session so every change passes
//! through validation bookkeeping and triggers a metrics recompute.

use log::{debug, info, warn};
use roofscan_geom::{canonical_up, centroid, union_approximate_indices, PlaneFrame};
use roofscan_math::{unsigned_angle_deg, up, wrap_degrees, Dir3, Point3, Tolerance, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::DetectionConfig;
use crate::error::{EngineError, Result, ValidationError};
use crate::types::{azimuth_from_normal, pitch_from_normal, ArPoint, PlaneId, RoofPlane};
use crate::validator::validate_plane;

/// Outcome of validation recorded alongside each stored plane.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationStatus {
    /// Passed every check.
    Valid,
    /// Failed a check but was inserted anyway (permissive mode).
    Invalid(ValidationError),
    /// Inserted without running the validator.
    Unchecked,
}

impl ValidationStatus {
    fn from_result(result: std::result::Result<(), ValidationError>) -> Self {
        match result {
            Ok(()) => ValidationStatus::Valid,
            Err(e) => ValidationStatus::Invalid(e),
        }
    }
}

#[derive(Debug, Clone)]
struct StoredPlane {
    plane: RoofPlane,
    status: ValidationStatus,
}

/// Aggregate figures over every stored plane.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoofSummary {
    /// Number of planes.
    pub plane_count: usize,
    /// Sum of true surface areas in m².
    pub total_area: f64,
    /// Sum of footprint areas in m².
    pub total_projected_area: f64,
    /// Area-weighted mean pitch in degrees.
    pub average_pitch: f64,
    /// Id of the largest plane.
    pub primary_plane_id: Option<PlaneId>,
}

/// Ordered collection of roof planes keyed by id.
#[derive(Debug, Clone, Default)]
pub struct PlaneStore {
    planes: Vec<StoredPlane>,
}

impl PlaneStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored planes.
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    /// Whether the store holds no planes.
    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    /// Iterate over stored planes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &RoofPlane> {
        self.planes.iter().map(|s| &s.plane)
    }

    /// Copies of all planes in insertion order.
    pub fn planes(&self) -> Vec<RoofPlane> {
        self.iter().cloned().collect()
    }

    /// Copy of the plane with `id`.
    pub fn get_plane(&self, id: &str) -> Option<RoofPlane> {
        self.position(id).map(|i| self.planes[i].plane.clone())
    }

    /// Whether a plane with `id` exists.
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Recorded validation outcome for `id`.
    pub fn validation_status(&self, id: &str) -> Option<&ValidationStatus> {
        self.position(id).map(|i| &self.planes[i].status)
    }

    /// Whether `id` exists and passed validation.
    pub fn is_validated(&self, id: &str) -> bool {
        matches!(self.validation_status(id), Some(ValidationStatus::Valid))
    }

    /// Planes that failed validation or were never checked.
    pub fn unvalidated_count(&self) -> usize {
        self.planes
            .iter()
            .filter(|s| s.status != ValidationStatus::Valid)
            .count()
    }

    /// Total number of boundary vertices across all planes.
    pub fn vertex_count(&self) -> usize {
        self.iter().map(|p| p.boundaries.len()).sum()
    }

    /// Validate and insert a plane, returning its id.
    ///
    /// An empty id is replaced with a fresh UUID. Invalid planes are
    /// inserted and flagged unless `config.strict_validation` is set, in
    /// which case they are rejected and the store is unchanged. Inserting
    /// an id that already exists replaces that plane in place.
    pub fn add_plane(
        &mut self,
        mut plane: RoofPlane,
        config: &DetectionConfig,
    ) -> std::result::Result<PlaneId, ValidationError> {
        let verdict = validate_plane(&plane, config);
        if let Err(e) = &verdict {
            if config.strict_validation {
                warn!("Rejected plane {:?}: {}", plane.id, e);
                return Err(e.clone());
            }
            warn!("Accepting invalid plane {:?}: {}", plane.id, e);
        }
        if plane.id.is_empty() {
            plane.id = Uuid::new_v4().to_string();
        }
        Ok(self.upsert(plane, ValidationStatus::from_result(verdict)))
    }

    /// Insert a plane without validation. It counts as unvalidated.
    pub fn insert_unvalidated(&mut self, mut plane: RoofPlane) -> PlaneId {
        if plane.id.is_empty() {
            plane.id = Uuid::new_v4().to_string();
        }
        self.upsert(plane, ValidationStatus::Unchecked)
    }

    fn upsert(&mut self, plane: RoofPlane, status: ValidationStatus) -> PlaneId {
        let id = plane.id.clone();
        let stored = StoredPlane { plane, status };
        match self.position(&id) {
            Some(i) => {
                debug!("Replacing plane {}", id);
                self.planes[i] = stored;
            }
            None => {
                debug!("Added plane {}", id);
                self.planes.push(stored);
            }
        }
        id
    }

    /// Remove a plane. Returns `false` if it was not present.
    pub fn remove_plane(&mut self, id: &str) -> bool {
        match self.position(id) {
            Some(i) => {
                self.planes.remove(i);
                debug!("Removed plane {}", id);
                true
            }
            None => false,
        }
    }

    /// Remove every plane.
    pub fn reset(&mut self) {
        if !self.planes.is_empty() {
            info!("Cleared {} planes", self.planes.len());
        }
        self.planes.clear();
    }

    /// Merge the planes named by `ids` into one new plane.
    ///
    /// Missing and repeated ids are skipped. If fewer than two planes
    /// remain, nothing changes and `MergeRequiresMultiplePlanes` is
    /// returned. The merged boundary is the convex hull of all constituent
    /// vertices; area and projected area are sums; normal, pitch and
    /// azimuth are area-weighted averages; confidence is the minimum.
    /// Type and material come from the largest constituent. The merged
    /// plane replaces its constituents at the end of the order and is
    /// re-validated for bookkeeping only.
    pub fn merge_planes<S: AsRef<str>>(
        &mut self,
        ids: &[S],
        config: &DetectionConfig,
    ) -> Result<PlaneId> {
        let mut resolved: Vec<usize> = Vec::with_capacity(ids.len());
        for id in ids {
            match self.position(id.as_ref()) {
                Some(i) if !resolved.contains(&i) => resolved.push(i),
                Some(_) => {}
                None => debug!("Merge skipping missing plane {}", id.as_ref()),
            }
        }
        if resolved.len() < 2 {
            return Err(EngineError::MergeRequiresMultiplePlanes {
                resolved: resolved.len(),
            });
        }

        let parts: Vec<&RoofPlane> = resolved.iter().map(|&i| &self.planes[i].plane).collect();
        let mut merged = merge_geometry(&parts);
        merged.id = format!("merged_{}", Uuid::new_v4().simple());

        let merged_from: Vec<PlaneId> = parts.iter().map(|p| p.id.clone()).collect();
        info!(
            "Merged {} planes into {} ({:.2} m²)",
            merged_from.len(),
            merged.id,
            merged.area
        );

        self.planes.retain(|s| !merged_from.contains(&s.plane.id));
        let status = ValidationStatus::from_result(validate_plane(&merged, config));
        Ok(self.upsert(merged, status))
    }

    /// Pairs of planes close enough in orientation and offset to be merged.
    ///
    /// Two planes qualify when their normals are within the effective merge
    /// angle and the second plane's centroid lies within the effective merge
    /// distance of the first plane's supporting plane.
    pub fn merge_candidates(&self, config: &DetectionConfig) -> Vec<(PlaneId, PlaneId)> {
        let max_angle = config.effective_merge_angle();
        let max_offset = config.effective_merge_distance();
        let frames: Vec<(PlaneFrame, Point3)> = self
            .iter()
            .map(|p| {
                let c = centroid(&p.positions());
                (PlaneFrame::from_normal(c, &canonical_up(&p.unit_normal())), c)
            })
            .collect();

        let mut pairs = Vec::new();
        for i in 0..frames.len() {
            for j in (i + 1)..frames.len() {
                let (fi, _) = &frames[i];
                let (fj, cj) = &frames[j];
                let offset = fi.signed_distance(cj).abs();
                if unsigned_angle_deg(&fi.normal, &fj.normal) <= max_angle && offset <= max_offset {
                    pairs.push((self.planes[i].plane.id.clone(), self.planes[j].plane.id.clone()));
                }
            }
        }
        pairs
    }

    /// Aggregate figures over every plane.
    pub fn summary(&self) -> RoofSummary {
        let total_area: f64 = self.iter().map(|p| p.area).sum();
        let total_projected_area = self.iter().map(|p| p.projected_area).sum();
        let average_pitch = if total_area > 0.0 {
            self.iter().map(|p| p.pitch_angle * p.area).sum::<f64>() / total_area
        } else if self.is_empty() {
            0.0
        } else {
            self.iter().map(|p| p.pitch_angle).sum::<f64>() / self.len() as f64
        };
        let primary_plane_id = self
            .iter()
            .fold(None::<&RoofPlane>, |best, p| match best {
                Some(b) if b.area >= p.area => Some(b),
                _ => Some(p),
            })
            .map(|p| p.id.clone());

        RoofSummary {
            plane_count: self.len(),
            total_area,
            total_projected_area,
            average_pitch,
            primary_plane_id,
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.planes.iter().position(|s| s.plane.id == id)
    }
}

/// Combine planes into one (without an id).
fn merge_geometry(parts: &[&RoofPlane]) -> RoofPlane {
    let loops: Vec<Vec<Point3>> = parts.iter().map(|p| p.positions()).collect();
    let vertices: Vec<ArPoint> = parts.iter().flat_map(|p| p.boundaries.iter().copied()).collect();
    let largest = parts
        .iter()
        .fold(parts[0], |best, &p| if p.area > best.area { p } else { best });
    let mut boundaries: Vec<ArPoint> = union_approximate_indices(&loops)
        .into_iter()
        .map(|i| vertices[i])
        .collect();
    if boundaries.len() < 3 {
        boundaries = largest.boundaries.clone();
    }

    let area: f64 = parts.iter().map(|p| p.area).sum();
    let projected_area: f64 = parts.iter().map(|p| p.projected_area).sum();

    // Degenerate total area falls back to equal weights
    let weights: Vec<f64> = if area.is_finite() && area > 0.0 {
        parts.iter().map(|p| p.area.max(0.0)).collect()
    } else {
        vec![1.0; parts.len()]
    };
    let weight_sum: f64 = weights.iter().sum();

    let summed = parts
        .iter()
        .zip(&weights)
        .fold(Vec3::zeros(), |acc, (p, w)| {
            acc + canonical_up(&p.unit_normal()).into_inner() * *w
        });
    let normal = if Tolerance::DEFAULT.is_degenerate(&summed) {
        up()
    } else {
        Dir3::new_normalize(summed)
    };

    let pitch_angle = parts
        .iter()
        .zip(&weights)
        .map(|(p, w)| p.pitch_angle * w)
        .sum::<f64>()
        / weight_sum;

    let (sin, cos) = parts
        .iter()
        .zip(&weights)
        .fold((0.0, 0.0), |(s, c), (p, w)| {
            let (ps, pc) = p.azimuth_angle.to_radians().sin_cos();
            (s + ps * w, c + pc * w)
        });
    let azimuth_angle = if sin.hypot(cos) > 1e-9 {
        wrap_degrees(sin.atan2(cos).to_degrees())
    } else {
        azimuth_from_normal(&normal)
    };

    let confidence = parts
        .iter()
        .map(|p| p.confidence)
        .fold(f64::INFINITY, f64::min);

    RoofPlane {
        id: PlaneId::new(),
        boundaries,
        normal: normal.into_inner(),
        pitch_angle: if pitch_angle.is_finite() {
            pitch_angle
        } else {
            pitch_from_normal(&normal)
        },
        azimuth_angle,
        area,
        projected_area,
        plane_type: largest.plane_type,
        confidence,
        material: largest.material.clone(),
    }
}
