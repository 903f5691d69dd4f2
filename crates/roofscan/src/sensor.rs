//! Sensor events pushed into a session.

use serde::{Deserialize, Serialize};

use crate::tracking::TrackingState;
use crate::types::{ArPoint, PlaneId, RoofPlane};

/// One observation from the tracking subsystem.
///
/// Serialized with a `kind` tag, e.g.
/// `{"kind": "tracking", "state": "limited"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SensorEvent {
    /// A candidate surface, before validation.
    PlaneCandidate {
        /// Candidate plane; an empty id gets one assigned.
        plane: RoofPlane,
    },
    /// The sensor retracted a surface it reported earlier.
    PlaneRemoved {
        /// Id of the retracted plane.
        id: PlaneId,
    },
    /// A raw point observation.
    Point {
        /// Observed point.
        point: ArPoint,
    },
    /// The tracking quality changed.
    Tracking {
        /// New tracking state.
        state: TrackingState,
    },
}
