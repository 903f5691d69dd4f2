//! Error types for the detection engine.

use std::time::Duration;

use thiserror::Error;

use crate::tracking::TrackingState;

/// Reasons a candidate plane fails validation.
///
/// Advisory by default: the store records the failure and still inserts
/// the plane unless strict validation is configured.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Fewer than three boundary vertices.
    #[error("plane has {count} boundary vertices, at least 3 are required")]
    InsufficientVertices {
        /// Number of vertices supplied.
        count: usize,
    },

    /// Measured surface area is below the configured minimum.
    #[error("plane area {area:.3} m² is below the minimum of {min:.3} m²")]
    AreaTooSmall {
        /// Area computed from the boundary.
        area: f64,
        /// Effective minimum area after sensitivity scaling.
        min: f64,
    },

    /// Confidence is below the configured minimum.
    #[error("plane confidence {confidence:.2} is below the minimum of {min:.2}")]
    LowConfidence {
        /// Confidence carried by the candidate.
        confidence: f64,
        /// Configured minimum confidence.
        min: f64,
    },

    /// Boundary is collinear or collapsed and defines no plane.
    #[error("plane boundary is degenerate (collinear or coincident vertices)")]
    DegenerateGeometry,
}

/// Errors from the capability probe. Never surfaced from `start_detection`;
/// the message is recorded in the session's `error` field instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbeError {
    /// The platform reported that plane detection is unavailable.
    #[error("plane detection is not supported on {0}")]
    Unsupported(String),

    /// The probe itself failed.
    #[error("capability probe failed: {0}")]
    Failed(String),

    /// The probe did not answer in time.
    #[error("capability probe timed out after {0:?}")]
    Timeout(Duration),
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A field is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// TOML could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration could not be rendered as TOML.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from session and store operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Plane rejected under strict validation.
    #[error("plane rejected: {0}")]
    Validation(#[from] ValidationError),

    /// Fewer than two of the requested planes exist in the store.
    #[error("merging requires at least two existing planes, found {resolved}")]
    MergeRequiresMultiplePlanes {
        /// Number of requested ids that resolved to stored planes.
        resolved: usize,
    },

    /// Tracking state change not allowed by the state machine.
    #[error("invalid tracking transition from {from} to {to}")]
    InvalidTransition {
        /// Current state.
        from: TrackingState,
        /// Requested state.
        to: TrackingState,
    },

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Capability probe failure, as recorded in the session error field.
    #[error(transparent)]
    CapabilityProbeFailure(#[from] ProbeError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
