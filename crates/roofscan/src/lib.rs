#![warn(missing_docs)]

//! Roof plane detection engine.
//!
//! Manages a live spatial-sensing session: accumulates detected roof
//! surfaces from sensor events, validates and merges them, maps screen
//! taps into world space, hit-tests taps against stored planes and
//! reports session quality.
//!
//! # Architecture
//!
//! - [`Session`] - tracking state machine and the only writer of the store
//! - [`PlaneStore`] - ordered plane collection with add/remove/merge/reset
//! - [`validate_plane`] - admission thresholds
//! - [`CoordinateMapper`] - screen-to-world projection ([`HeuristicMapper`])
//! - [`perform_hit_test`] - tap-to-plane ray casting
//! - [`QualityMetrics`] - stability and density scores
//!
//! Geometry lives in [`roofscan_geom`].
//!
//! # Example
//!
//! ```
//! use roofscan::{ArPoint, DetectionConfig, PlaneType, RoofPlane, Session, StaticProbe};
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
//! # rt.block_on(async {
//! let session = Session::new(StaticProbe::supported());
//! session.start_detection(DetectionConfig::default()).await;
//!
//! let plane = RoofPlane::from_boundaries(
//!     vec![
//!         ArPoint::new(0.0, 3.0, 0.0),
//!         ArPoint::new(0.0, 3.0, 4.0),
//!         ArPoint::new(5.0, 3.0, 4.0),
//!         ArPoint::new(5.0, 3.0, 0.0),
//!     ],
//!     PlaneType::Primary,
//!     0.9,
//! );
//! let id = session.add_plane(plane).unwrap();
//! assert!((session.get_plane(&id).unwrap().area - 20.0).abs() < 1e-9);
//! # });
//! ```

pub mod config;
pub mod error;
pub mod hit_test;
pub mod mapper;
pub mod metrics;
pub mod probe;
pub mod sensor;
pub mod session;
pub mod store;
pub mod tracking;
pub mod types;
pub mod validator;

pub use config::{DetectionConfig, Platform, Sensitivity};
pub use error::{ConfigError, EngineError, ProbeError, Result, ValidationError};
pub use hit_test::{
    hit_test_detailed, hit_test_with, perform_hit_test, ray_plane_intersect, PlaneHit,
};
pub use mapper::{
    convert_screen_to_world, CoordinateMapper, HeuristicMapper, Viewport, ESTIMATE_CONFIDENCE,
};
pub use metrics::QualityMetrics;
pub use probe::{CapabilityProbe, StaticProbe};
pub use sensor::SensorEvent;
pub use session::{Session, SessionSnapshot, CAPABILITY_LOST};
pub use store::{PlaneStore, RoofSummary, ValidationStatus};
pub use tracking::TrackingState;
pub use types::{ArPoint, PlaneId, PlaneType, RoofPlane, SensorAccuracy};
pub use validator::{is_valid, validate_plane};
