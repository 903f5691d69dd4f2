//! Detection session: the single entry point that mutates the plane store.
//!
//! A [`Session`] is a cheap, clonable handle. All state lives behind one
//! mutex, and every operation takes the lock once, applies its change,
//! recomputes quality metrics and releases it, so observers only ever see
//! whole transitions. The lock is never held across an await point.
//!
//! Starting a session awaits the capability probe. Each start or stop
//! bumps a generation counter; a probe answer that comes back for an older
//! generation (because the session was stopped meanwhile) is discarded.

use std::collections::VecDeque;
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::config::DetectionConfig;
use crate::error::{EngineError, ProbeError, Result, ValidationError};
use crate::hit_test::{hit_test_detailed, hit_test_with, PlaneHit};
use crate::mapper::{CoordinateMapper, HeuristicMapper, Viewport};
use crate::metrics::QualityMetrics;
use crate::probe::CapabilityProbe;
use crate::sensor::SensorEvent;
use crate::store::{PlaneStore, RoofSummary, ValidationStatus};
use crate::tracking::TrackingState;
use crate::types::{ArPoint, PlaneId, RoofPlane};
use crate::validator::validate_plane;

/// Error recorded when tracking drops to `notAvailable` mid-session.
pub const CAPABILITY_LOST: &str = "tracking capability lost";

/// Read-only copy of the session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Stored planes in insertion order.
    pub planes: Vec<RoofPlane>,
    /// Current tracking state.
    pub tracking_state: TrackingState,
    /// Whether a session is running.
    pub is_active: bool,
    /// Whether the last capability probe reported support.
    pub is_supported: bool,
    /// Last failure, if any.
    pub error: Option<String>,
    /// Quality metrics at the time of the snapshot.
    pub quality_metrics: QualityMetrics,
}

impl SessionSnapshot {
    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

struct SessionCore {
    config: DetectionConfig,
    store: PlaneStore,
    tracking: TrackingState,
    is_active: bool,
    is_supported: bool,
    error: Option<String>,
    metrics: QualityMetrics,
    observed: VecDeque<ArPoint>,
    generation: u64,
    viewport: Viewport,
}

impl SessionCore {
    fn new(config: DetectionConfig) -> Self {
        Self {
            metrics: QualityMetrics::baseline(TrackingState::NotAvailable),
            config,
            store: PlaneStore::new(),
            tracking: TrackingState::NotAvailable,
            is_active: false,
            is_supported: false,
            error: None,
            observed: VecDeque::new(),
            generation: 0,
            viewport: Viewport::default(),
        }
    }

    fn recompute(&mut self) {
        self.metrics =
            QualityMetrics::compute(self.tracking, &self.store, self.observed.len(), &self.config);
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            planes: self.store.planes(),
            tracking_state: self.tracking,
            is_active: self.is_active,
            is_supported: self.is_supported,
            error: self.error.clone(),
            quality_metrics: self.metrics.clone(),
        }
    }

    fn deactivate(&mut self) {
        self.generation += 1;
        self.is_active = false;
        self.tracking = TrackingState::NotAvailable;
    }

    fn probe_failed(&mut self, err: ProbeError) {
        warn!("Capability probe failed: {}", err);
        self.deactivate();
        self.is_supported = false;
        self.error = Some(EngineError::CapabilityProbeFailure(err).to_string());
    }

    fn update_tracking(&mut self, to: TrackingState) -> Result<()> {
        let from = self.tracking;
        if from == to {
            return Ok(());
        }
        if to == TrackingState::NotAvailable {
            warn!("Tracking lost ({} -> {})", from, to);
            self.deactivate();
            self.error = Some(CAPABILITY_LOST.to_string());
            return Ok(());
        }
        // Startup transitions belong to the capability probe
        if !from.is_live() || to == TrackingState::Initializing || !from.can_transition_to(to) {
            return Err(EngineError::InvalidTransition { from, to });
        }
        info!("Tracking {} -> {}", from, to);
        self.tracking = to;
        Ok(())
    }

    fn observe(&mut self, point: ArPoint) {
        self.observed.push_back(point);
        while self.observed.len() > self.config.max_observed_points {
            self.observed.pop_front();
        }
    }

    /// Apply one sensor event. `Ok(false)` means it was dropped.
    fn ingest(&mut self, event: SensorEvent) -> Result<bool> {
        if !self.is_active {
            debug!("Dropping sensor event while inactive");
            return Ok(false);
        }
        match event {
            SensorEvent::PlaneCandidate { plane } => {
                self.store.add_plane(plane, &self.config)?;
            }
            SensorEvent::PlaneRemoved { id } => {
                if !self.store.remove_plane(&id) {
                    debug!("Sensor retracted unknown plane {}", id);
                }
            }
            SensorEvent::Point { point } => self.observe(point),
            SensorEvent::Tracking { state } => self.update_tracking(state)?,
        }
        Ok(true)
    }
}

/// Handle to a plane detection session.
///
/// `P` answers whether the platform can detect planes; `M` turns screen
/// taps into world points and pick rays.
pub struct Session<P, M = HeuristicMapper> {
    core: Arc<Mutex<SessionCore>>,
    probe: Arc<P>,
    mapper: Arc<M>,
}

impl<P, M> Clone for Session<P, M> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            probe: Arc::clone(&self.probe),
            mapper: Arc::clone(&self.mapper),
        }
    }
}

impl<P: CapabilityProbe + 'static> Session<P> {
    /// Create an inactive session using the heuristic screen mapper.
    pub fn new(probe: P) -> Self {
        Self::with_mapper(probe, HeuristicMapper::default())
    }
}

impl<P: CapabilityProbe + 'static, M: CoordinateMapper> Session<P, M> {
    /// Create an inactive session with a custom screen mapper.
    pub fn with_mapper(probe: P, mapper: M) -> Self {
        Self {
            core: Arc::new(Mutex::new(SessionCore::new(DetectionConfig::default()))),
            probe: Arc::new(probe),
            mapper: Arc::new(mapper),
        }
    }

    /// Start detecting with `config`.
    ///
    /// Does nothing if the session is already active. Never fails: an
    /// invalid configuration, an unsupported platform, a probe error, a
    /// panicking probe or a probe timeout all leave the session in
    /// `notAvailable` with `error` set. If the session is stopped while the
    /// probe is pending, the probe's answer is discarded.
    pub async fn start_detection(&self, config: DetectionConfig) {
        let (generation, platform, timeout) = {
            let mut core = self.core.lock();
            if core.is_active {
                debug!("Detection already active");
                return;
            }
            if let Err(e) = config.validate() {
                warn!("Not starting detection: {}", e);
                core.error = Some(EngineError::from(e).to_string());
                return;
            }
            core.generation += 1;
            core.config = config;
            core.is_active = true;
            core.tracking = TrackingState::Initializing;
            core.error = None;
            core.recompute();
            (
                core.generation,
                core.config.platform.clone(),
                core.config.probe_timeout(),
            )
        };

        info!("Starting plane detection on {}", platform);
        let probe = Arc::clone(&self.probe);
        let probe_platform = platform.clone();
        let mut handle =
            tokio::spawn(async move { probe.probe_support(&probe_platform).await });
        let outcome = match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(join_error)) => Err(ProbeError::Failed(join_error.to_string())),
            Err(_) => {
                handle.abort();
                Err(ProbeError::Timeout(timeout))
            }
        };

        let mut core = self.core.lock();
        if core.generation != generation {
            info!("Discarding capability probe result for a stopped session");
            return;
        }
        match outcome {
            Ok(true) => {
                info!("Plane detection supported on {}, tracking", platform);
                core.is_supported = true;
                core.tracking = TrackingState::Tracking;
            }
            Ok(false) => core.probe_failed(ProbeError::Unsupported(platform.to_string())),
            Err(e) => core.probe_failed(e),
        }
        core.recompute();
    }

    /// Stop detecting. Planes are kept; a pending start is cancelled.
    pub fn stop_detection(&self) {
        let mut core = self.core.lock();
        if core.is_active {
            info!("Stopping plane detection");
        }
        core.deactivate();
        core.recompute();
    }

    /// Apply a tracking state change reported by the sensor.
    ///
    /// Dropping to `notAvailable` is always allowed and ends the session
    /// with [`CAPABILITY_LOST`] recorded. Other moves must follow the state
    /// machine and start from a live tracking state.
    pub fn update_tracking(&self, state: TrackingState) -> Result<()> {
        let mut core = self.core.lock();
        let result = core.update_tracking(state);
        core.recompute();
        result
    }

    /// Validate and store a plane.
    ///
    /// Returns the plane's id. Fails only under strict validation.
    pub fn add_plane(&self, plane: RoofPlane) -> Result<PlaneId> {
        let mut core = self.core.lock();
        let core = &mut *core;
        let id = core.store.add_plane(plane, &core.config)?;
        core.recompute();
        Ok(id)
    }

    /// Remove a plane. Returns `false` if it was not present.
    pub fn remove_plane(&self, id: &str) -> bool {
        let mut core = self.core.lock();
        let removed = core.store.remove_plane(id);
        core.recompute();
        removed
    }

    /// Merge the named planes into one. See [`PlaneStore::merge_planes`].
    pub fn merge_planes<S: AsRef<str>>(&self, ids: &[S]) -> Result<PlaneId> {
        let mut core = self.core.lock();
        let core = &mut *core;
        let id = core.store.merge_planes(ids, &core.config)?;
        core.recompute();
        Ok(id)
    }

    /// Remove every plane and observed point.
    pub fn reset_planes(&self) {
        let mut core = self.core.lock();
        core.store.reset();
        core.observed.clear();
        core.recompute();
    }

    /// Copy of a stored plane.
    pub fn get_plane(&self, id: &str) -> Option<RoofPlane> {
        self.core.lock().store.get_plane(id)
    }

    /// Copies of all stored planes.
    pub fn planes(&self) -> Vec<RoofPlane> {
        self.core.lock().store.planes()
    }

    /// Recorded validation outcome of a stored plane.
    pub fn validation_status(&self, id: &str) -> Option<ValidationStatus> {
        self.core.lock().store.validation_status(id).cloned()
    }

    /// Check a plane against the session configuration without storing it.
    pub fn validate_plane(&self, plane: &RoofPlane) -> std::result::Result<(), ValidationError> {
        validate_plane(plane, &self.core.lock().config)
    }

    /// Pairs of stored planes that look like parts of one surface.
    pub fn merge_candidates(&self) -> Vec<(PlaneId, PlaneId)> {
        let core = self.core.lock();
        core.store.merge_candidates(&core.config)
    }

    /// Aggregate figures over the stored planes.
    pub fn summary(&self) -> RoofSummary {
        self.core.lock().store.summary()
    }

    /// Project a screen tap onto the ground.
    pub fn convert_screen_to_world(
        &self,
        screen_x: f64,
        screen_y: f64,
        screen_width: f64,
        screen_height: f64,
    ) -> ArPoint {
        self.mapper.screen_to_world(
            screen_x,
            screen_y,
            &Viewport::new(screen_width, screen_height),
        )
    }

    /// Set the screen size used by [`Session::perform_hit_test`].
    pub fn set_viewport(&self, viewport: Viewport) {
        self.core.lock().viewport = viewport;
    }

    /// Hit points for a tap on the current viewport, nearest first. Never empty.
    pub fn perform_hit_test(&self, screen_x: f64, screen_y: f64) -> Vec<ArPoint> {
        let core = self.core.lock();
        hit_test_with(
            self.mapper.as_ref(),
            screen_x,
            screen_y,
            &core.viewport,
            core.store.iter(),
        )
    }

    /// Plane hits for a tap on the current viewport, nearest first.
    pub fn hit_test_detailed(&self, screen_x: f64, screen_y: f64) -> Vec<PlaneHit> {
        let core = self.core.lock();
        hit_test_detailed(
            self.mapper.as_ref(),
            screen_x,
            screen_y,
            &core.viewport,
            core.store.iter(),
        )
    }

    /// Apply one sensor event to completion.
    ///
    /// Returns `Ok(false)` if the session is inactive and the event was
    /// dropped. Rejected planes (strict validation) and invalid tracking
    /// transitions are returned as errors and leave the state unchanged.
    pub fn ingest(&self, event: SensorEvent) -> Result<bool> {
        let mut core = self.core.lock();
        let result = core.ingest(event);
        core.recompute();
        result
    }

    /// Drain a sensor event channel, one event at a time, until it closes.
    ///
    /// Returns the number of events applied.
    pub async fn run_sensor_stream(&self, mut events: mpsc::Receiver<SensorEvent>) -> usize {
        let mut applied = 0;
        while let Some(event) = events.recv().await {
            match self.ingest(event) {
                Ok(true) => applied += 1,
                Ok(false) => {}
                Err(e) => warn!("Sensor event rejected: {}", e),
            }
        }
        debug!("Sensor stream closed after {} events", applied);
        applied
    }

    /// Raw point observations retained so far, oldest first.
    pub fn observed_points(&self) -> Vec<ArPoint> {
        self.core.lock().observed.iter().copied().collect()
    }

    /// Snapshot of the whole session.
    pub fn state(&self) -> SessionSnapshot {
        self.core.lock().snapshot()
    }

    /// Current tracking state.
    pub fn tracking_state(&self) -> TrackingState {
        self.core.lock().tracking
    }

    /// Current quality metrics.
    pub fn quality_metrics(&self) -> QualityMetrics {
        self.core.lock().metrics.clone()
    }

    /// Configuration of the current (or last) session.
    pub fn config(&self) -> DetectionConfig {
        self.core.lock().config.clone()
    }
}
