//! Screen-to-world projection.
//!
//! Without a camera pose the engine cannot unproject a tap exactly. The
//! [`HeuristicMapper`] assumes the device looks straight down at the
//! ground plane from arm's length and maps the screen linearly onto a
//! fixed patch of ground. Other mappers (a real 6-DoF unprojection) plug
//! in through [`CoordinateMapper`] without touching hit testing or the
//! store.

use roofscan_geom::Ray;
use roofscan_math::{Point3, Vec3};
use serde::{Deserialize, Serialize};

use crate::types::{ArPoint, SensorAccuracy};

/// Confidence attached to every estimated (non-sensor) point.
pub const ESTIMATE_CONFIDENCE: f64 = 0.7;

/// Screen dimensions in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Viewport {
    /// Create a viewport.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Map a screen coordinate to `[-1, 1]` on both axes, relative to the
    /// screen center.
    ///
    /// Coordinates outside the screen are clamped to the nearest edge. A
    /// NaN coordinate or an unusable dimension (zero, negative, NaN)
    /// yields the center on that axis.
    pub fn normalize(&self, x: f64, y: f64) -> (f64, f64) {
        (normalize_axis(x, self.width), normalize_axis(y, self.height))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(390.0, 844.0)
    }
}

fn normalize_axis(v: f64, extent: f64) -> f64 {
    if !extent.is_finite() || extent <= 0.0 || v.is_nan() {
        return 0.0;
    }
    let half = extent / 2.0;
    (v.clamp(0.0, extent) - half) / half
}

/// Converts screen taps into world-space points and pick rays.
pub trait CoordinateMapper: Send + Sync {
    /// Best-estimate world point for a screen coordinate. Never fails.
    fn screen_to_world(&self, x: f64, y: f64, viewport: &Viewport) -> ArPoint;

    /// Ray from the (virtual) camera through the tapped point.
    fn pick_ray(&self, x: f64, y: f64, viewport: &Viewport) -> Ray;
}

/// Top-down linear screen-to-ground mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicMapper {
    /// Ground distance in meters from screen center to screen edge.
    pub half_span: f64,
    /// Height of the virtual camera above the ground point, in meters.
    /// Hit testing moves the ray origin higher when a plane reaches it.
    pub camera_height: f64,
}

impl Default for HeuristicMapper {
    /// A full-width tap sweep covers 2.5 m of ground.
    fn default() -> Self {
        Self {
            half_span: 1.25,
            camera_height: 10.0,
        }
    }
}

impl HeuristicMapper {
    fn ground_point(&self, x: f64, y: f64, viewport: &Viewport) -> Point3 {
        let (nx, ny) = viewport.normalize(x, y);
        Point3::new(nx * self.half_span, 0.0, ny * self.half_span)
    }
}

impl CoordinateMapper for HeuristicMapper {
    fn screen_to_world(&self, x: f64, y: f64, viewport: &Viewport) -> ArPoint {
        ArPoint::from_position(
            &self.ground_point(x, y, viewport),
            ESTIMATE_CONFIDENCE,
            SensorAccuracy::Medium,
        )
    }

    fn pick_ray(&self, x: f64, y: f64, viewport: &Viewport) -> Ray {
        let ground = self.ground_point(x, y, viewport);
        let origin = ground + Vec3::y() * self.camera_height;
        Ray::through(origin, ground)
    }
}

/// Project a screen tap onto the ground with the default heuristic.
pub fn convert_screen_to_world(
    screen_x: f64,
    screen_y: f64,
    screen_width: f64,
    screen_height: f64,
) -> ArPoint {
    HeuristicMapper::default().screen_to_world(
        screen_x,
        screen_y,
        &Viewport::new(screen_width, screen_height),
    )
}
