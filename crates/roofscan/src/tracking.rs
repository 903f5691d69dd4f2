//! Tracking state machine.
//!
//! ```text
//! notAvailable -> initializing -> tracking <-> limited
//!                                    |  ^         |
//!                                    v  |         v
//!                                  relocalizing <-+
//! any state -> notAvailable (capability loss)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Phase of the spatial-sensing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackingState {
    /// No session, or the platform cannot detect planes.
    #[default]
    NotAvailable,
    /// Session started, capability probe pending.
    Initializing,
    /// Full-quality tracking.
    Tracking,
    /// Tracking with degraded quality (low light, fast motion, few features).
    Limited,
    /// Tracking lost, trying to recover the map.
    Relocalizing,
}

impl TrackingState {
    /// Whether the state machine allows moving from `self` to `next`.
    ///
    /// Staying in the same state is always allowed.
    pub fn can_transition_to(self, next: TrackingState) -> bool {
        use TrackingState::*;
        if self == next || next == NotAvailable {
            return true;
        }
        matches!(
            (self, next),
            (NotAvailable, Initializing)
                | (Initializing, Tracking)
                | (Tracking, Limited)
                | (Tracking, Relocalizing)
                | (Limited, Tracking)
                | (Limited, Relocalizing)
                | (Relocalizing, Tracking)
        )
    }

    /// Whether the sensor is delivering poses (possibly degraded).
    pub fn is_live(self) -> bool {
        matches!(
            self,
            TrackingState::Tracking | TrackingState::Limited | TrackingState::Relocalizing
        )
    }

    /// Tracking stability score in `[0, 1]`.
    pub fn stability(self) -> f64 {
        match self {
            TrackingState::Tracking => 1.0,
            TrackingState::Limited => 0.5,
            TrackingState::Relocalizing => 0.25,
            TrackingState::Initializing | TrackingState::NotAvailable => 0.0,
        }
    }
}

impl fmt::Display for TrackingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrackingState::NotAvailable => "notAvailable",
            TrackingState::Initializing => "initializing",
            TrackingState::Tracking => "tracking",
            TrackingState::Limited => "limited",
            TrackingState::Relocalizing => "relocalizing",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::TrackingState::*;
    use super::*;

    const ALL: [TrackingState; 5] = [NotAvailable, Initializing, Tracking, Limited, Relocalizing];

    #[test]
    fn test_any_state_can_lose_capability() {
        for s in ALL {
            assert!(s.can_transition_to(NotAvailable));
        }
    }

    #[test]
    fn test_startup_path() {
        assert!(NotAvailable.can_transition_to(Initializing));
        assert!(Initializing.can_transition_to(Tracking));
        assert!(!NotAvailable.can_transition_to(Tracking));
        assert!(!Initializing.can_transition_to(Limited));
    }

    #[test]
    fn test_degradation_and_recovery() {
        assert!(Tracking.can_transition_to(Limited));
        assert!(Limited.can_transition_to(Tracking));
        assert!(Tracking.can_transition_to(Relocalizing));
        assert!(Limited.can_transition_to(Relocalizing));
        assert!(Relocalizing.can_transition_to(Tracking));
        assert!(!Relocalizing.can_transition_to(Limited));
        assert!(!Tracking.can_transition_to(Initializing));
    }

    #[test]
    fn test_stability_ordering() {
        assert!(Tracking.stability() > Limited.stability());
        assert!(Limited.stability() > Relocalizing.stability());
        assert!(Relocalizing.stability() > NotAvailable.stability());
        assert_eq!(NotAvailable.stability(), 0.0);
    }

    #[test]
    fn test_display_matches_serde() {
        for s in ALL {
            let json = serde_json::to_string(&s).unwrap();
            assert_eq!(json, format!("\"{s}\""));
        }
    }
}
