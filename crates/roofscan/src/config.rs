//! Session configuration.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How eagerly surfaces are accepted and merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Sensitivity {
    /// Coarse: larger minimum area, looser merge tolerances.
    Low,
    /// Default tolerances.
    #[default]
    Medium,
    /// Fine: smaller minimum area, tighter merge tolerances.
    High,
}

impl Sensitivity {
    /// Multiplier applied to area thresholds and merge tolerances.
    pub fn scale(self) -> f64 {
        match self {
            Sensitivity::Low => 1.5,
            Sensitivity::Medium => 1.0,
            Sensitivity::High => 0.5,
        }
    }
}

/// Platform handed to the capability probe.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Platform {
    /// iOS (ARKit).
    #[default]
    Ios,
    /// Android (ARCore).
    Android,
    /// Browser (WebXR).
    Web,
    /// Any other platform, by name.
    #[serde(untagged)]
    Other(String),
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Ios => f.write_str("ios"),
            Platform::Android => f.write_str("android"),
            Platform::Web => f.write_str("web"),
            Platform::Other(name) => f.write_str(name),
        }
    }
}

/// Detection parameters for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct DetectionConfig {
    /// Minimum surface area in m², before sensitivity scaling.
    pub min_plane_area: f64,
    /// Minimum plane confidence (0.0 to 1.0).
    pub min_confidence: f64,
    /// Tolerance scaling.
    pub sensitivity: Sensitivity,
    /// Reject invalid planes instead of inserting and flagging them.
    pub strict_validation: bool,
    /// Boundary vertex count at which point density saturates.
    pub target_vertex_count: usize,
    /// Capability probe timeout in milliseconds.
    pub probe_timeout_ms: u64,
    /// Platform passed to the capability probe.
    pub platform: Platform,
    /// Maximum angle between normals of merge candidates, in degrees.
    pub merge_angle_tolerance_deg: f64,
    /// Maximum offset between merge candidates along the normal, in meters.
    pub merge_distance_tolerance: f64,
    /// Raw point observations retained by a session.
    pub max_observed_points: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_plane_area: 1.0,
            min_confidence: 0.5,
            sensitivity: Sensitivity::Medium,
            strict_validation: false,
            target_vertex_count: 32,
            probe_timeout_ms: 5000,
            platform: Platform::Ios,
            merge_angle_tolerance_deg: 10.0,
            merge_distance_tolerance: 0.15,
            max_observed_points: 4096,
        }
    }
}

impl DetectionConfig {
    /// Validate settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_plane_area.is_finite() || self.min_plane_area < 0.0 {
            return Err(ConfigError::Invalid(
                "min_plane_area must be a non-negative number".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::Invalid(
                "min_confidence must be between 0 and 1".into(),
            ));
        }
        if self.target_vertex_count == 0 {
            return Err(ConfigError::Invalid(
                "target_vertex_count must be at least 1".into(),
            ));
        }
        if self.probe_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "probe_timeout_ms must be positive".into(),
            ));
        }
        if !(0.0..=90.0).contains(&self.merge_angle_tolerance_deg) {
            return Err(ConfigError::Invalid(
                "merge_angle_tolerance_deg must be between 0 and 90".into(),
            ));
        }
        if !self.merge_distance_tolerance.is_finite() || self.merge_distance_tolerance < 0.0 {
            return Err(ConfigError::Invalid(
                "merge_distance_tolerance must be a non-negative number".into(),
            ));
        }
        if self.max_observed_points == 0 {
            return Err(ConfigError::Invalid(
                "max_observed_points must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Minimum area after sensitivity scaling.
    pub fn effective_min_area(&self) -> f64 {
        self.min_plane_area * self.sensitivity.scale()
    }

    /// Merge angle tolerance after sensitivity scaling, in degrees.
    pub fn effective_merge_angle(&self) -> f64 {
        self.merge_angle_tolerance_deg * self.sensitivity.scale()
    }

    /// Merge distance tolerance after sensitivity scaling, in meters.
    pub fn effective_merge_distance(&self) -> f64 {
        self.merge_distance_tolerance * self.sensitivity.scale()
    }

    /// Capability probe timeout.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DetectionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_plane_area, 1.0);
        assert_eq!(config.min_confidence, 0.5);
        assert!(!config.strict_validation);
    }

    #[test]
    fn test_sensitivity_scaling() {
        let mut config = DetectionConfig::default();
        assert_eq!(config.effective_min_area(), 1.0);
        config.sensitivity = Sensitivity::High;
        assert_eq!(config.effective_min_area(), 0.5);
        config.sensitivity = Sensitivity::Low;
        assert_eq!(config.effective_min_area(), 1.5);
        assert_eq!(config.effective_merge_angle(), 15.0);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let config = DetectionConfig {
            min_confidence: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = DetectionConfig {
            min_plane_area: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DetectionConfig {
            probe_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DetectionConfig {
            max_observed_points: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_from_toml_partial() {
        let config = DetectionConfig::from_toml_str(
            r#"
            min_plane_area = 2.5
            sensitivity = "high"
            strict_validation = true
            platform = "android"
            "#,
        )
        .unwrap();
        assert_eq!(config.min_plane_area, 2.5);
        assert_eq!(config.sensitivity, Sensitivity::High);
        assert!(config.strict_validation);
        assert_eq!(config.platform, Platform::Android);
        assert_eq!(config.min_confidence, 0.5);
    }

    #[test]
    fn test_from_toml_validates() {
        let err = DetectionConfig::from_toml_str("min_confidence = -1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = DetectionConfig::from_toml_str("min_plane_area = \"big\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_toml_roundtrip_of_defaults() {
        let text = DetectionConfig::default().to_toml_string().unwrap();
        let back = DetectionConfig::from_toml_str(&text).unwrap();
        assert_eq!(back, DetectionConfig::default());
    }

    #[test]
    fn test_unknown_platform_name_parses_as_other() {
        let config = DetectionConfig::from_toml_str("platform = \"quest\"").unwrap();
        assert_eq!(config.platform, Platform::Other("quest".into()));

        let text = config.to_toml_string().unwrap();
        assert!(text.contains("platform = \"quest\""));
        assert_eq!(DetectionConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_platform_display() {
        assert_eq!(Platform::Ios.to_string(), "ios");
        assert_eq!(Platform::Other("quest".into()).to_string(), "quest");
    }
}
