//! Configuration loading for Anugami

use crate::error::{FollowError, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Main configuration structure
#[derive(Clone, Debug, Deserialize, Default)]
pub struct FollowConfig {
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// The tunable geometry and scale parameters of the tracking box.
///
/// This is the unit of live reconfiguration: a pushed snapshot replaces
/// all eight fields at once. The `enabled` flag is deliberately not part
/// of it (it is only set by the toggle service and the initial load).
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct TrackingParams {
    /// Minimum height of points in the box, on the negated sensor y (meters)
    #[serde(default = "default_min_y")]
    pub min_y: f64,

    /// Maximum height of points in the box (meters)
    #[serde(default = "default_max_y")]
    pub max_y: f64,

    /// Minimum lateral position of points in the box (meters)
    #[serde(default = "default_min_x")]
    pub min_x: f64,

    /// Maximum lateral position of points in the box (meters)
    #[serde(default = "default_max_x")]
    pub max_x: f64,

    /// Maximum depth of points in the box (meters)
    #[serde(default = "default_max_z")]
    pub max_z: f64,

    /// Standoff distance to hold from the tracked centroid (meters)
    #[serde(default = "default_goal_z")]
    pub goal_z: f64,

    /// Scaling factor for translational speed (accepted, currently inert)
    #[serde(default = "default_z_scale")]
    pub z_scale: f64,

    /// Scaling factor for rotational speed (accepted, currently inert)
    #[serde(default = "default_x_scale")]
    pub x_scale: f64,
}

impl TrackingParams {
    /// Check that the bounding volume is well-formed (min < max per axis).
    pub fn validate(&self) -> Result<()> {
        if self.min_x >= self.max_x {
            return Err(FollowError::Config(format!(
                "min_x ({}) must be less than max_x ({})",
                self.min_x, self.max_x
            )));
        }
        if self.min_y >= self.max_y {
            return Err(FollowError::Config(format!(
                "min_y ({}) must be less than max_y ({})",
                self.min_y, self.max_y
            )));
        }
        if self.max_z <= 0.0 {
            return Err(FollowError::Config(format!(
                "max_z ({}) must be positive",
                self.max_z
            )));
        }
        Ok(())
    }
}

impl Default for TrackingParams {
    fn default() -> Self {
        Self {
            min_y: default_min_y(),
            max_y: default_max_y(),
            min_x: default_min_x(),
            max_x: default_max_x(),
            max_z: default_max_z(),
            goal_z: default_goal_z(),
            z_scale: default_z_scale(),
            x_scale: default_x_scale(),
        }
    }
}

/// Tracking section: box geometry plus the follow-enable flag
#[derive(Clone, Debug, Deserialize)]
pub struct TrackingConfig {
    #[serde(flatten)]
    pub params: TrackingParams,

    /// Enable/disable following; gates the no-target crawl
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            params: TrackingParams::default(),
            enabled: default_enabled(),
        }
    }
}

/// Control loop settings
#[derive(Clone, Debug, Deserialize)]
pub struct ControlConfig {
    /// Control cycle rate in Hz (default: 10, the evasion cadence)
    #[serde(default = "default_tick_rate")]
    pub tick_rate_hz: f64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: default_tick_rate(),
        }
    }
}

/// Diagnostic marker settings
#[derive(Clone, Debug, Deserialize)]
pub struct DiagnosticsConfig {
    /// Frame id stamped on markers (the sensor optical frame)
    #[serde(default = "default_frame_id")]
    pub frame_id: String,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            frame_id: default_frame_id(),
        }
    }
}

// Default value functions
fn default_min_y() -> f64 {
    0.1
}
fn default_max_y() -> f64 {
    0.5
}
fn default_min_x() -> f64 {
    -0.2
}
fn default_max_x() -> f64 {
    0.2
}
fn default_max_z() -> f64 {
    0.8
}
fn default_goal_z() -> f64 {
    0.6
}
fn default_z_scale() -> f64 {
    1.0
}
fn default_x_scale() -> f64 {
    5.0
}
fn default_enabled() -> bool {
    true
}
fn default_tick_rate() -> f64 {
    10.0
}
fn default_frame_id() -> String {
    "camera_depth_optical_frame".to_string()
}

impl FollowConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FollowError::Config(format!("Failed to read config file: {}", e)))?;
        let config: FollowConfig = toml::from_str(&content)?;
        config.tracking.params.validate()?;
        Ok(config)
    }
}

/// Owner of the live tracking parameters and the follow-enable flag.
///
/// The control cycle reads one immutable snapshot at cycle start, so a
/// reconfigure push landing mid-cycle can never tear a decision.
#[derive(Debug)]
pub struct ConfigStore {
    params: Arc<TrackingParams>,
    enabled: bool,
}

impl ConfigStore {
    /// Create a store from the loaded tracking section.
    pub fn new(tracking: &TrackingConfig) -> Result<Self> {
        tracking.params.validate()?;
        Ok(Self {
            params: Arc::new(tracking.params),
            enabled: tracking.enabled,
        })
    }

    /// Snapshot of the current parameters for one control cycle.
    pub fn snapshot(&self) -> Arc<TrackingParams> {
        Arc::clone(&self.params)
    }

    /// Replace the parameters with a pushed snapshot.
    ///
    /// An ill-formed volume is rejected and the previous parameters stay
    /// in effect.
    pub fn apply(&mut self, params: TrackingParams) -> Result<()> {
        params.validate()?;
        self.params = Arc::new(params);
        Ok(())
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_box_geometry() {
        let params = TrackingParams::default();
        assert_eq!(params.min_y, 0.1);
        assert_eq!(params.max_y, 0.5);
        assert_eq!(params.min_x, -0.2);
        assert_eq!(params.max_x, 0.2);
        assert_eq!(params.max_z, 0.8);
        assert_eq!(params.goal_z, 0.6);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn inverted_axis_is_a_config_error() {
        let params = TrackingParams {
            min_x: 0.5,
            max_x: -0.5,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn store_rejects_bad_push_and_keeps_old_params() {
        let mut store = ConfigStore::new(&TrackingConfig::default()).unwrap();
        let before = store.snapshot();

        let bad = TrackingParams {
            min_y: 1.0,
            max_y: 0.0,
            ..Default::default()
        };
        assert!(store.apply(bad).is_err());
        assert_eq!(*store.snapshot(), *before);
    }

    #[test]
    fn push_does_not_touch_enabled() {
        let mut store = ConfigStore::new(&TrackingConfig::default()).unwrap();
        store.set_enabled(false);

        let pushed = TrackingParams {
            goal_z: 0.9,
            ..Default::default()
        };
        store.apply(pushed).unwrap();

        assert!(!store.enabled());
        assert_eq!(store.snapshot().goal_z, 0.9);
    }

    #[test]
    fn toml_section_parses_with_partial_fields() {
        let config: FollowConfig = toml::from_str(
            r#"
            [tracking]
            goal_z = 0.75
            enabled = false

            [control]
            tick_rate_hz = 20.0
            "#,
        )
        .unwrap();

        assert_eq!(config.tracking.params.goal_z, 0.75);
        assert!(!config.tracking.enabled);
        assert_eq!(config.tracking.params.max_z, 0.8);
        assert_eq!(config.control.tick_rate_hz, 20.0);
    }
}
