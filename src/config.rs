use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::detector::scoring::{ScoringParams, ScoringWeights, UprightScoring};

pub const CONFIG_ENV: &str = "FALLWATCH_CONFIG";
pub const CONFIDENCE_THRESHOLD_ENV: &str = "FALLWATCH_CONFIDENCE_THRESHOLD";
pub const COOLDOWN_SECONDS_ENV: &str = "FALLWATCH_COOLDOWN_SECONDS";

const WEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{var} must be a number, got {value:?}")]
    Env { var: &'static str, value: String },

    #[error("{field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Seconds that fit a `Duration`: finite, non-negative and not absurdly large.
fn check_seconds(field: &'static str, seconds: f64) -> Result<(), ConfigError> {
    Duration::try_from_secs_f64(seconds)
        .map(|_| ())
        .map_err(|e| invalid(field, format!("is not a usable duration ({e})")))
}

/// Tuning of the fall detector. Every value is an empirically chosen default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Side of the smoothing kernel in pixels (odd).
    pub blur_kernel: u32,
    /// Gray level above which a pixel is foreground.
    pub binary_threshold: u8,
    /// Smallest silhouette area, in square pixels, treated as a person.
    pub min_area: f64,
    /// Per-pixel intensity change that counts as motion.
    pub motion_threshold: u8,
    /// Changed-pixel count at which the stillness score reaches 0.
    pub motion_normalizer: f64,
    /// Silhouette area at which the area score reaches 1.
    pub area_normalizer: f64,
    pub confidence_threshold: f64,
    pub cooldown_seconds: f64,
    pub history_capacity: usize,
    pub weights: ScoringWeights,
    pub upright_scoring: UprightScoring,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            blur_kernel: 21,
            binary_threshold: 100,
            min_area: 3000.0,
            motion_threshold: 30,
            motion_normalizer: 8000.0,
            area_normalizer: 40000.0,
            confidence_threshold: 0.50,
            cooldown_seconds: 0.5,
            history_capacity: 30,
            weights: ScoringWeights::default(),
            upright_scoring: UprightScoring::default(),
        }
    }
}

impl DetectorConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.cooldown_seconds)
    }

    pub fn scoring(&self) -> ScoringParams {
        ScoringParams {
            weights: self.weights,
            motion_normalizer: self.motion_normalizer,
            area_normalizer: self.area_normalizer,
            upright: self.upright_scoring,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.blur_kernel % 2 == 0 {
            return Err(invalid("blur_kernel", "must be odd"));
        }
        if !(self.min_area >= 0.0) {
            return Err(invalid("min_area", "must be non-negative"));
        }
        if !(self.motion_normalizer > 0.0) {
            return Err(invalid("motion_normalizer", "must be greater than zero"));
        }
        if !(self.area_normalizer > 0.0) {
            return Err(invalid("area_normalizer", "must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(invalid("confidence_threshold", "must be within [0, 1]"));
        }
        check_seconds("cooldown_seconds", self.cooldown_seconds)?;
        if self.history_capacity == 0 {
            return Err(invalid("history_capacity", "must be at least 1"));
        }
        let w = self.weights;
        if [w.aspect, w.motion, w.area].iter().any(|v| !(*v >= 0.0)) {
            return Err(invalid("weights", "must be non-negative"));
        }
        if (w.total() - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(invalid(
                "weights",
                format!("must sum to 1.0, got {:.6}", w.total()),
            ));
        }
        Ok(())
    }
}

/// Settings of the process hosting the detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// How long the status board keeps reporting a fall after it fired.
    pub alert_hold_seconds: f64,
    pub target_fps: u32,
    /// Frames between summary log lines and status file refreshes.
    pub summary_interval_frames: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            alert_hold_seconds: 5.0,
            target_fps: 30,
            summary_interval_frames: 30,
        }
    }
}

impl HostConfig {
    pub fn alert_hold(&self) -> Duration {
        Duration::from_secs_f64(self.alert_hold_seconds)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_seconds("alert_hold_seconds", self.alert_hold_seconds)?;
        if self.target_fps == 0 {
            return Err(invalid("target_fps", "must be greater than zero"));
        }
        if self.summary_interval_frames == 0 {
            return Err(invalid("summary_interval_frames", "must be greater than zero"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub detector: DetectorConfig,
    pub host: HostConfig,
}

impl AppConfig {
    /// Load from `path`, or from `$FALLWATCH_CONFIG` when no path is given,
    /// then apply environment overrides. Falls back to defaults when neither
    /// names a file. The result is not validated yet so callers can layer CLI
    /// overrides on top; call [`AppConfig::validate`] afterwards.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut cfg = match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => read_config_file(&path)?,
            None => Self::default(),
        };
        cfg.apply_env()?;
        Ok(cfg)
    }

    pub fn from_toml_str(raw: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(threshold) = env_f64(CONFIDENCE_THRESHOLD_ENV)? {
            self.detector.confidence_threshold = threshold;
        }
        if let Some(cooldown) = env_f64(COOLDOWN_SECONDS_ENV)? {
            self.detector.cooldown_seconds = cooldown;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detector.validate()?;
        self.host.validate()
    }
}

fn read_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    AppConfig::from_toml_str(&raw, path)
}

fn env_f64(var: &'static str) -> Result<Option<f64>, ConfigError> {
    let Ok(value) = std::env::var(var) else {
        return Ok(None);
    };
    if value.trim().is_empty() {
        return Ok(None);
    }
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::Env { var, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        AppConfig::default().validate().unwrap();
        assert_eq!(DetectorConfig::default().cooldown(), Duration::from_millis(500));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let raw = r#"
            [detector]
            confidence_threshold = 0.7
            upright_scoring = "disabled"

            [detector.weights]
            aspect = 0.6
            motion = 0.3

            [host]
            alert_hold_seconds = 2.0
        "#;
        let cfg = AppConfig::from_toml_str(raw, Path::new("inline.toml")).unwrap();
        assert_eq!(cfg.detector.confidence_threshold, 0.7);
        assert_eq!(cfg.detector.upright_scoring, UprightScoring::Disabled);
        assert_eq!(cfg.detector.weights.area, 0.10);
        assert_eq!(cfg.detector.min_area, 3000.0);
        assert_eq!(cfg.host.alert_hold_seconds, 2.0);
        assert_eq!(cfg.host.target_fps, 30);
        cfg.validate().unwrap();
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut cfg = DetectorConfig {
            confidence_threshold: 1.5,
            ..DetectorConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid { field: "confidence_threshold", .. })
        ));

        cfg.confidence_threshold = 0.5;
        cfg.weights.area = 0.5;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid { field: "weights", .. })
        ));

        cfg.weights = ScoringWeights::default();
        cfg.blur_kernel = 20;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid { field: "blur_kernel", .. })
        ));
    }

    #[test]
    fn durations_must_fit() {
        for seconds in [1e20, -0.5, f64::NAN, f64::INFINITY] {
            let detector = DetectorConfig {
                cooldown_seconds: seconds,
                ..DetectorConfig::default()
            };
            assert!(matches!(
                detector.validate(),
                Err(ConfigError::Invalid { field: "cooldown_seconds", .. })
            ));

            let host = HostConfig {
                alert_hold_seconds: seconds,
                ..HostConfig::default()
            };
            assert!(matches!(
                host.validate(),
                Err(ConfigError::Invalid { field: "alert_hold_seconds", .. })
            ));
        }

        let long_hold = HostConfig {
            alert_hold_seconds: 86_400.0,
            ..HostConfig::default()
        };
        long_hold.validate().unwrap();
        assert_eq!(long_hold.alert_hold(), Duration::from_secs(86_400));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = AppConfig::from_toml_str("[detector\n", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }
}
