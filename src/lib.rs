//! Camera fall detection from silhouette geometry and motion.
//!
//! [`FallDetector`] scores each frame of a single stream and edge-triggers
//! alerts. The capture, output and status modules host it in a live loop.

pub mod capture;
pub mod config;
pub mod detector;
pub mod motion;
pub mod output;
pub mod segmentation;
pub mod status;

pub use config::{AppConfig, ConfigError, DetectorConfig, HostConfig};
pub use detector::{AlertState, DetectionResult, FallDetector, Statistics};
pub use status::{StatusBoard, StatusSnapshot};
