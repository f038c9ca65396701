//! Frame-by-frame fall detection.
//!
//! Each frame is segmented into a silhouette, compared against the previous
//! frame for motion, and scored. Positive frames pass through an alert gate
//! so a person who stays on the floor raises one alert per cooldown window
//! instead of one per frame.

pub mod cooldown;
pub mod history;
pub mod result;
pub mod scoring;

pub use cooldown::{AlertGate, AlertState};
pub use history::{ConfidenceHistory, Statistics};
pub use result::DetectionResult;
pub use scoring::{ComponentScores, ScoringParams, ScoringWeights, UprightScoring};

use image::RgbImage;
use std::time::Instant;

use crate::config::{ConfigError, DetectorConfig};
use crate::motion::MotionEstimator;
use crate::segmentation::{Segmenter, ThresholdSegmenter};

/// Fall detector for a single camera stream.
///
/// Owns the motion baseline, the alert gate and the confidence history.
/// Frames must be submitted in arrival order; use one instance per stream.
pub struct FallDetector {
    segmenter: Box<dyn Segmenter + Send>,
    motion: MotionEstimator,
    gate: AlertGate,
    history: ConfidenceHistory,
    scoring: ScoringParams,
    confidence_threshold: f64,
}

impl FallDetector {
    pub fn new(config: &DetectorConfig) -> Result<Self, ConfigError> {
        let segmenter = ThresholdSegmenter::from_config(config);
        Self::with_segmenter(config, Box::new(segmenter))
    }

    /// Use a custom segmenter in place of the fixed-threshold one.
    pub fn with_segmenter(
        config: &DetectorConfig,
        segmenter: Box<dyn Segmenter + Send>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_parts(config, segmenter))
    }

    /// `config` must already be valid.
    fn from_parts(config: &DetectorConfig, segmenter: Box<dyn Segmenter + Send>) -> Self {
        Self {
            segmenter,
            motion: MotionEstimator::new(config.motion_threshold),
            gate: AlertGate::new(config.cooldown()),
            history: ConfidenceHistory::new(config.history_capacity),
            scoring: config.scoring(),
            confidence_threshold: config.confidence_threshold,
        }
    }

    /// Analyze a frame captured now.
    pub fn analyze(&mut self, frame: &RgbImage) -> DetectionResult {
        self.analyze_at(frame, Instant::now())
    }

    /// Analyze a frame captured at `now`.
    ///
    /// `now` must not go backwards between calls.
    pub fn analyze_at(&mut self, frame: &RgbImage, now: Instant) -> DetectionResult {
        let (width, height) = frame.dimensions();
        debug_assert!(width > 0 && height > 0, "frames must not be empty");

        let _span = tracing::debug_span!("analyze").entered();

        let silhouette = self.segmenter.segment(frame);
        // The baseline follows every frame, silhouette or not.
        let motion = self.motion.estimate(frame);

        let Some(silhouette) = silhouette else {
            return DetectionResult::default();
        };
        let Some(aspect_ratio) = silhouette.aspect_ratio() else {
            return DetectionResult::default();
        };

        let scores =
            scoring::component_scores(aspect_ratio, motion, silhouette.area, &self.scoring);
        let confidence = scores.confidence(&self.scoring.weights);

        let fall_detected = confidence >= self.confidence_threshold && self.gate.try_fire(now);
        if fall_detected {
            tracing::debug!(
                confidence,
                aspect_ratio,
                motion,
                area = silhouette.area,
                "fall posture detected"
            );
        }

        self.history.push(confidence);

        DetectionResult {
            fall_detected,
            confidence,
            aspect_ratio: Some(aspect_ratio),
            motion,
            bounding_box: Some(silhouette.bbox),
            area: Some(silhouette.area),
            component_scores: Some(scores),
        }
    }

    /// Mean, max and min confidence over the retained window.
    pub fn statistics(&self) -> Statistics {
        self.history.statistics()
    }

    pub fn alert_state(&self, now: Instant) -> AlertState {
        self.gate.state(now)
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }
}

impl Default for FallDetector {
    fn default() -> Self {
        let config = DetectorConfig::default();
        Self::from_parts(&config, Box::new(ThresholdSegmenter::from_config(&config)))
    }
}
