//! Posture, motion and area scoring.
//!
//! Everything here is a pure function of one frame's measurements; the
//! cooldown and history live in [`super::FallDetector`].

use serde::{Deserialize, Serialize};

/// Aspect ratio at which a lying silhouette scores fully.
const FULL_FALL_RATIO: f64 = 3.0;
/// Typical width/height of an upright person.
const UPRIGHT_RATIO: f64 = 0.7;

/// How silhouettes at or below a 1:1 aspect ratio feed the posture channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UprightScoring {
    /// Score `ratio / 0.7`, clamped. Upright subjects still contribute.
    #[default]
    Proportional,
    /// Upright silhouettes score 0 on the posture channel.
    Disabled,
}

/// Relative weight of each channel in the final confidence.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub aspect: f64,
    pub motion: f64,
    pub area: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            aspect: 0.65,
            motion: 0.25,
            area: 0.10,
        }
    }
}

impl ScoringWeights {
    pub fn total(&self) -> f64 {
        self.aspect + self.motion + self.area
    }
}

/// Everything the scoring function needs besides the measurements.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoringParams {
    pub weights: ScoringWeights,
    pub motion_normalizer: f64,
    pub area_normalizer: f64,
    pub upright: UprightScoring,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            motion_normalizer: 8000.0,
            area_normalizer: 40000.0,
            upright: UprightScoring::default(),
        }
    }
}

/// Per-channel scores, each in [0, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ComponentScores {
    pub aspect_ratio_score: f64,
    pub motion_score: f64,
    pub area_score: f64,
}

impl ComponentScores {
    /// Weighted sum of the channels, kept inside [0, 1].
    pub fn confidence(&self, weights: &ScoringWeights) -> f64 {
        let sum = weights.aspect * self.aspect_ratio_score
            + weights.motion * self.motion_score
            + weights.area * self.area_score;
        sum.clamp(0.0, 1.0)
    }
}

/// Wide, short silhouettes score high. Ramps from 0 at 1:1 to 1 at 3:1.
pub fn aspect_ratio_score(ratio: f64, upright: UprightScoring) -> f64 {
    let score = if ratio > 1.0 {
        (ratio - 1.0) / (FULL_FALL_RATIO - 1.0)
    } else {
        match upright {
            UprightScoring::Proportional => ratio / UPRIGHT_RATIO,
            UprightScoring::Disabled => 0.0,
        }
    };
    score.clamp(0.0, 1.0)
}

/// Stillness scores high: 1 with no motion, 0 at or beyond `normalizer` changed pixels.
pub fn motion_score(motion: u64, normalizer: f64) -> f64 {
    (1.0 - motion as f64 / normalizer).clamp(0.0, 1.0)
}

/// Rewards silhouettes large enough to be a whole body.
pub fn area_score(area: f64, normalizer: f64) -> f64 {
    (area / normalizer).clamp(0.0, 1.0)
}

/// Score one frame's measurements.
pub fn component_scores(
    aspect_ratio: f64,
    motion: u64,
    area: f64,
    params: &ScoringParams,
) -> ComponentScores {
    ComponentScores {
        aspect_ratio_score: aspect_ratio_score(aspect_ratio, params.upright),
        motion_score: motion_score(motion, params.motion_normalizer),
        area_score: area_score(area, params.area_normalizer),
    }
}
