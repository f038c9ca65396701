use serde::Serialize;

use super::scoring::ComponentScores;
use crate::segmentation::BoundingBox;

/// Result of analyzing one frame.
///
/// The derived fields are `None` when no silhouette qualified; `motion` is
/// then 0 and `confidence` 0.0.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DetectionResult {
    /// Confidence cleared the threshold and the alert gate was armed.
    pub fall_detected: bool,
    /// Weighted channel sum in [0, 1].
    pub confidence: f64,
    pub aspect_ratio: Option<f64>,
    /// Changed-pixel count against the previous frame.
    pub motion: u64,
    pub bounding_box: Option<BoundingBox>,
    /// Enclosed area of the silhouette in square pixels.
    pub area: Option<f64>,
    pub component_scores: Option<ComponentScores>,
}
