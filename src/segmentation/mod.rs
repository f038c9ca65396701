mod contour;
mod preprocess;
pub mod types;

pub use contour::{bounding_rect, largest_region, polygon_area};
pub use preprocess::Preprocessor;
pub use types::{BoundingBox, Segmenter, Silhouette};

use image::RgbImage;

use crate::config::DetectorConfig;

/// Fixed-threshold silhouette extraction.
///
/// Bright regions are treated as foreground, so this works for a subject lit
/// against a darker background and for nothing cleverer than that.
pub struct ThresholdSegmenter {
    preprocessor: Preprocessor,
    min_area: f64,
}

impl ThresholdSegmenter {
    pub fn new(blur_kernel: u32, binary_threshold: u8, min_area: f64) -> Self {
        Self {
            preprocessor: Preprocessor::new(blur_kernel, binary_threshold),
            min_area,
        }
    }

    pub fn from_config(config: &DetectorConfig) -> Self {
        Self::new(config.blur_kernel, config.binary_threshold, config.min_area)
    }
}

impl Default for ThresholdSegmenter {
    fn default() -> Self {
        Self::from_config(&DetectorConfig::default())
    }
}

impl Segmenter for ThresholdSegmenter {
    fn segment(&self, frame: &RgbImage) -> Option<Silhouette> {
        let _span = tracing::debug_span!("segment").entered();

        let mask = self.preprocessor.foreground_mask(frame);
        let region = largest_region(&mask)?;

        if region.area < self.min_area {
            tracing::trace!(area = region.area, "largest region below minimum area");
            return None;
        }

        Some(region)
    }
}
