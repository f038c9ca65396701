//! Frame-differencing motion estimate.

use image::{GrayImage, RgbImage};

use crate::segmentation::Preprocessor;

/// Counts pixels whose intensity changed between consecutive frames.
///
/// This is a stream operator: each call compares against the frame passed to
/// the previous call and then replaces it, so frames must arrive in order and
/// one estimator serves exactly one stream.
pub struct MotionEstimator {
    threshold: u8,
    previous: Option<GrayImage>,
}

impl MotionEstimator {
    /// `threshold` is the absolute intensity difference a pixel must exceed to count as changed.
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold,
            previous: None,
        }
    }

    /// Number of changed pixels since the previous frame.
    ///
    /// The first frame, and any frame whose size differs from the cached
    /// baseline, reports 0 and becomes the new baseline.
    pub fn estimate(&mut self, frame: &RgbImage) -> u64 {
        let _span = tracing::debug_span!("motion").entered();

        let gray = Preprocessor::grayscale(frame);
        let motion = match &self.previous {
            Some(prev) if prev.dimensions() == gray.dimensions() => {
                changed_pixels(prev, &gray, self.threshold)
            }
            Some(prev) => {
                tracing::debug!(
                    "Frame size changed from {:?} to {:?}, resetting motion baseline",
                    prev.dimensions(),
                    gray.dimensions()
                );
                0
            }
            None => 0,
        };

        self.previous = Some(gray);
        motion
    }
}

fn changed_pixels(previous: &GrayImage, current: &GrayImage, threshold: u8) -> u64 {
    previous
        .as_raw()
        .iter()
        .zip(current.as_raw())
        .filter(|(a, b)| a.abs_diff(**b) > threshold)
        .count() as u64
}
