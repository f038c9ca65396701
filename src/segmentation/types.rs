use image::RgbImage;
use serde::Serialize;

/// Axis-aligned bounding box in pixel coordinates of the source frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Width over height, or `None` for a degenerate box with no height.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.height == 0 {
            return None;
        }
        Some(self.width as f64 / self.height as f64)
    }
}

/// The dominant foreground region of one frame.
///
/// `area` is the polygon area enclosed by the region's outer contour, so a
/// solid `w x h` block measures slightly less than `w * h`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Silhouette {
    pub bbox: BoundingBox,
    pub area: f64,
}

impl Silhouette {
    pub fn aspect_ratio(&self) -> Option<f64> {
        self.bbox.aspect_ratio()
    }
}

/// Trait for foreground segmenters
/// Allows swapping the fixed-threshold segmenter for background subtraction or
/// a learned model without touching the scorer.
pub trait Segmenter {
    /// Extract the dominant silhouette from a frame
    ///
    /// # Arguments
    /// * `frame` - Input RGB frame, non-empty
    ///
    /// # Returns
    /// * `None` when no region clears the minimum-area gate
    fn segment(&self, frame: &RgbImage) -> Option<Silhouette>;
}
