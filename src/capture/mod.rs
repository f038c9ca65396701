mod sequence;
mod v4l_capture;

pub use sequence::ImageSequence;
pub use v4l_capture::WebcamCapture;

use anyhow::Result;
use image::RgbImage;

/// Trait for frame sources feeding the detector
pub trait CaptureSource {
    /// Capture the next frame
    ///
    /// Returns `None` once a finite source has no frames left.
    fn capture_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Get the resolution of captured frames
    fn resolution(&self) -> (u32, u32);

    /// Whether the source is a live device worth reconnecting to
    fn is_live(&self) -> bool {
        false
    }

    /// Re-establish the stream after a failed capture
    ///
    /// Sources that cannot recover keep the default, which refuses.
    fn reopen(&mut self) -> Result<()> {
        anyhow::bail!("this source cannot be reopened")
    }
}
