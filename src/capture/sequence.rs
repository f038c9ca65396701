use super::CaptureSource;
use anyhow::{Context, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};

const EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Replays a directory of still images in file-name order.
pub struct ImageSequence {
    frames: Vec<PathBuf>,
    next: usize,
    width: u32,
    height: u32,
}

impl ImageSequence {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();

        let mut frames = Vec::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read frame directory {}", dir.display()))?
        {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
            if is_image {
                frames.push(path);
            }
        }
        frames.sort();

        let first = frames
            .first()
            .with_context(|| format!("No image frames found in {}", dir.display()))?;
        let (width, height) = image::image_dimensions(first)
            .with_context(|| format!("Failed to read {}", first.display()))?;

        tracing::info!(
            "Replaying {} frames from {} at {}x{}",
            frames.len(),
            dir.display(),
            width,
            height
        );

        Ok(Self {
            frames,
            next: 0,
            width,
            height,
        })
    }
}

impl CaptureSource for ImageSequence {
    fn capture_frame(&mut self) -> Result<Option<RgbImage>> {
        let Some(path) = self.frames.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;

        let frame = image::open(path)
            .with_context(|| format!("Failed to decode {}", path.display()))?
            .to_rgb8();

        Ok(Some(frame))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
