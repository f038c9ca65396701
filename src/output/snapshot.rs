use anyhow::{Context, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};

/// Saves the frames that triggered an alert as JPEG files.
pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create snapshot directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Write `frame` as `fall_<frame number>.jpg` and return its path.
    pub fn save(&self, frame: &RgbImage, frame_number: u64) -> Result<PathBuf> {
        let path = self.dir.join(format!("fall_{frame_number:08}.jpg"));
        frame
            .save(&path)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        Ok(path)
    }
}
