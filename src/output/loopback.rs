use super::OutputSink;
use anyhow::{Context, Result};
use image::RgbImage;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use v4l::video::Output;
use v4l::{Device, FourCC};

/// Writes frames to a v4l2loopback device so any video client can watch the
/// annotated stream.
pub struct V4L2Output {
    file: File,
    width: u32,
    height: u32,
}

impl V4L2Output {
    pub fn new<P: AsRef<Path>>(device_path: P, width: u32, height: u32) -> Result<Self> {
        let path = device_path.as_ref();
        tracing::info!(
            "Opening v4l2loopback device at {} ({}x{})",
            path.display(),
            width,
            height
        );

        configure_format(path, width, height)?;

        // v4l2loopback accepts raw frame data written to the device file
        let file = File::options()
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open v4l2loopback device at {}", path.display()))?;

        tracing::info!("v4l2loopback device opened successfully");

        Ok(Self {
            file,
            width,
            height,
        })
    }
}

/// Announce the frame size and pixel format to the loopback device.
fn configure_format(path: &Path, width: u32, height: u32) -> Result<()> {
    let device = Device::with_path(path)
        .with_context(|| format!("Failed to open {} for format negotiation", path.display()))?;

    let mut format = Output::format(&device).context("Failed to query output format")?;
    format.width = width;
    format.height = height;
    format.fourcc = FourCC::new(b"YUYV");

    let applied = Output::set_format(&device, &format).context("Failed to set output format")?;
    tracing::debug!(
        "Loopback format: {}x{} {}",
        applied.width,
        applied.height,
        applied.fourcc
    );

    Ok(())
}

/// Pack an RGB frame as YUYV 4:2:2. Each horizontal pixel pair shares one
/// chroma sample; an odd last column is paired with itself.
fn pack_yuyv(frame: &RgbImage) -> Vec<u8> {
    let (width, height) = frame.dimensions();
    let row_pairs = (width as usize + 1) / 2;
    let mut packed = Vec::with_capacity(row_pairs * height as usize * 4);
    if width == 0 {
        return packed;
    }

    for row in frame.as_raw().chunks_exact(width as usize * 3) {
        for pair in row.chunks(6) {
            let left = studio_yuv(&pair[..3]);
            let right = pair.get(3..6).map_or(left, studio_yuv);
            let u = ((left[1] as u16 + right[1] as u16) / 2) as u8;
            let v = ((left[2] as u16 + right[2] as u16) / 2) as u8;
            packed.extend_from_slice(&[left[0], u, right[0], v]);
        }
    }

    packed
}

/// BT.601 limited-range YCbCr (Y in 16..=235), the default V4L2 assumes for YUYV.
fn studio_yuv(rgb: &[u8]) -> [u8; 3] {
    let (r, g, b) = (rgb[0] as i32, rgb[1] as i32, rgb[2] as i32);
    let y = ((66 * r + 129 * g + 25 * b + 128) >> 8) + 16;
    let u = ((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128;
    let v = ((112 * r - 94 * g - 18 * b + 128) >> 8) + 128;
    [y, u, v].map(|c| c.clamp(0, 255) as u8)
}

impl OutputSink for V4L2Output {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let resized;
        let frame = if frame.dimensions() != (self.width, self.height) {
            resized = image::imageops::resize(
                frame,
                self.width,
                self.height,
                image::imageops::FilterType::Triangle,
            );
            &resized
        } else {
            frame
        };

        self.file
            .write_all(&pack_yuyv(frame))
            .context("Failed to write frame to v4l2loopback device")?;

        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
