use super::CaptureSource;
use anyhow::{Context, Result};
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;

pub struct WebcamCapture {
    camera: Camera,
    device_index: u32,
    width: u32,
    height: u32,
}

impl WebcamCapture {
    pub fn new(device_index: u32, width: u32, height: u32) -> Result<Self> {
        tracing::info!(
            "Initializing webcam {} at {}x{}",
            device_index,
            width,
            height
        );

        let camera = open_camera(device_index)?;

        tracing::info!("Webcam initialized successfully");

        Ok(Self {
            camera,
            device_index,
            width,
            height,
        })
    }
}

fn open_camera(device_index: u32) -> Result<Camera> {
    let index = CameraIndex::Index(device_index);
    let requested =
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);

    let mut camera = Camera::new(index, requested)
        .with_context(|| format!("Failed to open camera {device_index}"))?;

    camera
        .open_stream()
        .context("Failed to open camera stream")?;

    Ok(camera)
}

impl CaptureSource for WebcamCapture {
    fn capture_frame(&mut self) -> Result<Option<RgbImage>> {
        let frame = self
            .camera
            .frame()
            .context("Failed to capture frame")?;

        let decoded = frame
            .decode_image::<RgbFormat>()
            .context("Failed to decode frame")?;

        Ok(Some(decoded))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn is_live(&self) -> bool {
        true
    }

    fn reopen(&mut self) -> Result<()> {
        tracing::info!("Reopening webcam {}", self.device_index);

        if let Err(e) = self.camera.stop_stream() {
            tracing::debug!("Ignoring error while stopping stream: {}", e);
        }
        self.camera = open_camera(self.device_index)?;

        tracing::info!("Webcam reopened");
        Ok(())
    }
}
