use anyhow::{Context, Result};
use clap::Parser;
use fallwatch::capture::{CaptureSource, ImageSequence, WebcamCapture};
use fallwatch::output::{annotate, OutputSink, SnapshotWriter, V4L2Output};
use fallwatch::segmentation::Preprocessor;
use fallwatch::{AppConfig, FallDetector, HostConfig, StatusBoard, StatusSnapshot};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input webcam device index
    #[arg(short, long, default_value_t = 0)]
    input_device: u32,

    /// Replay still images from this directory instead of a webcam
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Capture resolution width
    #[arg(long, default_value_t = 1280)]
    capture_width: u32,

    /// Capture resolution height
    #[arg(long, default_value_t = 720)]
    capture_height: u32,

    /// Output v4l2loopback device path for the annotated stream
    #[arg(short, long)]
    output_device: Option<PathBuf>,

    /// Output resolution width
    #[arg(long, default_value_t = 1280)]
    output_width: u32,

    /// Output resolution height
    #[arg(long, default_value_t = 720)]
    output_height: u32,

    /// Target frames per second (overrides the config file)
    #[arg(long)]
    fps: Option<u32>,

    /// TOML configuration file
    #[arg(short, long, env = "FALLWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Confidence at or above which a frame counts as a fall
    #[arg(long)]
    confidence_threshold: Option<f64>,

    /// Minimum seconds between two alerts
    #[arg(long)]
    cooldown_seconds: Option<f64>,

    /// Publish a JSON status snapshot to this file
    #[arg(long)]
    status_file: Option<PathBuf>,

    /// Save a JPEG of every frame that raises an alert into this directory
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Send the binary foreground mask to the output instead of the video
    #[arg(long)]
    show_mask: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let mut config = AppConfig::load(args.config.as_deref()).context("Failed to load config")?;
    if let Some(threshold) = args.confidence_threshold {
        config.detector.confidence_threshold = threshold;
    }
    if let Some(cooldown) = args.cooldown_seconds {
        config.detector.cooldown_seconds = cooldown;
    }
    if let Some(fps) = args.fps {
        config.host.target_fps = fps;
    }
    config.validate().context("Invalid configuration")?;

    tracing::info!("Fallwatch starting");
    tracing::info!(
        "Confidence threshold: {:.2}, cooldown: {:.2}s",
        config.detector.confidence_threshold,
        config.detector.cooldown_seconds
    );
    tracing::info!("Target FPS: {}", config.host.target_fps);

    let mut capture: Box<dyn CaptureSource> = match &args.input_dir {
        Some(dir) => Box::new(ImageSequence::open(dir).context("Failed to open frame directory")?),
        None => Box::new(
            WebcamCapture::new(args.input_device, args.capture_width, args.capture_height)
                .context("Failed to initialize webcam capture")?,
        ),
    };
    let (width, height) = capture.resolution();
    tracing::info!("Capture: {}x{}", width, height);

    let mut output: Option<Box<dyn OutputSink>> = match &args.output_device {
        Some(path) => {
            tracing::info!("Output: {}x{}", args.output_width, args.output_height);
            Some(Box::new(
                V4L2Output::new(path, args.output_width, args.output_height)
                    .context("Failed to initialize v4l2loopback output")?,
            ))
        }
        None => None,
    };

    let snapshots = args
        .snapshot_dir
        .as_deref()
        .map(SnapshotWriter::new)
        .transpose()?;

    let mut detector = FallDetector::new(&config.detector).context("Failed to build detector")?;
    let board = StatusBoard::new(config.host.alert_hold());

    let mask_view = args
        .show_mask
        .then(|| Preprocessor::new(config.detector.blur_kernel, config.detector.binary_threshold));

    let pipeline = Pipeline {
        host: &config.host,
        board: &board,
        snapshots: snapshots.as_ref(),
        status_file: args.status_file.as_deref(),
        mask_view: mask_view.as_ref(),
    };
    pipeline.run(capture.as_mut(), output.as_deref_mut(), &mut detector)?;

    let stats = detector.statistics();
    tracing::info!(
        "Finished: avg confidence {:.2}, max {:.2}, min {:.2} over the last {} frames",
        stats.avg_confidence,
        stats.max_confidence,
        stats.min_confidence,
        stats.samples
    );

    Ok(())
}

struct Pipeline<'a> {
    host: &'a HostConfig,
    board: &'a StatusBoard,
    snapshots: Option<&'a SnapshotWriter>,
    status_file: Option<&'a Path>,
    mask_view: Option<&'a Preprocessor>,
}

impl Pipeline<'_> {
    fn run<C, O>(
        &self,
        capture: &mut C,
        mut output: Option<&mut O>,
        detector: &mut FallDetector,
    ) -> Result<()>
    where
        C: CaptureSource + ?Sized,
        O: OutputSink + ?Sized,
    {
        let frame_duration = Duration::from_secs_f64(1.0 / self.host.target_fps as f64);
        let mut frame_count = 0u64;
        let mut total_capture_time = Duration::ZERO;
        let mut total_analyze_time = Duration::ZERO;
        let mut total_output_time = Duration::ZERO;

        tracing::info!("Starting detection loop");
        tracing::info!("Press Ctrl+C to stop");

        loop {
            let loop_start = Instant::now();

            // Capture frame
            let frame = match capture.capture_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    tracing::info!("Frame source exhausted after {} frames", frame_count);
                    break;
                }
                Err(e) if capture.is_live() => {
                    tracing::warn!("Failed to read frame: {:#}", e);
                    std::thread::sleep(Duration::from_secs(1));
                    if let Err(e) = capture.reopen() {
                        tracing::warn!("Failed to reopen frame source: {:#}", e);
                    }
                    continue;
                }
                Err(e) => return Err(e.context("Failed to capture frame")),
            };
            let captured_at = Instant::now();
            total_capture_time += captured_at - loop_start;

            // Analyze
            let result = detector.analyze_at(&frame, captured_at);
            let stats = detector.statistics();
            self.board.record(&result, stats, captured_at);
            let analyzed_at = Instant::now();
            total_analyze_time += analyzed_at - captured_at;

            frame_count += 1;

            if result.fall_detected {
                tracing::warn!(
                    "FALL DETECTED: confidence={:.0}% aspect={:.2} motion={} frame={}",
                    result.confidence * 100.0,
                    result.aspect_ratio.unwrap_or_default(),
                    result.motion,
                    frame_count
                );
                if let Some(snapshots) = self.snapshots {
                    match snapshots.save(&frame, frame_count) {
                        Ok(path) => tracing::info!("Saved snapshot {}", path.display()),
                        Err(e) => tracing::warn!("{:#}", e),
                    }
                }
            }

            // Output frame
            if let Some(sink) = output.as_deref_mut() {
                let output_start = Instant::now();
                let shown = match self.mask_view {
                    Some(pre) => Preprocessor::mask_to_rgb(&pre.foreground_mask(&frame)),
                    None => {
                        let alert_active = !self.board.alert_remaining(analyzed_at).is_zero();
                        annotate(&frame, &result, alert_active)
                    }
                };
                sink.write_frame(&shown).context("Failed to write frame")?;
                total_output_time += output_start.elapsed();
            }

            if frame_count % self.host.summary_interval_frames == 0 {
                let snapshot = self.board.snapshot(Instant::now());
                tracing::info!(
                    "Detection: conf={:.0}% aspect={} motion={} alert={} ({:.1}s left)",
                    snapshot.confidence * 100.0,
                    snapshot
                        .aspect_ratio
                        .map_or_else(|| "N/A".to_string(), |a| format!("{a:.2}")),
                    snapshot.motion,
                    snapshot.fall_detected,
                    snapshot.alert_active_for
                );

                let avg_capture_ms = total_capture_time.as_secs_f64() * 1000.0 / frame_count as f64;
                let avg_analyze_ms = total_analyze_time.as_secs_f64() * 1000.0 / frame_count as f64;
                let avg_output_ms = total_output_time.as_secs_f64() * 1000.0 / frame_count as f64;
                let total_ms = avg_capture_ms + avg_analyze_ms + avg_output_ms;
                tracing::debug!(
                    "Frame {}: capture={:.1}ms, analyze={:.1}ms, output={:.1}ms, total={:.1}ms, fps={:.1}",
                    frame_count,
                    avg_capture_ms,
                    avg_analyze_ms,
                    avg_output_ms,
                    total_ms,
                    1000.0 / total_ms
                );

                if let Some(path) = self.status_file {
                    if let Err(e) = write_status(path, &snapshot) {
                        tracing::warn!("{:#}", e);
                    }
                }
            }

            // Frame rate limiting
            let elapsed = loop_start.elapsed();
            if elapsed < frame_duration {
                std::thread::sleep(frame_duration - elapsed);
            }
        }

        if let Some(path) = self.status_file {
            write_status(path, &self.board.snapshot(Instant::now()))?;
        }

        Ok(())
    }
}

/// Replace `path` with the snapshot as JSON, never leaving a partial file.
fn write_status(path: &Path, snapshot: &StatusSnapshot) -> Result<()> {
    let json = serde_json::to_vec_pretty(snapshot).context("Failed to encode status")?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, json)
        .with_context(|| format!("Failed to write status to {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to publish status at {}", path.display()))?;
    Ok(())
}
