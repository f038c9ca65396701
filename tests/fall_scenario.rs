use std::time::{Duration, Instant};

use fallwatch::{DetectorConfig, FallDetector, Statistics};
use image::{Rgb, RgbImage};
use proptest::prelude::*;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

fn black() -> RgbImage {
    RgbImage::new(WIDTH, HEIGHT)
}

fn with_block(mut frame: RgbImage, x0: u32, y0: u32, w: u32, h: u32) -> RgbImage {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            frame.put_pixel(x, y, Rgb([255, 255, 255]));
        }
    }
    frame
}

/// Bright 350x140 block: ratio 2.5, about 49000 px.
fn lying_person() -> RgbImage {
    with_block(black(), 100, 150, 350, 140)
}

#[test]
fn three_frame_fall_sequence() {
    let t0 = Instant::now();
    let mut detector = FallDetector::default();

    let empty = detector.analyze_at(&black(), t0);
    assert!(!empty.fall_detected);
    assert!(empty.bounding_box.is_none());
    assert_eq!(empty.confidence, 0.0);

    let appeared = detector.analyze_at(&lying_person(), t0 + FRAME_INTERVAL);
    let bbox = appeared.bounding_box.expect("blob should be segmented");
    let ratio = appeared.aspect_ratio.unwrap();
    assert!((2.3..2.6).contains(&ratio), "ratio {ratio}");
    assert!(bbox.width >= 350 && bbox.height >= 140);
    assert!(appeared.motion >= 45_000, "motion {}", appeared.motion);
    let scores = appeared.component_scores.unwrap();
    assert_eq!(scores.motion_score, 0.0);
    assert_eq!(scores.area_score, 1.0);
    assert!(
        appeared.confidence > 0.5 && appeared.confidence < 0.65,
        "confidence {}",
        appeared.confidence
    );

    let settled = detector.analyze_at(&lying_person(), t0 + 2 * FRAME_INTERVAL);
    assert_eq!(settled.motion, 0);
    assert!(settled.confidence > appeared.confidence + 0.2);

    let fired = [&empty, &appeared, &settled]
        .iter()
        .filter(|r| r.fall_detected)
        .count();
    assert_eq!(fired, 1);

    let stats = detector.statistics();
    assert_eq!(stats.samples, 2);
    assert_eq!(stats.max_confidence, settled.confidence);
    assert_eq!(stats.min_confidence, appeared.confidence);
}

#[test]
fn uniform_first_frame_has_no_motion() {
    let mut detector = FallDetector::default();
    let result = detector.analyze(&RgbImage::from_pixel(WIDTH, HEIGHT, Rgb([180, 180, 180])));
    assert_eq!(result.motion, 0);
    assert!((0.0..=1.0).contains(&result.confidence));
}

#[test]
fn fresh_detector_statistics_are_zero() {
    let detector = FallDetector::default();
    let stats = detector.statistics();
    assert_eq!(stats, Statistics::default());
    assert_eq!(stats.avg_confidence, 0.0);
    assert_eq!(stats.max_confidence, 0.0);
    assert_eq!(stats.min_confidence, 0.0);
}

#[test]
fn small_regions_never_qualify() {
    let mut detector = FallDetector::default();
    for frame in [
        with_block(black(), 300, 200, 45, 45),
        with_block(black(), 200, 200, 150, 12),
        with_block(black(), 300, 100, 12, 150),
    ] {
        let result = detector.analyze(&frame);
        assert!(result.bounding_box.is_none());
        assert_eq!(result.confidence, 0.0);
        assert!(!result.fall_detected);
    }
    assert_eq!(detector.statistics().samples, 0);
}

#[test]
fn sustained_posture_fires_once_per_cooldown() {
    let t0 = Instant::now();
    let config = DetectorConfig {
        cooldown_seconds: 0.5,
        ..DetectorConfig::default()
    };
    let mut detector = FallDetector::new(&config).unwrap();
    let frame = lying_person();

    // 0.0s .. 0.9s in 100 ms steps; the gate re-arms once 0.5s have passed.
    let fired: Vec<u64> = (0..10u64)
        .filter(|i| {
            let result = detector.analyze_at(&frame, t0 + Duration::from_millis(100 * i));
            assert!(result.confidence >= 0.5);
            result.fall_detected
        })
        .collect();

    assert_eq!(fired, vec![0, 6]);
}

#[test]
fn rearms_just_after_cooldown() {
    let t0 = Instant::now();
    let mut detector = FallDetector::default();
    let frame = lying_person();

    assert!(detector.analyze_at(&frame, t0).fall_detected);
    for step in 1..=5u64 {
        let at = t0 + Duration::from_millis(100 * step);
        assert!(!detector.analyze_at(&frame, at).fall_detected);
    }
    let rearmed = detector.analyze_at(&frame, t0 + Duration::from_millis(501));
    assert!(rearmed.fall_detected);
}

#[test]
fn extreme_geometry_stays_bounded() {
    let t0 = Instant::now();
    let mut detector = FallDetector::default();
    let frames = [
        with_block(black(), 10, 230, 620, 20),
        RgbImage::from_pixel(WIDTH, HEIGHT, Rgb([255, 255, 255])),
        with_block(black(), 310, 5, 20, 470),
        with_block(black(), 10, 230, 620, 20),
    ];

    for (i, frame) in frames.iter().enumerate() {
        let result = detector.analyze_at(frame, t0 + FRAME_INTERVAL * i as u32);
        assert!(
            (0.0..=1.0).contains(&result.confidence),
            "frame {i}: {}",
            result.confidence
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn confidence_bounded_for_random_blocks(
        blocks in prop::collection::vec((0u32..150, 0u32..110, 1u32..160, 1u32..120, 0u8..=255), 1..4)
    ) {
        let mut detector = FallDetector::default();
        let t0 = Instant::now();
        for (i, (x, y, w, h, level)) in blocks.into_iter().enumerate() {
            let mut frame = RgbImage::new(160, 120);
            for py in y..(y + h).min(120) {
                for px in x..(x + w).min(160) {
                    frame.put_pixel(px, py, Rgb([level, level, level]));
                }
            }
            let result = detector.analyze_at(&frame, t0 + FRAME_INTERVAL * i as u32);
            prop_assert!((0.0..=1.0).contains(&result.confidence));
            if result.bounding_box.is_none() {
                prop_assert_eq!(result.confidence, 0.0);
            }
        }
    }
}
