//! Latest-detection board polled by whoever hosts the detector.

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::detector::{DetectionResult, Statistics};

/// Point-in-time view of the detector for dashboards and health checks.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatusSnapshot {
    /// True while the alert latch is held, not only on the triggering frame.
    pub fall_detected: bool,
    pub confidence: f64,
    pub aspect_ratio: Option<f64>,
    pub motion: u64,
    /// Seconds until the latch releases; 0 when no alert is held.
    pub alert_active_for: f64,
    pub frames_analyzed: u64,
    pub falls_detected: u64,
    pub has_frame: bool,
    /// Seconds since the last recorded frame, -1 before the first one.
    pub frame_age_seconds: f64,
    pub statistics: Statistics,
}

#[derive(Default)]
struct BoardState {
    last: Option<DetectionResult>,
    last_frame_at: Option<Instant>,
    last_fall_at: Option<Instant>,
    frames_analyzed: u64,
    falls_detected: u64,
    statistics: Statistics,
}

/// Shared handle to the most recent detection.
///
/// Clones refer to the same board, so a reader thread can poll snapshots while
/// the capture loop records.
#[derive(Clone)]
pub struct StatusBoard {
    state: Arc<Mutex<BoardState>>,
    alert_hold: Duration,
}

impl StatusBoard {
    pub fn new(alert_hold: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(BoardState::default())),
            alert_hold,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the result of the frame analyzed at `now`.
    pub fn record(&self, result: &DetectionResult, statistics: Statistics, now: Instant) {
        let mut state = self.lock();
        state.frames_analyzed += 1;
        state.last_frame_at = Some(now);
        if result.fall_detected {
            state.last_fall_at = Some(now);
            state.falls_detected += 1;
        }
        state.statistics = statistics;
        state.last = Some(result.clone());
    }

    /// Time left on the alert latch at `now`.
    pub fn alert_remaining(&self, now: Instant) -> Duration {
        let state = self.lock();
        self.remaining(&state, now)
    }

    fn remaining(&self, state: &BoardState, now: Instant) -> Duration {
        state.last_fall_at.map_or(Duration::ZERO, |at| {
            self.alert_hold
                .saturating_sub(now.saturating_duration_since(at))
        })
    }

    pub fn snapshot(&self, now: Instant) -> StatusSnapshot {
        let state = self.lock();
        let remaining = self.remaining(&state, now);
        let last = state.last.as_ref();

        StatusSnapshot {
            fall_detected: !remaining.is_zero(),
            confidence: last.map_or(0.0, |r| r.confidence),
            aspect_ratio: last.and_then(|r| r.aspect_ratio),
            motion: last.map_or(0, |r| r.motion),
            alert_active_for: remaining.as_secs_f64(),
            frames_analyzed: state.frames_analyzed,
            falls_detected: state.falls_detected,
            has_frame: state.last_frame_at.is_some(),
            frame_age_seconds: state
                .last_frame_at
                .map_or(-1.0, |at| now.saturating_duration_since(at).as_secs_f64()),
            statistics: state.statistics,
        }
    }
}
