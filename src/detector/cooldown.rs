use serde::Serialize;
use std::time::{Duration, Instant};

/// Whether the next qualifying frame may raise an alert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertState {
    Armed,
    Suppressed,
}

/// Edge-triggers alerts out of a continuous high-confidence condition.
///
/// The gate fires, stays suppressed for `cooldown`, then re-arms on its own.
/// Only the time of the last alert is stored; the state is derived from it.
#[derive(Clone, Debug)]
pub struct AlertGate {
    cooldown: Duration,
    last_alert: Option<Instant>,
}

impl AlertGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_alert: None,
        }
    }

    pub fn state(&self, now: Instant) -> AlertState {
        match self.last_alert {
            Some(last) if now.saturating_duration_since(last) <= self.cooldown => {
                AlertState::Suppressed
            }
            _ => AlertState::Armed,
        }
    }

    /// Fire if armed. Returns whether an alert was raised at `now`.
    pub fn try_fire(&mut self, now: Instant) -> bool {
        if self.state(now) == AlertState::Suppressed {
            return false;
        }
        self.last_alert = Some(now);
        true
    }
}
