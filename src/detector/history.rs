use serde::Serialize;
use std::collections::VecDeque;

/// Summary of the retained confidence window. All zeros when empty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub avg_confidence: f64,
    pub max_confidence: f64,
    pub min_confidence: f64,
    pub samples: usize,
}

/// Bounded FIFO of recent confidence values.
#[derive(Clone, Debug)]
pub struct ConfidenceHistory {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl ConfidenceHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, confidence: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(confidence);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn statistics(&self) -> Statistics {
        if self.samples.is_empty() {
            return Statistics::default();
        }

        let sum: f64 = self.samples.iter().sum();
        let max = self.samples.iter().copied().fold(f64::MIN, f64::max);
        let min = self.samples.iter().copied().fold(f64::MAX, f64::min);

        Statistics {
            avg_confidence: sum / self.samples.len() as f64,
            max_confidence: max,
            min_confidence: min,
            samples: self.samples.len(),
        }
    }
}
