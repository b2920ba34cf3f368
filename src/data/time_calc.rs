use std::time::{Duration, Instant};
use crate::common::InferenceProgress;

/// Counters and timing behind [`InferenceProgress`]. Not thread-safe on its own;
/// the batch runner keeps it behind a lock.
#[derive(Debug)]
pub struct TimeCalc {
    started: Instant,
    total: usize,
    completed: usize,
    failed: usize,
    item_time: Duration,
}

impl TimeCalc {
    pub fn start(total: usize) -> Self {
        Self {
            started: Instant::now(),
            total,
            completed: 0,
            failed: 0,
            item_time: Duration::ZERO,
        }
    }

    /// Records one finished item and returns the refreshed snapshot.
    pub fn record(&mut self, item: &str, succeeded: bool, took: Duration) -> InferenceProgress {
        self.completed += 1;
        if !succeeded {
            self.failed += 1;
        }
        self.item_time += took;
        self.snapshot_at(item, self.started.elapsed())
    }

    pub fn snapshot(&self, item: &str) -> InferenceProgress {
        self.snapshot_at(item, self.started.elapsed())
    }

    pub(crate) fn snapshot_at(&self, item: &str, elapsed: Duration) -> InferenceProgress {
        let secs = elapsed.as_secs_f64();
        let throughput = if secs > 0. { self.completed as f64 / secs } else { 0. };
        let remaining = self.total.saturating_sub(self.completed);
        let eta_remaining = if throughput > 0. {
            Duration::from_secs_f64(remaining as f64 / throughput)
        } else {
            Duration::ZERO
        };
        let success_rate = if self.completed > 0 {
            (self.completed - self.failed) as f64 / self.completed as f64
        } else {
            0.
        };
        let average_item_time = if self.completed > 0 {
            self.item_time / self.completed as u32
        } else {
            Duration::ZERO
        };

        InferenceProgress {
            total: self.total,
            completed: self.completed,
            failed: self.failed,
            current_item: item.to_string(),
            elapsed,
            throughput,
            eta_remaining,
            success_rate,
            average_item_time,
        }
    }
}
