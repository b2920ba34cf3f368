use std::time::Duration;
use serde::Serialize;

/// Snapshot of a running batch, recomputed after every finished item.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InferenceProgress {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub current_item: String,
    pub elapsed: Duration,
    /// Completed items per second.
    pub throughput: f64,
    pub eta_remaining: Duration,
    /// Fraction of completed items that succeeded, in `[0, 1]`.
    pub success_rate: f64,
    pub average_item_time: Duration,
}

impl InferenceProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.;
        }
        self.completed as f64 / self.total as f64 * 100.
    }

    pub fn succeeded(&self) -> usize {
        self.completed - self.failed
    }

    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }

    pub fn formatted_remaining(&self) -> String {
        let secs = self.eta_remaining.as_secs_f64();
        if secs < 60. {
            format!("{secs:.0}s")
        } else if secs < 3600. {
            format!("{:.1}min", secs / 60.)
        } else {
            format!("{:.1}h", secs / 3600.)
        }
    }
}
