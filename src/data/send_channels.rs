use crossbeam_channel::{Receiver, Sender, TryIter};
use crate::common::InferenceProgress;

/// Receives progress snapshots while a batch runs. Called from worker threads,
/// one call at a time and in completion order. Other workers wait on their own
/// bookkeeping while a call runs, so keep it short; hand heavy work to a channel.
/// A panic inside `report` is logged and that update is dropped.
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: &InferenceProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(&InferenceProgress) + Send + Sync,
{
    fn report(&self, progress: &InferenceProgress) {
        self(progress)
    }
}

/// Sink half of a progress channel; hand it to the batch call.
#[derive(Debug, Clone)]
pub struct ProgressSender {
    pub progress_tx: Sender<InferenceProgress>,
}

/// Receiving half; drain it from a UI thread.
#[derive(Debug, Clone)]
pub struct ProgressReceiver {
    pub progress_rx: Receiver<InferenceProgress>,
}

impl ProgressSink for ProgressSender {
    fn report(&self, progress: &InferenceProgress) {
        // A dropped receiver only means nobody is watching any more.
        if self.progress_tx.send(progress.clone()).is_err() {
            log::trace!("progress receiver dropped");
        }
    }
}

impl ProgressReceiver {
    pub fn try_iter(&self) -> TryIter<'_, InferenceProgress> {
        self.progress_rx.try_iter()
    }

    /// Latest snapshot currently queued, discarding older ones.
    pub fn latest(&self) -> Option<InferenceProgress> {
        self.progress_rx.try_iter().last()
    }

    pub fn recv(&self) -> Option<InferenceProgress> {
        self.progress_rx.recv().ok()
    }
}

pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    let (progress_tx, progress_rx) = crossbeam_channel::unbounded();
    (ProgressSender { progress_tx }, ProgressReceiver { progress_rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_drains_queue() {
        let (tx, rx) = progress_channel();
        for completed in 1..=3 {
            let mut p = InferenceProgress::new(3);
            p.completed = completed;
            tx.report(&p);
        }
        assert_eq!(rx.latest().map(|p| p.completed), Some(3));
        assert!(rx.latest().is_none());
    }

    #[test]
    fn send_after_receiver_drop_is_silent() {
        let (tx, rx) = progress_channel();
        drop(rx);
        tx.report(&InferenceProgress::new(1));
    }
}
