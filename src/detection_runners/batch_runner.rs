//! Fans the single-image path out over a bounded worker pool.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;
use parking_lot::Mutex;
use crate::common::{Detection, DetectorConfig, ImageRef, InferenceProgress};
use crate::data::{CancelToken, ProgressSink, TimeCalc};
use crate::errors::DetectError;
use crate::model_manager::ModelHandle;
use crate::Result;

/// One batch request. Lives for the duration of a single batch call.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub items: Vec<ImageRef>,
    pub conf_threshold: f32,
    /// Worker cap; `None` uses the configured concurrency.
    pub concurrency: Option<usize>,
    pub cancel: CancelToken,
}

impl BatchJob {
    pub fn new(items: Vec<ImageRef>, conf_threshold: f32) -> Self {
        Self {
            items,
            conf_threshold,
            concurrency: None,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = Some(n);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Result of a batch run. Contains an entry for every item that was taken
/// by a worker, including failed ones (with no detections).
#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    pub detections: HashMap<String, Vec<Detection>>,
    pub progress: InferenceProgress,
    pub cancelled: bool,
}

impl BatchOutput {
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Vec<Detection>> {
        self.detections.get(key)
    }
}

/// Runs every item of `job` against one model snapshot.
///
/// Up to `C` workers each take the next item, check the cancel token first, and
/// run it to completion. Per-item errors and panics become an empty result and
/// a failure count; they never end the batch.
pub fn run_batch(
    handle: Arc<ModelHandle>,
    job: BatchJob,
    config: &DetectorConfig,
    sink: Option<&dyn ProgressSink>,
) -> Result<BatchOutput> {
    let total = job.items.len();
    let workers = job.concurrency.map_or_else(|| config.concurrency(), |n| n.max(1)).min(total.max(1));

    log::info!(
        "Batch started: {} items, {} workers, model '{}' (generation {})",
        total,
        workers,
        handle.name(),
        handle.generation()
    );

    let (item_tx, item_rx) = crossbeam_channel::unbounded::<ImageRef>();
    for item in job.items {
        // Receiver is alive until the end of this function.
        let _ = item_tx.send(item);
    }
    drop(item_tx);

    let results: Mutex<HashMap<String, Vec<Detection>>> = Mutex::new(HashMap::with_capacity(total));
    let calc = Mutex::new(TimeCalc::start(total));

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("detect-worker-{i}"))
        .build()
        .map_err(DetectError::inference)?;

    pool.scope(|s| {
        for _ in 0..workers {
            s.spawn(|_| {
                while !job.cancel.is_cancelled() {
                    let Ok(item) = item_rx.try_recv() else { break };
                    let key = item.key();
                    let started = Instant::now();

                    let detections = run_item(&handle, &item, job.conf_threshold, config);
                    let succeeded = detections.is_some();

                    results.lock().insert(key.clone(), detections.unwrap_or_default());

                    // Reported under the lock so sinks see snapshots in completion order.
                    let mut calc = calc.lock();
                    let progress = calc.record(&key, succeeded, started.elapsed());
                    if let Some(sink) = sink {
                        report_progress(sink, &progress);
                    }
                }
            });
        }
    });

    let cancelled = job.cancel.is_cancelled();
    let progress = calc.into_inner().snapshot("");
    log::info!(
        "Batch {}: {}/{} items, {} failed, {:.2?}",
        if cancelled { "cancelled" } else { "finished" },
        progress.completed,
        progress.total,
        progress.failed,
        progress.elapsed
    );

    Ok(BatchOutput {
        detections: results.into_inner(),
        progress,
        cancelled,
    })
}

/// A panicking sink loses that update; the batch carries on.
fn report_progress(sink: &dyn ProgressSink, progress: &InferenceProgress) {
    if panic::catch_unwind(AssertUnwindSafe(|| sink.report(progress))).is_err() {
        log::warn!("Progress sink panicked at {}/{}", progress.completed, progress.total);
    }
}

/// `None` on any failure, including a panic inside the backend.
fn run_item(handle: &ModelHandle, item: &ImageRef, conf_threshold: f32, config: &DetectorConfig) -> Option<Vec<Detection>> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let image = item.load()?;
        handle.detect(&image, conf_threshold, config)
    }));

    match outcome {
        Ok(Ok(detections)) => Some(detections),
        Ok(Err(err)) => {
            log::warn!("Inference failed for {}: {}", item.key(), err);
            None
        }
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            log::warn!("Inference panicked for {}: {}", item.key(), msg);
            None
        }
    }
}

/// Keeps the newest snapshot for polling and forwards to the caller's sink.
struct LatestProgress {
    latest: Arc<Mutex<InferenceProgress>>,
    forward: Option<Arc<dyn ProgressSink>>,
}

impl ProgressSink for LatestProgress {
    fn report(&self, progress: &InferenceProgress) {
        *self.latest.lock() = progress.clone();
        if let Some(sink) = &self.forward {
            sink.report(progress);
        }
    }
}

/// A batch running on a background thread.
#[derive(Debug)]
pub struct BatchHandle {
    cancel: CancelToken,
    latest: Arc<Mutex<InferenceProgress>>,
    thread: JoinHandle<Result<BatchOutput>>,
}

impl BatchHandle {
    /// Latest progress snapshot; safe to call at any time.
    pub fn progress(&self) -> InferenceProgress {
        self.latest.lock().clone()
    }

    /// Stops workers from taking new items. Running items finish.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Waits for the batch and returns its (possibly partial) results.
    pub fn join(self) -> Result<BatchOutput> {
        self.thread
            .join()
            .map_err(|_| DetectError::InferenceExecution("batch thread panicked".to_string()))?
    }
}

/// Starts [`run_batch`] on a background thread and returns immediately.
pub fn spawn_batch(
    handle: Arc<ModelHandle>,
    job: BatchJob,
    config: DetectorConfig,
    sink: Option<Arc<dyn ProgressSink>>,
) -> Result<BatchHandle> {
    let cancel = job.cancel.clone();
    let latest = Arc::new(Mutex::new(InferenceProgress::new(job.len())));
    let progress = LatestProgress {
        latest: latest.clone(),
        forward: sink,
    };

    let thread = std::thread::Builder::new()
        .name("detect-batch".to_string())
        .spawn(move || {
            let sink: &dyn ProgressSink = &progress;
            run_batch(handle, job, &config, Some(sink))
        })?;

    Ok(BatchHandle {
        cancel,
        latest,
        thread,
    })
}
