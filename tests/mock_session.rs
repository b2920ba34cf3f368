#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use assist_detect::data::X;
use assist_detect::{DetectError, DetectorConfig, InferenceSession, ModelType, Result, SessionLoader};

#[derive(Debug, Default)]
pub struct Counters {
    pub calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl Counters {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Session returning a fixed output tensor. Panics when the centre of the
/// input is pure red, so tests can inject backend crashes per image.
#[derive(Debug)]
pub struct MockSession {
    output: X,
    delay: Duration,
    labels: Option<Vec<String>>,
    counters: Arc<Counters>,
}

impl InferenceSession for MockSession {
    fn run(&self, input: &X) -> Result<X> {
        self.counters.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_in_flight.fetch_max(now, Ordering::SeqCst);

        std::thread::sleep(self.delay);
        let poisoned = is_poisoned(input);
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);

        if poisoned {
            panic!("backend crashed on poisoned input");
        }
        Ok(self.output.clone())
    }

    fn embedded_labels(&self) -> Option<Vec<String>> {
        self.labels.clone()
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn is_poisoned(input: &X) -> bool {
    let c = input.dims()[2] / 2;
    input[[0, 0, c, c]] > 0.99 && input[[0, 1, c, c]] < 0.01 && input[[0, 2, c, c]] < 0.01
}

/// Loader handing out [`MockSession`]s. Paths containing `broken` fail to load.
#[derive(Debug, Clone)]
pub struct MockLoader {
    output: X,
    delay: Duration,
    labels: Option<Vec<String>>,
    counters: Arc<Counters>,
}

impl MockLoader {
    pub fn new(output: X) -> Self {
        Self {
            output,
            delay: Duration::ZERO,
            labels: None,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_labels(mut self, labels: &[&str]) -> Self {
        self.labels = Some(labels.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn counters(&self) -> Arc<Counters> {
        self.counters.clone()
    }
}

impl SessionLoader for MockLoader {
    fn load(&self, _model_type: ModelType, path: &Path, _config: &DetectorConfig) -> Result<Box<dyn InferenceSession>> {
        if path.to_string_lossy().contains("broken") {
            return Err(DetectError::ModelLoad(format!("corrupt graph in {}", path.display())));
        }
        Ok(Box::new(MockSession {
            output: self.output.clone(),
            delay: self.delay,
            labels: self.labels.clone(),
            counters: self.counters.clone(),
        }))
    }
}

/// `[1, N, 6]` output from `[x1, y1, x2, y2, confidence, class_id]` rows.
pub fn pre_suppressed(rows: &[[f32; 6]]) -> X {
    X::from_shape_vec(&[1, rows.len(), 6], rows.concat()).unwrap()
}

/// `[1, 4 + num_classes, num_anchors]` output. Each anchor is
/// `(cx, cy, w, h, class_id, score)`; every other score is zero.
pub fn raw_anchors(num_classes: usize, num_anchors: usize, anchors: &[(f32, f32, f32, f32, usize, f32)]) -> X {
    let mut data = vec![0.0f32; (4 + num_classes) * num_anchors];
    for (a, &(cx, cy, w, h, class_id, score)) in anchors.iter().enumerate() {
        data[a] = cx;
        data[num_anchors + a] = cy;
        data[2 * num_anchors + a] = w;
        data[3 * num_anchors + a] = h;
        data[(4 + class_id) * num_anchors + a] = score;
    }
    X::from_shape_vec(&[1, 4 + num_classes, num_anchors], data).unwrap()
}
