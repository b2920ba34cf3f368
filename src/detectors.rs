use std::path::Path;
use std::sync::Arc;
use crate::common::{Detection, DetectorConfig, ImageRef, ModelType};
use crate::data::ProgressSink;
use crate::detection_runners::batch_runner::{self, BatchHandle, BatchJob, BatchOutput};
use crate::detection_runners::inference_process::SessionLoader;
use crate::errors::DetectError;
use crate::model_manager::{ModelHandle, ModelManager};
use crate::Result;

/// Outcome of [`Detector::load_model`], shaped for a status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadStatus {
    pub loaded: bool,
    pub status: String,
}

/// Entry point for callers: model lifecycle plus single and batch inference.
/// Cheap to clone; clones share the same model manager.
#[derive(Debug, Clone)]
pub struct Detector {
    manager: Arc<ModelManager>,
}

impl Detector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            manager: Arc::new(ModelManager::new(config)),
        }
    }

    pub fn with_loader<L: SessionLoader + 'static>(config: DetectorConfig, loader: L) -> Self {
        Self {
            manager: Arc::new(ModelManager::with_loader(config, loader)),
        }
    }

    /// Detector configured from the per-user config file, or defaults.
    pub fn from_default_config() -> Result<Self> {
        let config = DetectorConfig::load_default()?;
        log::debug!("Detector config:\n{}", config.summary());
        Ok(Self::new(config))
    }

    pub fn manager(&self) -> &ModelManager {
        &self.manager
    }

    pub fn config(&self) -> &DetectorConfig {
        self.manager.config()
    }

    /// Loads a model; the previous one is unloaded first even if this fails.
    pub fn load_model<P: AsRef<Path>>(&self, model_type: ModelType, path: P) -> LoadStatus {
        match self.try_load_model(model_type, path) {
            Ok(handle) => LoadStatus {
                loaded: true,
                status: format!(
                    "Loaded {} model '{}' with {} classes",
                    handle.model_type(),
                    handle.name(),
                    handle.class_names().len()
                ),
            },
            Err(err) => {
                log::error!("{err}");
                LoadStatus {
                    loaded: false,
                    status: err.to_string(),
                }
            }
        }
    }

    pub fn try_load_model<P: AsRef<Path>>(&self, model_type: ModelType, path: P) -> Result<Arc<ModelHandle>> {
        self.manager.load_model(model_type, path)
    }

    pub fn unload_model(&self) -> bool {
        self.manager.unload_model()
    }

    pub fn is_model_loaded(&self) -> bool {
        self.manager.is_loaded()
    }

    pub fn model_info(&self) -> String {
        self.manager.model_info()
    }

    pub fn supported_model_types(&self) -> Vec<ModelType> {
        ModelManager::supported_model_types()
    }

    /// Detections for one image. An empty list means nothing was found.
    /// Fails with [`DetectError::NoActiveModel`] before touching the image when
    /// no model is loaded.
    pub fn infer_single(&self, image: &ImageRef, conf_threshold: f32) -> Result<Vec<Detection>> {
        let handle = self.manager.acquire()?;
        let image = image.load()?;
        handle.detect(&image, conf_threshold, self.config())
    }

    /// Blocking batch run. Per-item failures show up as empty entries.
    pub fn infer_batch(&self, job: BatchJob, sink: Option<&dyn ProgressSink>) -> Result<BatchOutput> {
        let handle = self.manager.acquire()?;
        batch_runner::run_batch(handle, job, self.config(), sink)
    }

    /// Batch run on a background thread; poll or cancel it through the handle.
    pub fn spawn_batch(&self, job: BatchJob, sink: Option<Arc<dyn ProgressSink>>) -> Result<BatchHandle> {
        let handle = self.manager.acquire()?;
        batch_runner::spawn_batch(handle, job, self.config().clone(), sink)
    }

    /// Batch run on tokio's blocking pool.
    pub async fn infer_batch_async(&self, job: BatchJob, sink: Option<Arc<dyn ProgressSink>>) -> Result<BatchOutput> {
        let handle = self.manager.acquire()?;
        let config = self.config().clone();

        tokio::task::spawn_blocking(move || {
            let sink = sink.as_deref();
            batch_runner::run_batch(handle, job, &config, sink)
        })
        .await
        .map_err(|e| DetectError::InferenceExecution(format!("batch task failed: {e}")))?
    }
}
