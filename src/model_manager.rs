//! Owns the single active model and serialises load/unload.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use image::RgbImage;
use parking_lot::{Mutex, RwLock};
use crate::common::{Detection, DetectorConfig, ModelType};
use crate::data::ClassNames;
use crate::detection_processing;
use crate::detection_runners::inference_process::{InferenceSession, SessionLoader};
use crate::detection_runners::ort_detector::OrtSessionLoader;
use crate::errors::DetectError;
use crate::Result;

/// Immutable snapshot of a loaded model. Callers hold an `Arc` for the length of
/// a call, so a concurrent unload never pulls the session out from under them.
#[derive(Debug)]
pub struct ModelHandle {
    session: Box<dyn InferenceSession>,
    class_names: ClassNames,
    input_size: u32,
    name: String,
    model_type: ModelType,
    path: PathBuf,
    generation: u64,
}

impl ModelHandle {
    pub fn session(&self) -> &dyn InferenceSession {
        self.session.as_ref()
    }

    pub fn class_names(&self) -> &ClassNames {
        &self.class_names
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Increases with every successful load.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Runs the single-image pipeline against this model.
    pub fn detect(&self, image: &RgbImage, conf_threshold: f32, config: &DetectorConfig) -> Result<Vec<Detection>> {
        detection_processing::process_image(
            self.session(),
            image,
            &self.class_names,
            self.input_size,
            conf_threshold,
            config,
        )
    }
}

pub struct ModelManager {
    config: DetectorConfig,
    loader: Box<dyn SessionLoader>,
    active: RwLock<Option<Arc<ModelHandle>>>,
    swap_lock: Mutex<()>,
    generation: AtomicU64,
}

impl std::fmt::Debug for ModelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelManager")
            .field("config", &self.config)
            .field("active", &self.active.read().as_ref().map(|h| h.name.clone()))
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish()
    }
}

impl ModelManager {
    pub fn new(config: DetectorConfig) -> Self {
        Self::with_loader(config, OrtSessionLoader)
    }

    pub fn with_loader<L: SessionLoader + 'static>(config: DetectorConfig, loader: L) -> Self {
        Self {
            config,
            loader: Box::new(loader),
            active: RwLock::new(None),
            swap_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn supported_model_types() -> Vec<ModelType> {
        vec![ModelType::Yolo, ModelType::Custom]
    }

    /// Unloads the current model, then loads `path`. On failure no model is
    /// active afterwards; the previous one is not restored.
    pub fn load_model<P: AsRef<Path>>(&self, model_type: ModelType, path: P) -> Result<Arc<ModelHandle>> {
        let path = path.as_ref();
        let _swap = self.swap_lock.lock();

        self.take_active();

        if !model_type.is_detector() {
            return Err(DetectError::ModelLoad(format!(
                "{model_type} models are not supported by the detection backend"
            )));
        }

        let session = self.loader.load(model_type, path, &self.config)?;
        let class_names = ClassNames::resolve(
            session.embedded_labels(),
            self.config.labels_path.as_deref(),
            path,
        );
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let handle = Arc::new(ModelHandle {
            session,
            class_names,
            input_size: self.config.input_size,
            name,
            model_type,
            path: path.to_path_buf(),
            generation,
        });

        log::info!(
            "Loaded {} model '{}' ({} classes, input {}x{}, backend {}, generation {})",
            model_type,
            handle.name,
            handle.class_names.len(),
            handle.input_size,
            handle.input_size,
            handle.session.name(),
            generation,
        );
        *self.active.write() = Some(handle.clone());
        Ok(handle)
    }

    /// Returns whether a model was active.
    pub fn unload_model(&self) -> bool {
        let _swap = self.swap_lock.lock();
        self.take_active()
    }

    fn take_active(&self) -> bool {
        match self.active.write().take() {
            Some(handle) => {
                log::info!("Unloaded model '{}' (generation {})", handle.name, handle.generation);
                true
            }
            None => false,
        }
    }

    /// Snapshot of the active model, if any.
    pub fn current(&self) -> Option<Arc<ModelHandle>> {
        self.active.read().clone()
    }

    pub fn acquire(&self) -> Result<Arc<ModelHandle>> {
        self.current().ok_or(DetectError::NoActiveModel)
    }

    pub fn is_loaded(&self) -> bool {
        self.active.read().is_some()
    }

    pub fn model_info(&self) -> String {
        match self.current() {
            Some(handle) => format!("Model: {} (Type: {})", handle.name, handle.model_type),
            None => "No model loaded".to_string(),
        }
    }
}
