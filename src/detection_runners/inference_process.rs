use std::path::Path;
use crate::common::{DetectorConfig, ModelType};
use crate::data::X;
use crate::Result;

/// Black-box forward pass of a loaded model. Implementations must tolerate
/// concurrent `run` calls from several batch workers.
pub trait InferenceSession: Send + Sync + std::fmt::Debug {
    /// Runs the model on a `[1, 3, S, S]` input and returns its first output.
    fn run(&self, input: &X) -> Result<X>;

    /// Class names stored inside the model file, if any.
    fn embedded_labels(&self) -> Option<Vec<String>> {
        None
    }

    /// Backend name for status lines.
    fn name(&self) -> &str {
        "session"
    }
}

/// Builds sessions from model files. The model manager owns one of these.
pub trait SessionLoader: Send + Sync {
    fn load(&self, model_type: ModelType, path: &Path, config: &DetectorConfig) -> Result<Box<dyn InferenceSession>>;
}
