use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("Model load failed: {0}")]
    ModelLoad(String),

    #[error("Unsupported output layout: {shape:?}")]
    UnsupportedOutputLayout { shape: Vec<usize> },

    #[error("Inference execution failed: {0}")]
    InferenceExecution(String),

    #[error("Image decode failed: {0}")]
    ImageDecode(String),

    #[error("No active model loaded")]
    NoActiveModel,

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl DetectError {
    pub fn model_load(err: impl std::fmt::Display) -> Self {
        DetectError::ModelLoad(err.to_string())
    }

    pub fn inference(err: impl std::fmt::Display) -> Self {
        DetectError::InferenceExecution(err.to_string())
    }

    pub fn image_decode(err: impl std::fmt::Display) -> Self {
        DetectError::ImageDecode(err.to_string())
    }
}
