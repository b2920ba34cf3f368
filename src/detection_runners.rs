pub mod batch_runner;
pub mod inference_process;
pub mod ort_detector;

pub use batch_runner::{BatchHandle, BatchJob, BatchOutput};
pub use inference_process::{InferenceSession, SessionLoader};
pub use ort_detector::*;
