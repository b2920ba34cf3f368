//! Object-detection inference core for an annotation tool's AI-assist feature.
//!
//! Letterboxes images into a square model input, runs a loaded detection model,
//! decodes either of the two common YOLO-style output layouts, suppresses
//! duplicates and maps boxes back into original-image space. Batches are spread
//! over a bounded worker pool with progress reporting and cooperative
//! cancellation.
//!
//! ```no_run
//! use assist_detect::{Detector, DetectorConfig, ImageRef, ModelType};
//!
//! let detector = Detector::new(DetectorConfig::default());
//! let status = detector.load_model(ModelType::Yolo, "models/yolov8n.onnx");
//! assert!(status.loaded, "{}", status.status);
//!
//! let detections = detector.infer_single(&ImageRef::from_path("street.jpg"), 0.5)?;
//! for d in &detections {
//!     println!("{} at ({:.0}, {:.0}, {:.0}, {:.0})", d.display_label(), d.x1, d.y1, d.x2, d.y2);
//! }
//! # Ok::<(), assist_detect::DetectError>(())
//! ```

mod utils;
mod detectors;
mod detection_processing;
mod errors;
mod model_manager;
pub mod data;
pub mod detection_runners;
pub mod common;

pub use common::{Candidate, Detection, DetectorConfig, ImageRef, InferenceDevice, InferenceProgress, LetterboxTransform, ModelType};
pub use data::{progress_channel, CancelToken, ClassNames, LabelSource, ProgressReceiver, ProgressSender, ProgressSink};
pub use detection_processing::{build_detections, process_image, process_predictions, remap};
pub use detection_runners::{BatchHandle, BatchJob, BatchOutput, InferenceSession, OrtSession, OrtSessionLoader, OutputLayout, SessionLoader};
pub use detectors::{Detector, LoadStatus};
pub use errors::DetectError;
pub use model_manager::{ModelHandle, ModelManager};

pub type Result<T, E = DetectError> = std::result::Result<T, E>;
