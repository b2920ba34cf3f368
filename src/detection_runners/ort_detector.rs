mod ort_engine;
mod output_decoder;
pub mod image_ops;
pub mod input_wrapper;
pub mod nms;

pub use ort_engine::*;
pub use output_decoder::*;
pub use nms::{nms, Nms};
