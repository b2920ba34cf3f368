mod bbox;
mod detection;
mod image_ref;
mod inference_device;
mod inference_progress;
mod letterbox;
mod model_config;
mod model_type;

pub use bbox::*;
pub use detection::*;
pub use image_ref::*;
pub use inference_device::*;
pub use inference_progress::*;
pub use letterbox::*;
pub use model_config::*;
pub use model_type::*;
