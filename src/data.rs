mod cancel_token;
mod class_names;
mod filesystem_access;
mod time_calc;
pub mod send_channels;

pub use cancel_token::CancelToken;
pub use class_names::*;
pub use send_channels::{progress_channel, ProgressReceiver, ProgressSender, ProgressSink};

pub use crate::detection_runners::ort_detector::input_wrapper::X;

pub use filesystem_access::FsAccess;
pub use time_calc::TimeCalc;

pub(crate) const CROSS_MARK: &str = "❌";
