use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::common::inference_device::InferenceDevice;
use crate::data::FsAccess;
use crate::errors::DetectError;
use crate::Result;

pub const DEFAULT_INPUT_SIZE: u32 = 640;
pub const DEFAULT_CONF_THRESHOLD: f32 = 0.5;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;
pub const MAX_DEFAULT_CONCURRENCY: usize = 4;
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub input_size: u32,
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    pub pad_value: u8,
    pub class_aware_nms: bool,
    pub max_concurrency: Option<usize>,
    pub inference_device: InferenceDevice,
    pub intra_threads: Option<usize>,
    pub labels_path: Option<PathBuf>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            input_size: DEFAULT_INPUT_SIZE,
            conf_threshold: DEFAULT_CONF_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            pad_value: 0,
            class_aware_nms: false,
            max_concurrency: None,
            inference_device: InferenceDevice::Cpu,
            intra_threads: None,
            labels_path: None,
        }
    }
}

impl DetectorConfig {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_input_size(mut self, n: u32) -> Self {
        self.input_size = n;
        self
    }

    pub fn with_conf_threshold(mut self, x: f32) -> Self {
        self.conf_threshold = x;
        self
    }

    pub fn with_iou_threshold(mut self, x: f32) -> Self {
        self.iou_threshold = x;
        self
    }

    pub fn with_pad_value(mut self, x: u8) -> Self {
        self.pad_value = x;
        self
    }

    pub fn with_class_aware_nms(mut self, x: bool) -> Self {
        self.class_aware_nms = x;
        self
    }

    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = Some(n);
        self
    }

    pub fn with_device(mut self, device: InferenceDevice) -> Self {
        self.inference_device = device;
        self
    }

    pub fn with_intra_threads(mut self, n: usize) -> Self {
        self.intra_threads = Some(n);
        self
    }

    pub fn with_labels_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.labels_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Worker count for batch runs: the configured cap, otherwise
    /// `min(available_parallelism, 4)`. Never below one.
    pub fn concurrency(&self) -> usize {
        match self.max_concurrency {
            Some(n) => n.max(1),
            None => default_concurrency(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 {
            return Err(DetectError::Config("input_size must be non-zero".to_string()));
        }
        if !(0.0..=1.0).contains(&self.conf_threshold) {
            return Err(DetectError::Config(format!(
                "conf_threshold {} outside [0, 1]",
                self.conf_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(DetectError::Config(format!(
                "iou_threshold {} outside [0, 1]",
                self.iou_threshold
            )));
        }
        Ok(())
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: DetectorConfig = serde_json::from_str(&raw)
            .map_err(|e| DetectError::Config(format!("{}: {e}", path.as_ref().display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `<config_dir>/assist_detect/config.json` (falling back to
    /// `~/.assist_detect/config.json`), or defaults when there is none.
    pub fn load_default() -> Result<Self> {
        let path = FsAccess::first_available()
            .map_err(|e| DetectError::Config(e.to_string()))?
            .join(CONFIG_FILE_NAME);
        if path.exists() {
            log::info!("Loading detector config from {}", path.display());
            Self::from_json_file(path)
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn summary(&self) -> String {
        format!("Model Input Resolution: {0}x{0}\n\
        Detection Threshold: {1}\n\
        NMS IoU Threshold: {2} ({3})\n\
        Inference Device: {4}\n\
        Batch Concurrency: {5}\n\
        Labels Path: {6}",
                self.input_size, self.conf_threshold, self.iou_threshold,
                if self.class_aware_nms { "class-aware" } else { "class-agnostic" },
                self.inference_device, self.concurrency(),
                self.labels_path.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "auto".to_string()))
    }
}

pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_DEFAULT_CONCURRENCY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_values() {
        let config = DetectorConfig::default();
        assert_eq!(config.input_size, 640);
        assert_eq!(config.iou_threshold, 0.45);
        assert_eq!(config.pad_value, 0);
        assert!(!config.class_aware_nms);
        assert!(config.concurrency() >= 1 && config.concurrency() <= 4);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"input_size": 320, "inference_device": {{"cuda": 1}}}}"#).unwrap();

        let config = DetectorConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.input_size, 320);
        assert_eq!(config.inference_device, InferenceDevice::Cuda(1));
        assert_eq!(config.conf_threshold, DEFAULT_CONF_THRESHOLD);
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"conf_threshold": 1.5}}"#).unwrap();
        assert!(matches!(
            DetectorConfig::from_json_file(file.path()),
            Err(DetectError::Config(_))
        ));
    }

    #[test]
    fn explicit_concurrency_is_at_least_one() {
        assert_eq!(DetectorConfig::new().with_max_concurrency(0).concurrency(), 1);
        assert_eq!(DetectorConfig::new().with_max_concurrency(8).concurrency(), 8);
    }
}
