use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceDevice {
    #[default] Cpu,
    Cuda(usize),
    TensorRt(usize),
    CoreMl(usize),
}

// Hardcoded device names. Storing the "proper" spelling and the lowercase version.
const CPU: [&str; 2] = ["CPU", "cpu"];
const CUDA: [&str; 2] = ["CUDA", "cuda"];
const TENSOR_RT: [&str; 2] = ["TensorRT", "tensorrt"];
const CORE_ML: [&str; 2] = ["CoreML", "coreml"];

impl InferenceDevice {
    pub fn from_str(device: &str, device_id: usize) -> Option<Self> {
        match device.to_lowercase().as_str() {
            "cpu" => Some(InferenceDevice::Cpu),
            "cuda" => Some(InferenceDevice::Cuda(device_id)),
            "tensorrt" => Some(InferenceDevice::TensorRt(device_id)),
            "coreml" => Some(InferenceDevice::CoreMl(device_id)),
            _ => None,
        }
    }

    pub fn str(&self) -> &'static str {
        match self {
            InferenceDevice::Cpu => CPU[0],
            InferenceDevice::Cuda(_) => CUDA[0],
            InferenceDevice::TensorRt(_) => TENSOR_RT[0],
            InferenceDevice::CoreMl(_) => CORE_ML[0],
        }
    }

    pub fn str_lowercase(&self) -> &'static str {
        match self {
            InferenceDevice::Cpu => CPU[1],
            InferenceDevice::Cuda(_) => CUDA[1],
            InferenceDevice::TensorRt(_) => TENSOR_RT[1],
            InferenceDevice::CoreMl(_) => CORE_ML[1],
        }
    }

    pub fn device_id(&self) -> Option<usize> {
        match self {
            InferenceDevice::Cpu => None,
            InferenceDevice::Cuda(id) | InferenceDevice::TensorRt(id) | InferenceDevice::CoreMl(id) => Some(*id),
        }
    }

    pub fn all_inference_devices() -> Vec<String> {
        vec![
            InferenceDevice::Cpu.str_lowercase().to_string(),
            InferenceDevice::Cuda(0).str_lowercase().to_string(),
            InferenceDevice::TensorRt(0).str_lowercase().to_string(),
            InferenceDevice::CoreMl(0).str_lowercase().to_string(),
        ]
    }
}

impl std::fmt::Display for InferenceDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.device_id() {
            Some(id) => write!(f, "{}:{}", self.str(), id),
            None => write!(f, "{}", self.str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(InferenceDevice::from_str("CUDA", 1), Some(InferenceDevice::Cuda(1)));
        assert_eq!(InferenceDevice::from_str("TensorRT", 0), Some(InferenceDevice::TensorRt(0)));
        assert_eq!(InferenceDevice::from_str("vulkan", 0), None);
    }

    #[test]
    fn displays_with_device_id() {
        assert_eq!(InferenceDevice::Cpu.to_string(), "CPU");
        assert_eq!(InferenceDevice::Cuda(2).to_string(), "CUDA:2");
    }
}
