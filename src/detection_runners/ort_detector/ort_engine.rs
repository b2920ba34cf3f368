//! ONNX Runtime backend.

use std::path::Path;
use anyhow::Result;
use half::f16;
use ndarray::{Array, IxDyn};
use ort::{
    execution_providers::{ExecutionProvider,
                          CPUExecutionProvider,
                          CUDAExecutionProvider,
                          TensorRTExecutionProvider,
                          CoreMLExecutionProvider},
    session::builder::{GraphOptimizationLevel, SessionBuilder},
    session::Session,
    value::{DynValue, TensorRef},
};
use parking_lot::Mutex;
use crate::common::{DetectorConfig, InferenceDevice, ModelType};
use crate::data::{parse_embedded_names, CROSS_MARK};
use crate::detection_runners::inference_process::{InferenceSession, SessionLoader};
use crate::detection_runners::input_wrapper::X;
use crate::errors::DetectError;

/// ONNX Runtime session. `Session::run` needs `&mut`, so calls are serialised
/// behind a mutex; preprocessing and decoding still overlap across workers.
#[derive(Debug)]
pub struct OrtSession {
    session: Mutex<Session>,
    device: InferenceDevice,
    labels: Option<Vec<String>>,
}

impl OrtSession {
    pub fn new(path: &Path, config: &DetectorConfig) -> Result<Self> {
        let mut builder = Session::builder()?;

        let mut device = config.inference_device;
        match device {
            InferenceDevice::TensorRt(device_id) => {
                Self::build_trt(&mut builder, device_id).unwrap_or_else(|err| {
                    log::warn!("{err}, Using cpu");
                    device = InferenceDevice::Cpu;
                })
            }
            InferenceDevice::Cuda(device_id) => {
                Self::build_cuda(&mut builder, device_id).unwrap_or_else(|err| {
                    log::warn!("{err}, Using cpu");
                    device = InferenceDevice::Cpu;
                })
            }
            InferenceDevice::CoreMl(_) => Self::build_coreml(&mut builder).unwrap_or_else(|err| {
                log::warn!("{err}, Using cpu");
                device = InferenceDevice::Cpu;
            }),
            InferenceDevice::Cpu => {}
        }
        if device == InferenceDevice::Cpu {
            Self::build_cpu(&mut builder)?;
        }

        let mut builder = builder.with_optimization_level(GraphOptimizationLevel::Level3)?;
        if let Some(n) = config.intra_threads {
            builder = builder.with_intra_threads(n)?;
        }
        let session = builder.commit_from_file(path)?;

        let labels = Self::try_fetch(&session, "names").and_then(|raw| parse_embedded_names(&raw));

        log::info!(
            "Backend: ONNXRuntime | Device: {} | Embedded labels: {}",
            device,
            labels.as_ref().map_or(0, |l| l.len()),
        );

        Ok(Self {
            session: Mutex::new(session),
            device,
            labels,
        })
    }

    fn build_trt(builder: &mut SessionBuilder, device_id: usize) -> Result<()> {
        let trt = TensorRTExecutionProvider::default()
            .with_device_id(device_id as i32)
            .with_engine_cache(true)
            .with_engine_cache_path("trt-cache");
        if trt.is_available()? {
            match trt.register(builder) {
                Ok(_) => { }
                Err(err) => { anyhow::bail!("{CROSS_MARK} TensorRT initialization failed: {:?}", err) }
            }
            log::info!("Initial model serialization with TensorRT may take some time...");
            Ok(())
        } else {
            anyhow::bail!("{CROSS_MARK} TensorRT execution provider not available")
        }
    }

    fn build_cuda(builder: &mut SessionBuilder, device_id: usize) -> Result<()> {
        let ep = CUDAExecutionProvider::default().with_device_id(device_id as i32);
        if ep.is_available()? {
            match ep.register(builder) {
                Ok(_) => { }
                Err(err) => { anyhow::bail!("{CROSS_MARK} CUDA initialization failed: {:?}", err) }
            }
            Ok(())
        } else {
            anyhow::bail!("{CROSS_MARK} CUDA execution provider not available")
        }
    }

    fn build_coreml(builder: &mut SessionBuilder) -> Result<()> {
        let ep = CoreMLExecutionProvider::default().with_subgraphs(false);
        if ep.is_available()? {
            match ep.register(builder) {
                Ok(_) => { }
                Err(err) => { anyhow::bail!("{CROSS_MARK} CoreML initialization failed: {:?}", err) }
            }
            Ok(())
        } else {
            anyhow::bail!("{CROSS_MARK} CoreML execution provider not available")
        }
    }

    fn build_cpu(builder: &mut SessionBuilder) -> Result<()> {
        let ep = CPUExecutionProvider::default();
        match ep.register(builder) {
            Ok(_) => Ok(()),
            Err(err) => anyhow::bail!("{CROSS_MARK} CPU initialization failed: {:?}", err),
        }
    }

    /// Reads a custom metadata entry, e.g. the `names` map written by exporters.
    fn try_fetch(session: &Session, key: &str) -> Option<String> {
        match session.metadata() {
            Err(_) => None,
            Ok(metadata) => metadata.custom(key).unwrap_or_default(),
        }
    }

    /// Converts the output tensor to f32; half-precision exports are widened.
    fn tensor_postprocess(y: &DynValue) -> Result<Array<f32, IxDyn>> {
        if let Ok(x) = y.try_extract_array::<f32>() {
            return Ok(x.into_owned());
        }
        let x = y.try_extract_array::<f16>()?;
        Ok(x.mapv(f16::to_f32))
    }

    pub fn device(&self) -> InferenceDevice {
        self.device
    }
}

impl InferenceSession for OrtSession {
    fn run(&self, input: &X) -> crate::Result<X> {
        let tensor = TensorRef::from_array_view(input.0.view()).map_err(DetectError::inference)?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(DetectError::inference)?;
        let y = Self::tensor_postprocess(&outputs[0]).map_err(DetectError::inference)?;

        Ok(X::from(y))
    }

    fn embedded_labels(&self) -> Option<Vec<String>> {
        self.labels.clone()
    }

    fn name(&self) -> &str {
        "onnxruntime"
    }
}

/// Default loader: builds an [`OrtSession`] on the configured device.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrtSessionLoader;

impl SessionLoader for OrtSessionLoader {
    fn load(&self, model_type: ModelType, path: &Path, config: &DetectorConfig) -> crate::Result<Box<dyn InferenceSession>> {
        if !path.is_file() {
            return Err(DetectError::ModelLoad(format!("model file not found: {}", path.display())));
        }
        log::info!("Initializing ORT session for {} model with ({}) execution provider", model_type, config.inference_device);

        let session = OrtSession::new(path, config).map_err(DetectError::model_load)?;
        Ok(Box::new(session))
    }
}
