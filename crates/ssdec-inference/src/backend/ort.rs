//! ONNX Runtime (ort) session for native platforms.

use std::path::Path;

use ndarray::ArrayD;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::{Tensor, TensorElementType, ValueType};
use tracing::debug;

use crate::error::InferenceError;
use crate::tensor::{ElementType, InputTensor, OutputTensor, TensorDescriptor};
use crate::{ModelSession, Result};

/// Session backed by ONNX Runtime.
///
/// Inputs staged with `set_input` are held until `invoke` runs them in one
/// pass; outputs are cached so `read_output` can hand out any tensor of the
/// most recent invocation. Output descriptor shapes start from the model's
/// declared metadata and are refreshed from the realized tensors after the
/// first invocation, which resolves dynamic dimensions.
pub struct OrtSession {
    session: Session,
    inputs: Vec<TensorDescriptor>,
    outputs: Vec<TensorDescriptor>,
    staged: Vec<Option<InputTensor>>,
    materialized: Vec<OutputTensor>,
}

impl OrtSession {
    /// Load a model from a file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading ONNX model from: {}", path.display());

        let bytes = std::fs::read(path).map_err(InferenceError::Io)?;
        Self::from_bytes(&bytes)
    }

    /// Load a model from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        debug!("Loading ONNX model from {} bytes", bytes.len());

        let session = Session::builder()
            .map_err(|e| InferenceError::SessionCreate(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| InferenceError::SessionCreate(e.to_string()))?
            .with_intra_threads(1)
            .map_err(|e| InferenceError::SessionCreate(e.to_string()))?
            .commit_from_memory(bytes)
            .map_err(|e| InferenceError::ModelLoad(e.to_string()))?;

        let inputs: Vec<TensorDescriptor> = session
            .inputs()
            .iter()
            .enumerate()
            .map(|(index, i)| descriptor_from(index, i.name(), i.dtype()))
            .collect();

        let outputs: Vec<TensorDescriptor> = session
            .outputs()
            .iter()
            .enumerate()
            .map(|(index, o)| descriptor_from(index, o.name(), o.dtype()))
            .collect();

        debug!("Model inputs: {:?}", inputs);
        debug!("Model outputs: {:?}", outputs);

        let staged = vec![None; inputs.len()];

        Ok(Self {
            session,
            inputs,
            outputs,
            staged,
            materialized: Vec::new(),
        })
    }

    fn convert_input(tensor: &InputTensor) -> Result<ort::session::SessionInputValue<'static>> {
        match tensor {
            InputTensor::Float32(arr) => {
                let shape: Vec<i64> = arr.shape().iter().map(|&s| s as i64).collect();
                let data: Vec<f32> = arr.iter().cloned().collect();
                Tensor::from_array((shape, data))
                    .map(Into::into)
                    .map_err(|e| InferenceError::InvalidInput(e.to_string()))
            }
            InputTensor::Uint8(arr) => {
                let shape: Vec<i64> = arr.shape().iter().map(|&s| s as i64).collect();
                let data: Vec<u8> = arr.iter().cloned().collect();
                Tensor::from_array((shape, data))
                    .map(Into::into)
                    .map_err(|e| InferenceError::InvalidInput(e.to_string()))
            }
        }
    }
}

impl ModelSession for OrtSession {
    fn inputs(&self) -> &[TensorDescriptor] {
        &self.inputs
    }

    fn outputs(&self) -> &[TensorDescriptor] {
        &self.outputs
    }

    fn set_input(&mut self, descriptor: &TensorDescriptor, tensor: InputTensor) -> Result<()> {
        let slot = self
            .staged
            .get_mut(descriptor.index)
            .ok_or_else(|| InferenceError::UnknownTensor(descriptor.name.clone()))?;
        *slot = Some(tensor);
        Ok(())
    }

    fn invoke(&mut self) -> Result<()> {
        let mut ort_inputs: Vec<(&str, ort::session::SessionInputValue<'static>)> =
            Vec::with_capacity(self.inputs.len());
        for (desc, staged) in self.inputs.iter().zip(&self.staged) {
            let tensor = staged.as_ref().ok_or_else(|| {
                InferenceError::InvalidInput(format!("input '{}' not staged", desc.name))
            })?;
            ort_inputs.push((desc.name.as_str(), Self::convert_input(tensor)?));
        }

        let run_outputs = self
            .session
            .run(ort_inputs)
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        let mut results: Vec<Option<OutputTensor>> = vec![None; self.outputs.len()];
        for (name, value) in run_outputs.iter() {
            let position = self
                .outputs
                .iter()
                .position(|d| d.name == name)
                .ok_or_else(|| InferenceError::UnknownTensor(name.to_string()))?;

            let tensor = if let Ok((shape_ref, data)) = value.try_extract_tensor::<f32>() {
                let shape: Vec<usize> = shape_ref.iter().map(|&s| s as usize).collect();
                let arr = ArrayD::from_shape_vec(ndarray::IxDyn(&shape), data.to_vec())
                    .map_err(|e| InferenceError::OutputRead(e.to_string()))?;
                OutputTensor::Float32(arr)
            } else if let Ok((shape_ref, data)) = value.try_extract_tensor::<i64>() {
                let shape: Vec<usize> = shape_ref.iter().map(|&s| s as usize).collect();
                let arr = ArrayD::from_shape_vec(ndarray::IxDyn(&shape), data.to_vec())
                    .map_err(|e| InferenceError::OutputRead(e.to_string()))?;
                OutputTensor::Int64(arr)
            } else if let Ok((shape_ref, data)) = value.try_extract_tensor::<i32>() {
                let shape: Vec<usize> = shape_ref.iter().map(|&s| s as usize).collect();
                let arr = ArrayD::from_shape_vec(ndarray::IxDyn(&shape), data.to_vec())
                    .map_err(|e| InferenceError::OutputRead(e.to_string()))?;
                OutputTensor::Int32(arr)
            } else if let Ok((shape_ref, data)) = value.try_extract_tensor::<f64>() {
                let shape: Vec<usize> = shape_ref.iter().map(|&s| s as usize).collect();
                let arr = ArrayD::from_shape_vec(ndarray::IxDyn(&shape), data.to_vec())
                    .map_err(|e| InferenceError::OutputRead(e.to_string()))?;
                OutputTensor::Float64(arr)
            } else if let Ok((shape_ref, data)) = value.try_extract_tensor::<u8>() {
                let shape: Vec<usize> = shape_ref.iter().map(|&s| s as usize).collect();
                let arr = ArrayD::from_shape_vec(ndarray::IxDyn(&shape), data.to_vec())
                    .map_err(|e| InferenceError::OutputRead(e.to_string()))?;
                OutputTensor::Uint8(arr)
            } else {
                return Err(InferenceError::OutputRead(format!(
                    "unsupported output type for '{name}'"
                )));
            };

            results[position] = Some(tensor);
        }

        self.materialized = results
            .into_iter()
            .enumerate()
            .map(|(index, t)| {
                t.ok_or_else(|| {
                    InferenceError::OutputRead(format!(
                        "output '{}' missing from run results",
                        self.outputs[index].name
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // Dynamic dims in the declared metadata resolve to concrete sizes now.
        for (desc, tensor) in self.outputs.iter_mut().zip(&self.materialized) {
            desc.shape = tensor.shape().to_vec();
            desc.dtype = tensor.dtype();
        }

        Ok(())
    }

    fn read_output(&self, descriptor: &TensorDescriptor) -> Result<OutputTensor> {
        if self.materialized.is_empty() {
            return Err(InferenceError::NotInvoked(descriptor.name.clone()));
        }
        self.materialized
            .get(descriptor.index)
            .cloned()
            .ok_or_else(|| InferenceError::UnknownTensor(descriptor.name.clone()))
    }
}

fn descriptor_from(index: usize, name: &str, value_type: &ValueType) -> TensorDescriptor {
    let shape: Vec<usize> = value_type
        .tensor_shape()
        .map(|dims| dims.iter().map(|&d| d.max(0) as usize).collect())
        .unwrap_or_default();

    let dtype = match value_type.tensor_type() {
        Some(TensorElementType::Uint8) => ElementType::Uint8,
        Some(TensorElementType::Int32) => ElementType::Int32,
        Some(TensorElementType::Int64) => ElementType::Int64,
        Some(TensorElementType::Float64) => ElementType::Float64,
        _ => ElementType::Float32,
    };

    TensorDescriptor {
        name: name.to_string(),
        shape,
        dtype,
        index,
    }
}
