//! Model session abstraction for ssdec.
//!
//! This crate defines the contract between the detection pipeline and an
//! inference engine: tensor descriptors, materialized tensors, and the
//! [`ModelSession`] trait with its set-input / invoke / read-output cycle.
//! The `native` feature provides an ONNX Runtime backed implementation.

mod backend;
mod error;
mod tensor;

pub use backend::ModelSession;
pub use error::InferenceError;
pub use tensor::{ElementType, InputTensor, OutputTensor, TensorDescriptor};

#[cfg(feature = "native")]
pub use backend::ort::OrtSession;

/// Result type for inference operations.
pub type Result<T> = std::result::Result<T, InferenceError>;
