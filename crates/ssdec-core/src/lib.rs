//! Core library for ssdec.
//!
//! This crate provides:
//! - Output schema classification for SSD-style detection models whose
//!   exported tensor layout is not known in advance
//! - Decoding of classified output tensors into labeled detections
//! - The pipeline driver tying a model session, an image, and a label
//!   map into one invoke-then-decode cycle

pub mod config;
pub mod decode;
pub mod error;
pub mod labels;
pub mod pipeline;
pub mod preprocess;
pub mod report;
pub mod schema;

pub use config::{DetectConfig, SsdecConfig};
pub use decode::{BoundingBox, Detection, DetectionTensors, decode_detections};
pub use error::{DecodeError, Result, SchemaError, SsdecError};
pub use labels::LabelMap;
pub use pipeline::Detector;
pub use report::ModelReport;
pub use schema::{OutputSchema, classify_outputs, plausible_scores};

/// Re-export session types.
pub use ssdec_inference::{
    ElementType, InferenceError, InputTensor, ModelSession, OutputTensor, TensorDescriptor,
};

#[cfg(feature = "native")]
pub use ssdec_inference::OrtSession;
