//! Error types for the session layer.

use thiserror::Error;

/// Errors that can occur while driving a model session.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// Failed to load the model file.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Failed to create an inference session.
    #[error("failed to create session: {0}")]
    SessionCreate(String),

    /// Invalid input tensor shape or type.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Inference invocation failed.
    #[error("inference failed: {0}")]
    InferenceFailed(String),

    /// Output tensor extraction failed.
    #[error("failed to read output: {0}")]
    OutputRead(String),

    /// A descriptor refers to a tensor the session does not know.
    #[error("unknown tensor: {0}")]
    UnknownTensor(String),

    /// An output was read before `invoke` populated it.
    #[error("output '{0}' read before invocation")]
    NotInvoked(String),

    /// I/O error when loading model files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
