//! Error types for the ssdec-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the ssdec library.
#[derive(Error, Debug)]
pub enum SsdecError {
    /// A required file is missing.
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Output schema classification failed.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Detection decoding failed.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Error from the session layer.
    #[error("inference error: {0}")]
    Inference(#[from] ssdec_inference::InferenceError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Reasons output schema classification can fail.
///
/// The unsupported-layout variants (missing tensors, wrong candidate counts)
/// are kept apart from the ambiguous ones so callers can tell "not found"
/// from "found but undecidable".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// No rank-3 tensor shaped `[1, N, 4]`.
    #[error("no boxes tensor: expected a [1, N, 4] output")]
    NoBoxes,

    /// No rank-1 tensor shaped `[1]`.
    #[error("no detection-count tensor: expected a [1] output")]
    NoCount,

    /// Fewer than two rank-2 `[1, N]` candidates for scores/classes.
    #[error("cannot find score/class vectors: {0} [1, N] candidate(s), need 2")]
    NotEnoughVectors(usize),

    /// More than two rank-2 `[1, N]` candidates remain after boxes and
    /// count are taken; picking a pair silently would be a guess.
    #[error("{0} [1, N] candidates found; refusing to pick two")]
    TooManyVectors(usize),

    /// Both vector candidates have sample values inside [0, 1].
    #[error("ambiguous score/class vectors: both candidates lie within [0, 1]")]
    BothPlausible,

    /// Neither vector candidate has sample values inside [0, 1].
    #[error("ambiguous score/class vectors: neither candidate lies within [0, 1]")]
    NeitherPlausible,
}

impl SchemaError {
    /// Whether this failure is the value-range heuristic giving up, as
    /// opposed to the layout lacking the required tensors.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, SchemaError::BothPlausible | SchemaError::NeitherPlausible)
    }
}

/// Reasons detection decoding can fail.
///
/// Both variants signal a provider-level contract violation and are fatal;
/// recoverable oddities (bad count value, out-of-range class index) are
/// handled inside the decoder instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A materialized tensor's shape disagrees with its descriptor.
    #[error("shape mismatch for '{name}': declared {declared}, materialized {actual}")]
    ShapeMismatch {
        name: String,
        declared: String,
        actual: String,
    },

    /// Boxes, scores, and classes disagree on detection capacity N.
    #[error("capacity mismatch: boxes hold {boxes}, scores {scores}, classes {classes}")]
    CapacityMismatch {
        boxes: usize,
        scores: usize,
        classes: usize,
    },
}

/// Result type for the ssdec library.
pub type Result<T> = std::result::Result<T, SsdecError>;
