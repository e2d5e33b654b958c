//! Output schema classification.
//!
//! An exported detection model declares its output tensors with nothing but
//! a shape and an element type, and different converters order them
//! differently. This module assigns each output a semantic role (boxes,
//! scores, classes, detection count) from shape matching plus a value-range
//! probe over one real inference pass.

use tracing::debug;

use ssdec_inference::{OutputTensor, TensorDescriptor};

use crate::error::SchemaError;

/// The four output roles of the canonical SSD detection layout, resolved to
/// concrete tensors. Classification is all-or-nothing: either every role is
/// assigned or it fails as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSchema {
    /// Bounding boxes, shape `[1, N, 4]`, coords `[ymin, xmin, ymax, xmax]`.
    pub boxes: TensorDescriptor,
    /// Confidence scores, shape `[1, N]`.
    pub scores: TensorDescriptor,
    /// Class indices, shape `[1, N]`.
    pub classes: TensorDescriptor,
    /// Realized detection count, shape `[1]`.
    pub count: TensorDescriptor,
}

/// Classify output descriptors into an [`OutputSchema`].
///
/// `outputs` are the session's output descriptors in declaration order and
/// `samples` the matching materialized tensors from one completed
/// invocation, in the same order. The function is pure: identical inputs
/// classify identically, and no inference is triggered here.
///
/// Roles are resolved by shape first (first match in declaration order):
/// boxes `[1, N, 4]`, count `[1]`, then the remaining rank-2 `[1, N]`
/// tensors as scores/classes candidates. Exactly two candidates are
/// required; with more, the declaration order would decide which pair wins,
/// and that is a guess this function refuses to make.
pub fn classify_outputs(
    outputs: &[TensorDescriptor],
    samples: &[OutputTensor],
) -> Result<OutputSchema, SchemaError> {
    let boxes_pos = outputs
        .iter()
        .position(|d| d.rank() == 3 && d.shape.first() == Some(&1) && d.shape.last() == Some(&4))
        .ok_or(SchemaError::NoBoxes)?;

    let count_pos = outputs
        .iter()
        .position(|d| d.rank() == 1 && d.shape[0] == 1)
        .ok_or(SchemaError::NoCount)?;

    let boxes = &outputs[boxes_pos];
    let count = &outputs[count_pos];

    // Remaining [1, N] tensors are the scores/classes candidates.
    let vectors: Vec<(usize, &TensorDescriptor)> = outputs
        .iter()
        .enumerate()
        .filter(|&(pos, _)| pos != boxes_pos && pos != count_pos)
        .filter(|(_, d)| d.rank() == 2 && d.shape[0] == 1)
        .collect();

    if vectors.len() < 2 {
        return Err(SchemaError::NotEnoughVectors(vectors.len()));
    }
    if vectors.len() > 2 {
        return Err(SchemaError::TooManyVectors(vectors.len()));
    }

    let (a_pos, a) = vectors[0];
    let (b_pos, b) = vectors[1];

    let a_plausible = samples.get(a_pos).is_some_and(plausible_scores);
    let b_plausible = samples.get(b_pos).is_some_and(plausible_scores);

    let (scores, classes) = match (a_plausible, b_plausible) {
        (true, false) => (a, b),
        (false, true) => (b, a),
        (true, true) => return Err(SchemaError::BothPlausible),
        (false, false) => return Err(SchemaError::NeitherPlausible),
    };

    debug!(
        boxes = %boxes.name,
        scores = %scores.name,
        classes = %classes.name,
        count = %count.name,
        "classified output schema"
    );

    Ok(OutputSchema {
        boxes: boxes.clone(),
        scores: scores.clone(),
        classes: classes.clone(),
        count: count.clone(),
    })
}

/// Whether a materialized tensor looks like a scores tensor: every observed
/// value inside [0, 1] inclusive. An empty tensor is not plausible.
///
/// This is a heuristic, not a guarantee. A classes tensor that happens to
/// hold only 0s and 1s passes the probe and ends up misclassified; swapping
/// in a stronger signal (metadata tags, index-position defaults) only needs
/// to replace this function.
pub fn plausible_scores(sample: &OutputTensor) -> bool {
    match sample.value_range() {
        Some((lo, hi)) => (0.0..=1.0).contains(&lo) && (0.0..=1.0).contains(&hi),
        None => false,
    }
}
