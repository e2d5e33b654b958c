//! Detection decoding.
//!
//! Turns the four classified output tensors of one invocation into a
//! filtered list of labeled detections. The decoder trusts the model's own
//! ranking (index order) and performs no coordinate transform; boxes come
//! out exactly as the model produced them, normalized to [0, 1].

use ndarray::Axis;
use serde::Serialize;
use tracing::{debug, warn};

use ssdec_inference::OutputTensor;

use crate::error::DecodeError;
use crate::labels::LabelMap;
use crate::schema::OutputSchema;

/// Axis-aligned bounding box in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub ymin: f32,
    pub xmin: f32,
    pub ymax: f32,
    pub xmax: f32,
}

/// One decoded detection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    /// Resolved label, or the stringified class index when no label exists.
    pub label: String,
    /// Raw class index as reported by the model.
    pub class_id: i64,
    /// Confidence score.
    pub score: f32,
    /// Normalized bounding box, `[ymin, xmin, ymax, xmax]` order.
    pub bbox: BoundingBox,
}

/// The four materialized tensors of one invocation, keyed by role.
#[derive(Debug, Clone)]
pub struct DetectionTensors {
    pub boxes: OutputTensor,
    pub scores: OutputTensor,
    pub classes: OutputTensor,
    pub count: OutputTensor,
}

/// Decode classified tensors into detections at or above `score_threshold`.
///
/// Detections come back in index order, the model's own ranking; callers
/// wanting score order must sort themselves. The threshold is taken as-is:
/// a value above 1 yields nothing, zero or below yields every available
/// detection.
pub fn decode_detections(
    schema: &OutputSchema,
    outputs: &DetectionTensors,
    score_threshold: f32,
    labels: &LabelMap,
) -> Result<Vec<Detection>, DecodeError> {
    check_shape(&schema.boxes.name, &schema.boxes.shape, &outputs.boxes)?;
    check_shape(&schema.scores.name, &schema.scores.shape, &outputs.scores)?;
    check_shape(&schema.classes.name, &schema.classes.shape, &outputs.classes)?;
    check_shape(&schema.count.name, &schema.count.shape, &outputs.count)?;

    let boxes_full = outputs.boxes.to_f32();
    let scores_full = outputs.scores.to_f32();
    let classes_full = outputs.classes.to_f32();

    // Drop the leading batch dimension: [N, 4], [N], [N].
    let boxes = boxes_full.index_axis(Axis(0), 0);
    let scores = scores_full.index_axis(Axis(0), 0);
    let classes = classes_full.index_axis(Axis(0), 0);

    let n_boxes = boxes.shape()[0];
    let n_scores = scores.shape()[0];
    let n_classes = classes.shape()[0];
    if n_boxes != n_scores || n_boxes != n_classes {
        return Err(DecodeError::CapacityMismatch {
            boxes: n_boxes,
            scores: n_scores,
            classes: n_classes,
        });
    }
    let capacity = n_boxes;

    let effective_count = effective_count(&outputs.count, capacity);

    let mut detections = Vec::new();
    for i in 0..effective_count {
        let score = scores[[i]];
        // No early break: sortedness of the score array is not assumed.
        if score < score_threshold {
            continue;
        }

        let class_id = classes[[i]] as i64;
        detections.push(Detection {
            label: labels.resolve(class_id),
            class_id,
            score,
            bbox: BoundingBox {
                ymin: boxes[[i, 0]],
                xmin: boxes[[i, 1]],
                ymax: boxes[[i, 2]],
                xmax: boxes[[i, 3]],
            },
        });
    }

    debug!(
        kept = detections.len(),
        scanned = effective_count,
        capacity,
        threshold = score_threshold,
        "decoded detections"
    );

    Ok(detections)
}

/// Iteration bound: the reported count clamped to capacity, falling back to
/// full capacity when the model reports garbage.
fn effective_count(count: &OutputTensor, capacity: usize) -> usize {
    let reported = match count.scalar() {
        Some(v) if v.is_finite() && v >= 0.0 => v as usize,
        other => {
            warn!(?other, "malformed detection count, falling back to capacity");
            return capacity;
        }
    };
    reported.min(capacity)
}

fn check_shape(name: &str, declared: &[usize], actual: &OutputTensor) -> Result<(), DecodeError> {
    if actual.shape() != declared {
        return Err(DecodeError::ShapeMismatch {
            name: name.to_string(),
            declared: shape_string(declared),
            actual: shape_string(actual.shape()),
        });
    }
    Ok(())
}

fn shape_string(shape: &[usize]) -> String {
    let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
    format!("[{}]", dims.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ssdec_inference::{ElementType, TensorDescriptor};

    fn desc(name: &str, shape: &[usize], index: usize) -> TensorDescriptor {
        TensorDescriptor {
            name: name.into(),
            shape: shape.to_vec(),
            dtype: ElementType::Float32,
            index,
        }
    }

    fn tensor(values: &[f32], shape: &[usize]) -> OutputTensor {
        OutputTensor::from_f32(values.to_vec(), shape).unwrap()
    }

    fn schema_n3() -> OutputSchema {
        OutputSchema {
            boxes: desc("boxes", &[1, 3, 4], 0),
            classes: desc("classes", &[1, 3], 1),
            scores: desc("scores", &[1, 3], 2),
            count: desc("count", &[1], 3),
        }
    }

    fn tensors_n3(scores: &[f32; 3], classes: &[f32; 3], count: f32) -> DetectionTensors {
        DetectionTensors {
            boxes: tensor(
                &[
                    0.1, 0.2, 0.3, 0.4, //
                    0.2, 0.3, 0.4, 0.5, //
                    0.5, 0.6, 0.7, 0.8,
                ],
                &[1, 3, 4],
            ),
            scores: tensor(scores, &[1, 3]),
            classes: tensor(classes, &[1, 3]),
            count: tensor(&[count], &[1]),
        }
    }

    fn labels() -> LabelMap {
        LabelMap::from_lines("cat\ndog\nbird")
    }

    #[test]
    fn filters_by_threshold_in_index_order() {
        let out = tensors_n3(&[0.9, 0.3, 0.5], &[0.0, 1.0, 2.0], 3.0);
        let dets = decode_detections(&schema_n3(), &out, 0.4, &labels()).unwrap();

        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].label, "cat");
        assert_eq!(dets[0].score, 0.9);
        assert_eq!(dets[1].label, "bird");
        assert_eq!(dets[1].score, 0.5);
        assert_eq!(
            dets[0].bbox,
            BoundingBox {
                ymin: 0.1,
                xmin: 0.2,
                ymax: 0.3,
                xmax: 0.4
            }
        );
    }

    #[test]
    fn score_equal_to_threshold_is_included() {
        let out = tensors_n3(&[0.4, 0.39999, 0.0], &[0.0, 1.0, 2.0], 3.0);
        let dets = decode_detections(&schema_n3(), &out, 0.4, &labels()).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].label, "cat");
    }

    #[test]
    fn reported_count_is_clamped_to_capacity() {
        // Model claims 5 detections but the arrays only hold 3.
        let out = tensors_n3(&[0.9, 0.9, 0.9], &[0.0, 1.0, 2.0], 5.0);
        let dets = decode_detections(&schema_n3(), &out, 0.0, &labels()).unwrap();
        assert_eq!(dets.len(), 3);
    }

    #[test]
    fn count_limits_the_scan() {
        let out = tensors_n3(&[0.9, 0.9, 0.9], &[0.0, 1.0, 2.0], 2.0);
        let dets = decode_detections(&schema_n3(), &out, 0.0, &labels()).unwrap();
        assert_eq!(dets.len(), 2);
    }

    #[test]
    fn malformed_count_falls_back_to_capacity() {
        for bad in [f32::NAN, f32::INFINITY, -1.0] {
            let out = tensors_n3(&[0.9, 0.9, 0.9], &[0.0, 1.0, 2.0], bad);
            let dets = decode_detections(&schema_n3(), &out, 0.0, &labels()).unwrap();
            assert_eq!(dets.len(), 3);
        }
    }

    #[test]
    fn out_of_range_class_index_gets_numeric_label() {
        let out = tensors_n3(&[0.9, 0.0, 0.0], &[7.0, 0.0, 0.0], 3.0);
        let dets = decode_detections(&schema_n3(), &out, 0.5, &labels()).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].label, "7");
        assert_eq!(dets[0].class_id, 7);
    }

    #[test]
    fn threshold_above_one_yields_nothing() {
        let out = tensors_n3(&[1.0, 1.0, 1.0], &[0.0, 1.0, 2.0], 3.0);
        let dets = decode_detections(&schema_n3(), &out, 1.5, &labels()).unwrap();
        assert!(dets.is_empty());
    }

    #[test]
    fn threshold_at_or_below_zero_yields_everything() {
        let out = tensors_n3(&[0.0, 0.0, 0.0], &[0.0, 1.0, 2.0], 3.0);
        let dets = decode_detections(&schema_n3(), &out, -0.5, &labels()).unwrap();
        assert_eq!(dets.len(), 3);
    }

    #[test]
    fn no_early_break_on_unsorted_scores() {
        // Low score in the middle must not stop the scan.
        let out = tensors_n3(&[0.1, 0.9, 0.8], &[0.0, 1.0, 2.0], 3.0);
        let dets = decode_detections(&schema_n3(), &out, 0.5, &labels()).unwrap();
        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].label, "dog");
        assert_eq!(dets[1].label, "bird");
    }

    #[test]
    fn capacity_disagreement_is_fatal() {
        // Descriptors and tensors agree with each other, but boxes hold 3
        // detections while the vectors hold 5.
        let schema = OutputSchema {
            boxes: desc("boxes", &[1, 3, 4], 0),
            classes: desc("classes", &[1, 5], 1),
            scores: desc("scores", &[1, 5], 2),
            count: desc("count", &[1], 3),
        };
        let out = DetectionTensors {
            boxes: tensor(&[0.0; 12], &[1, 3, 4]),
            scores: tensor(&[0.9; 5], &[1, 5]),
            classes: tensor(&[0.0; 5], &[1, 5]),
            count: tensor(&[3.0], &[1]),
        };
        let err = decode_detections(&schema, &out, 0.4, &labels()).unwrap_err();
        assert_eq!(
            err,
            DecodeError::CapacityMismatch {
                boxes: 3,
                scores: 5,
                classes: 5
            }
        );
    }

    #[test]
    fn shape_mismatch_is_fatal() {
        let mut out = tensors_n3(&[0.9, 0.3, 0.5], &[0.0, 1.0, 2.0], 3.0);
        out.scores = tensor(&[0.9, 0.3], &[1, 2]);
        let err = decode_detections(&schema_n3(), &out, 0.4, &labels()).unwrap_err();
        assert!(matches!(err, DecodeError::ShapeMismatch { ref name, .. } if name == "scores"));
    }

    #[test]
    fn integer_class_tensor_decodes() {
        let mut out = tensors_n3(&[0.9, 0.3, 0.5], &[0.0, 0.0, 0.0], 3.0);
        out.classes = OutputTensor::Int64(
            ndarray::ArrayD::from_shape_vec(ndarray::IxDyn(&[1, 3]), vec![2, 1, 0]).unwrap(),
        );
        let mut schema = schema_n3();
        schema.classes.dtype = ElementType::Int64;
        let dets = decode_detections(&schema, &out, 0.0, &labels()).unwrap();
        assert_eq!(dets[0].label, "bird");
    }
}
