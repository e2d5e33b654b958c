//! Detection pipeline driver.

use image::DynamicImage;
use tracing::{debug, info};

use ssdec_inference::{InferenceError, ModelSession, OutputTensor, TensorDescriptor};

use crate::decode::{Detection, DetectionTensors, decode_detections};
use crate::error::Result;
use crate::labels::LabelMap;
use crate::preprocess;
use crate::report::ModelReport;
use crate::schema::classify_outputs;

/// Drives one model session through the invoke-then-decode cycle.
///
/// The session is explicitly owned, not ambient: independent detectors can
/// run side by side and tests supply fixtures. Each [`Detector::detect`]
/// call performs exactly one invocation, and the classifier's sample pass
/// and the decoder's consuming pass both read that same invocation's
/// outputs.
pub struct Detector<S: ModelSession> {
    session: S,
}

impl<S: ModelSession> Detector<S> {
    /// Wrap a loaded session.
    pub fn new(session: S) -> Self {
        Self { session }
    }

    /// Borrow the underlying session.
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Give the session back.
    pub fn into_session(self) -> S {
        self.session
    }

    /// Run one image through the model and decode the detections at or
    /// above `score_threshold`.
    pub fn detect(
        &mut self,
        image: &DynamicImage,
        score_threshold: f32,
        labels: &LabelMap,
    ) -> Result<Vec<Detection>> {
        let input = self.primary_input()?;
        let tensor = preprocess::image_to_input(image, &input);
        self.session.set_input(&input, tensor)?;
        self.session.invoke()?;

        // Re-read descriptors: backends may refresh dynamic dims on invoke.
        let outputs = self.session.outputs().to_vec();
        let samples: Vec<OutputTensor> = outputs
            .iter()
            .map(|d| self.session.read_output(d))
            .collect::<std::result::Result<_, _>>()?;

        let schema = classify_outputs(&outputs, &samples)?;
        let tensors = DetectionTensors {
            boxes: take(&outputs, &samples, &schema.boxes)?,
            scores: take(&outputs, &samples, &schema.scores)?,
            classes: take(&outputs, &samples, &schema.classes)?,
            count: take(&outputs, &samples, &schema.count)?,
        };

        let detections = decode_detections(&schema, &tensors, score_threshold, labels)?;
        info!(count = detections.len(), "detection pass complete");
        Ok(detections)
    }

    /// Metadata report plus a dry run with a zero-filled input.
    pub fn inspect(&mut self) -> Result<ModelReport> {
        let input = self.primary_input()?;
        debug!(input = %input.name, "running dry-run inference with dummy input");

        self.session.set_input(&input, preprocess::dummy_input(&input))?;
        self.session.invoke()?;

        let outputs = self.session.outputs().to_vec();
        let realized_shapes = outputs
            .iter()
            .map(|d| self.session.read_output(d).map(|t| t.shape().to_vec()))
            .collect::<std::result::Result<_, _>>()?;

        Ok(ModelReport {
            inputs: self.session.inputs().to_vec(),
            outputs,
            realized_shapes,
        })
    }

    fn primary_input(&self) -> Result<TensorDescriptor> {
        self.session
            .inputs()
            .first()
            .cloned()
            .ok_or_else(|| InferenceError::InvalidInput("model has no inputs".into()).into())
    }
}

/// Map a classified descriptor back to its sample by position in the
/// outputs list; samples were read in that order, so this holds for any
/// session regardless of how it assigns `index` values.
fn take(
    outputs: &[TensorDescriptor],
    samples: &[OutputTensor],
    descriptor: &TensorDescriptor,
) -> Result<OutputTensor> {
    outputs
        .iter()
        .position(|d| d == descriptor)
        .and_then(|pos| samples.get(pos))
        .cloned()
        .ok_or_else(|| InferenceError::UnknownTensor(descriptor.name.clone()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ssdec_inference::{ElementType, InputTensor};

    use crate::error::{SchemaError, SsdecError};

    struct FakeSession {
        inputs: Vec<TensorDescriptor>,
        outputs: Vec<TensorDescriptor>,
        canned: Vec<OutputTensor>,
        staged: Option<InputTensor>,
        invocations: usize,
    }

    impl FakeSession {
        fn canonical(scores: &[f32; 3]) -> Self {
            let desc = |name: &str, shape: &[usize], index: usize| TensorDescriptor {
                name: name.into(),
                shape: shape.to_vec(),
                dtype: ElementType::Float32,
                index,
            };
            let tensor =
                |values: &[f32], shape: &[usize]| OutputTensor::from_f32(values.to_vec(), shape).unwrap();

            Self {
                inputs: vec![desc("image", &[1, 4, 4, 3], 0)],
                outputs: vec![
                    desc("boxes", &[1, 3, 4], 0),
                    desc("classes", &[1, 3], 1),
                    desc("scores", &[1, 3], 2),
                    desc("count", &[1], 3),
                ],
                canned: vec![
                    tensor(
                        &[
                            0.1, 0.2, 0.3, 0.4, //
                            0.2, 0.3, 0.4, 0.5, //
                            0.5, 0.6, 0.7, 0.8,
                        ],
                        &[1, 3, 4],
                    ),
                    tensor(&[0.0, 16.0, 2.0], &[1, 3]),
                    tensor(scores, &[1, 3]),
                    tensor(&[3.0], &[1]),
                ],
                staged: None,
                invocations: 0,
            }
        }
    }

    impl ModelSession for FakeSession {
        fn inputs(&self) -> &[TensorDescriptor] {
            &self.inputs
        }

        fn outputs(&self) -> &[TensorDescriptor] {
            &self.outputs
        }

        fn set_input(
            &mut self,
            _descriptor: &TensorDescriptor,
            tensor: InputTensor,
        ) -> ssdec_inference::Result<()> {
            self.staged = Some(tensor);
            Ok(())
        }

        fn invoke(&mut self) -> ssdec_inference::Result<()> {
            if self.staged.is_none() {
                return Err(InferenceError::InvalidInput("no input staged".into()));
            }
            self.invocations += 1;
            Ok(())
        }

        fn read_output(&self, descriptor: &TensorDescriptor) -> ssdec_inference::Result<OutputTensor> {
            if self.invocations == 0 {
                return Err(InferenceError::NotInvoked(descriptor.name.clone()));
            }
            self.outputs
                .iter()
                .position(|d| d.name == descriptor.name)
                .and_then(|pos| self.canned.get(pos))
                .cloned()
                .ok_or_else(|| InferenceError::UnknownTensor(descriptor.name.clone()))
        }
    }

    fn test_image() -> DynamicImage {
        DynamicImage::ImageRgb8(image::RgbImage::from_pixel(8, 8, image::Rgb([100, 100, 100])))
    }

    #[test]
    fn full_cycle_decodes_detections() {
        let mut detector = Detector::new(FakeSession::canonical(&[0.9, 0.3, 0.5]));
        let labels = LabelMap::from_lines("cat\ndog\nbird");

        let dets = detector.detect(&test_image(), 0.4, &labels).unwrap();
        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].label, "cat");
        assert_eq!(dets[1].label, "bird");
        assert_eq!(detector.session().invocations, 1);
    }

    #[test]
    fn each_detect_call_invokes_once() {
        let mut detector = Detector::new(FakeSession::canonical(&[0.9, 0.3, 0.5]));
        let labels = LabelMap::empty();

        detector.detect(&test_image(), 0.4, &labels).unwrap();
        detector.detect(&test_image(), 0.4, &labels).unwrap();
        assert_eq!(detector.session().invocations, 2);
    }

    #[test]
    fn unsupported_layout_surfaces_as_schema_error() {
        let mut session = FakeSession::canonical(&[0.9, 0.3, 0.5]);
        session.outputs.remove(0);
        session.canned.remove(0);
        for (i, d) in session.outputs.iter_mut().enumerate() {
            d.index = i;
        }

        let mut detector = Detector::new(session);
        let err = detector
            .detect(&test_image(), 0.4, &LabelMap::empty())
            .unwrap_err();
        assert!(matches!(err, SsdecError::Schema(SchemaError::NoBoxes)));
    }

    #[test]
    fn detect_pairs_outputs_by_position_not_index() {
        // Some session providers hand out descriptor indices that are not
        // positions in the declared output list; pairing must go through the
        // list order instead.
        let mut session = FakeSession::canonical(&[0.9, 0.3, 0.5]);
        for d in session.outputs.iter_mut() {
            d.index += 10;
        }

        let mut detector = Detector::new(session);
        let labels = LabelMap::from_lines("cat\ndog\nbird");
        let dets = detector.detect(&test_image(), 0.4, &labels).unwrap();

        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].label, "cat");
        assert_eq!(dets[1].label, "bird");
    }

    #[test]
    fn inspect_reports_metadata_and_realized_shapes() {
        let mut detector = Detector::new(FakeSession::canonical(&[0.9, 0.3, 0.5]));
        let report = detector.inspect().unwrap();

        assert_eq!(report.inputs.len(), 1);
        assert_eq!(report.outputs.len(), 4);
        assert_eq!(report.realized_shapes[0], vec![1, 3, 4]);
        assert!(report.layout_comment().contains("SSD-style"));
    }

    #[test]
    fn zero_detections_is_success() {
        let mut detector = Detector::new(FakeSession::canonical(&[0.1, 0.2, 0.3]));
        let dets = detector
            .detect(&test_image(), 0.9, &LabelMap::empty())
            .unwrap();
        assert!(dets.is_empty());
    }
}
