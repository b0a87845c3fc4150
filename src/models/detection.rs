//! Food presence detection over a YOLO-style object detection model.
//!
//! The model consumes a `[1, 3, S, S]` tensor scaled to `[0, 1]` and emits
//! `[1, N, D]` candidate rows with `D >= 6`: four box coordinates, an
//! objectness confidence at field 4, and class data from field 5 on. This
//! stage is a coarse presence gate: food counts as present when any
//! candidate's confidence is strictly above the configured threshold.
//! Candidate class ids and boxes are decoded but do not influence the
//! decision.

use crate::core::config::{DetectionConfig, validate_threshold};
use crate::core::errors::{FoodLensError, FoodLensResult};
use crate::core::inference::OrtInfer;
use crate::core::traits::PresenceGate;
use crate::core::{Tensor3D, Tensor4D};
use crate::processors::{NormalizeImage, StretchResize};
use image::DynamicImage;
use image::imageops::FilterType;
use ndarray::Axis;
use std::path::Path;
use tracing::{debug, warn};

/// Minimum fields per candidate row: 4 box coordinates, confidence, class.
const MIN_CANDIDATE_FIELDS: usize = 6;

/// One decoded detection candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionCandidate {
    /// Box fields as emitted by the model (center-x, center-y, width,
    /// height in input-tensor coordinates).
    pub bbox: [f32; 4],
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    /// Class id as emitted by the model. Read but not used by the presence
    /// gate.
    pub class_id: usize,
}

/// Decodes a `[1, N, D]` prediction tensor into candidates.
pub fn decode_candidates(
    model_name: &str,
    predictions: &Tensor3D,
) -> FoodLensResult<Vec<DetectionCandidate>> {
    let shape = predictions.shape();
    if shape[0] != 1 {
        return Err(FoodLensError::inference_context(
            model_name,
            format!("expected batch size 1 in detection output, got {}", shape[0]),
        ));
    }
    let fields = shape[2];
    if fields < MIN_CANDIDATE_FIELDS {
        warn!(
            model = model_name,
            fields, "detection output rows too short to decode"
        );
        return Err(FoodLensError::inference_context(
            model_name,
            format!(
                "expected at least {MIN_CANDIDATE_FIELDS} fields per candidate, got {fields}"
            ),
        ));
    }

    let rows = predictions.index_axis(Axis(0), 0);
    let mut candidates = Vec::with_capacity(rows.len_of(Axis(0)));
    for row in rows.outer_iter() {
        candidates.push(DetectionCandidate {
            bbox: [row[0], row[1], row[2], row[3]],
            confidence: row[4],
            class_id: row[5] as usize,
        });
    }
    Ok(candidates)
}

/// Presence rule: any candidate with confidence strictly above the
/// threshold counts. A confidence exactly at the threshold does not.
pub fn any_above_threshold(candidates: &[DetectionCandidate], threshold: f32) -> bool {
    candidates.iter().any(|c| c.confidence > threshold)
}

/// YOLO-backed food presence detector.
#[derive(Debug)]
pub struct YoloFoodDetector {
    inference: OrtInfer,
    resizer: StretchResize,
    normalizer: NormalizeImage,
    confidence_threshold: f32,
}

impl YoloFoodDetector {
    /// Creates a builder with the trained defaults.
    pub fn builder() -> YoloFoodDetectorBuilder {
        YoloFoodDetectorBuilder::new()
    }

    /// Builds a detector from a validated stage configuration.
    pub fn from_config(config: &DetectionConfig) -> FoodLensResult<Self> {
        config.validate()?;
        YoloFoodDetectorBuilder::new()
            .input_name(config.input_name())
            .input_size(config.input_size())
            .confidence_threshold(config.confidence_threshold())
            .session_pool_size(config.session_pool_size())
            .build(&config.model_path)
    }

    /// Validates and stretches the image, then scales it into the
    /// `[1, 3, S, S]` tensor the model expects. Pure transformation.
    pub fn preprocess(&self, image: &DynamicImage) -> FoodLensResult<Tensor4D> {
        let resized = self.resizer.apply(image)?;
        self.normalizer.normalize_to(&resized)
    }

    /// Runs the detection model on a preprocessed tensor.
    pub fn infer(&self, batch: &Tensor4D) -> FoodLensResult<Tensor3D> {
        self.inference.infer_3d(batch)
    }

    /// Runs the full stage and returns the decoded candidates.
    pub fn detect_candidates(
        &self,
        image: &DynamicImage,
    ) -> FoodLensResult<Vec<DetectionCandidate>> {
        let batch = self.preprocess(image)?;
        let predictions = self.infer(&batch)?;
        decode_candidates(self.inference.model_name(), &predictions)
    }

    /// Runs the full stage and returns whether food is present.
    pub fn detect(&self, image: &DynamicImage) -> FoodLensResult<bool> {
        let candidates = self.detect_candidates(image)?;
        let present = any_above_threshold(&candidates, self.confidence_threshold);
        debug!(
            candidates = candidates.len(),
            threshold = self.confidence_threshold,
            present,
            "detection stage decision"
        );
        Ok(present)
    }

    /// The configured presence threshold.
    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }
}

impl PresenceGate for YoloFoodDetector {
    fn detect(&self, image: &DynamicImage) -> FoodLensResult<bool> {
        YoloFoodDetector::detect(self, image)
    }
}

/// Builder for [`YoloFoodDetector`].
#[derive(Debug)]
pub struct YoloFoodDetectorBuilder {
    input_name: String,
    input_size: u32,
    confidence_threshold: f32,
    session_pool_size: usize,
    resize_filter: FilterType,
}

impl Default for YoloFoodDetectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl YoloFoodDetectorBuilder {
    /// Creates a builder with the trained defaults.
    pub fn new() -> Self {
        Self {
            input_name: crate::core::config::DEFAULT_DETECTION_INPUT_NAME.to_string(),
            input_size: crate::core::config::DEFAULT_DETECTION_INPUT_SIZE,
            confidence_threshold: crate::core::config::DEFAULT_CONFIDENCE_THRESHOLD,
            session_pool_size: crate::core::config::DEFAULT_SESSION_POOL_SIZE,
            resize_filter: FilterType::Triangle,
        }
    }

    /// Sets the model's input tensor name.
    pub fn input_name(mut self, name: &str) -> Self {
        self.input_name = name.to_string();
        self
    }

    /// Sets the square input resolution.
    pub fn input_size(mut self, size: u32) -> Self {
        self.input_size = size;
        self
    }

    /// Sets the presence threshold.
    pub fn confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Sets the session pool size.
    pub fn session_pool_size(mut self, size: usize) -> Self {
        self.session_pool_size = size;
        self
    }

    /// Sets the resizing filter.
    pub fn resize_filter(mut self, filter: FilterType) -> Self {
        self.resize_filter = filter;
        self
    }

    /// Builds the detector, loading the ONNX model at `model_path`.
    pub fn build(self, model_path: &Path) -> FoodLensResult<YoloFoodDetector> {
        validate_threshold(self.confidence_threshold)?;
        let inference = OrtInfer::with_pool(model_path, &self.input_name, self.session_pool_size)?;
        let resizer = StretchResize::new(self.input_size, self.resize_filter)?;

        Ok(YoloFoodDetector {
            inference,
            resizer,
            normalizer: NormalizeImage::unit_scale(),
            confidence_threshold: self.confidence_threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn candidate(confidence: f32) -> DetectionCandidate {
        DetectionCandidate {
            bbox: [10.0, 10.0, 20.0, 20.0],
            confidence,
            class_id: 0,
        }
    }

    #[test]
    fn threshold_is_strict() {
        assert!(!any_above_threshold(&[candidate(0.49)], 0.5));
        assert!(!any_above_threshold(&[candidate(0.5)], 0.5));
        assert!(any_above_threshold(&[candidate(0.51)], 0.5));
    }

    #[test]
    fn any_candidate_suffices() {
        let candidates = vec![candidate(0.1), candidate(0.2), candidate(0.9)];
        assert!(any_above_threshold(&candidates, 0.5));
    }

    #[test]
    fn no_candidates_means_no_food() {
        assert!(!any_above_threshold(&[], 0.5));
    }

    #[test]
    fn decodes_confidence_and_class_fields() {
        // Two candidates in the 85-field layout of the trained export.
        let mut predictions = Array3::<f32>::zeros((1, 2, 85));
        predictions[[0, 0, 0]] = 32.0;
        predictions[[0, 0, 1]] = 48.0;
        predictions[[0, 0, 2]] = 64.0;
        predictions[[0, 0, 3]] = 80.0;
        predictions[[0, 0, 4]] = 0.87;
        predictions[[0, 0, 5]] = 3.0;
        predictions[[0, 1, 4]] = 0.12;

        let candidates = decode_candidates("test", &predictions).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].bbox, [32.0, 48.0, 64.0, 80.0]);
        assert_eq!(candidates[0].confidence, 0.87);
        assert_eq!(candidates[0].class_id, 3);
        assert_eq!(candidates[1].confidence, 0.12);
    }

    #[test]
    fn all_zero_output_decodes_to_absent() {
        let predictions = Array3::<f32>::zeros((1, 4, 6));
        let candidates = decode_candidates("test", &predictions).unwrap();
        assert_eq!(candidates.len(), 4);
        assert!(!any_above_threshold(&candidates, 0.5));
    }

    #[test]
    fn short_rows_are_an_inference_error() {
        let predictions = Array3::<f32>::zeros((1, 2, 5));
        match decode_candidates("test", &predictions) {
            Err(FoodLensError::Inference { .. }) => {}
            other => panic!("expected Inference error, got {other:?}"),
        }
    }

    #[test]
    fn multi_batch_output_is_rejected() {
        let predictions = Array3::<f32>::zeros((2, 2, 6));
        assert!(decode_candidates("test", &predictions).is_err());
    }
}
