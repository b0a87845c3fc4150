//! Configuration types for the food recognition pipeline.
//!
//! Model paths, tensor input names, input resolutions, the detection
//! confidence threshold, normalization constants, and the label source are
//! all configuration fixed at model-training time; the pipeline never
//! computes them. Optional fields fall back to the trained defaults through
//! accessor methods; `validate()` rejects values a model could not have been
//! trained with.

use crate::core::errors::{FoodLensError, FoodLensResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default square input resolution of the detection model.
pub const DEFAULT_DETECTION_INPUT_SIZE: u32 = 640;
/// Default square input resolution of the classification model.
pub const DEFAULT_CLASSIFICATION_INPUT_SIZE: u32 = 224;
/// Default confidence threshold for the food-presence gate.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
/// Default input tensor name of the detection model export.
pub const DEFAULT_DETECTION_INPUT_NAME: &str = "images";
/// Default input tensor name of the classification model export.
pub const DEFAULT_CLASSIFICATION_INPUT_NAME: &str = "input";
/// Default per-channel normalization mean of the classification model (RGB).
pub const DEFAULT_CLASSIFICATION_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// Default per-channel normalization std of the classification model (RGB).
pub const DEFAULT_CLASSIFICATION_STD: [f32; 3] = [0.229, 0.224, 0.225];
/// Default number of pooled ONNX sessions per model.
pub const DEFAULT_SESSION_POOL_SIZE: usize = 1;

/// Configuration for the detection stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Path to the detection ONNX model file.
    pub model_path: PathBuf,
    /// Input tensor name (defaults to [`DEFAULT_DETECTION_INPUT_NAME`]).
    #[serde(default)]
    pub input_name: Option<String>,
    /// Square input resolution (defaults to
    /// [`DEFAULT_DETECTION_INPUT_SIZE`]).
    #[serde(default)]
    pub input_size: Option<u32>,
    /// Presence threshold; a candidate counts only with confidence strictly
    /// above this value (defaults to [`DEFAULT_CONFIDENCE_THRESHOLD`]).
    #[serde(default)]
    pub confidence_threshold: Option<f32>,
    /// Number of pooled sessions for concurrent calls (defaults to
    /// [`DEFAULT_SESSION_POOL_SIZE`]).
    #[serde(default)]
    pub session_pool_size: Option<usize>,
}

impl DetectionConfig {
    /// Creates a detection configuration with trained defaults for
    /// everything but the model path.
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            input_name: None,
            input_size: None,
            confidence_threshold: None,
            session_pool_size: None,
        }
    }

    /// The effective input tensor name.
    pub fn input_name(&self) -> &str {
        self.input_name
            .as_deref()
            .unwrap_or(DEFAULT_DETECTION_INPUT_NAME)
    }

    /// The effective square input resolution.
    pub fn input_size(&self) -> u32 {
        self.input_size.unwrap_or(DEFAULT_DETECTION_INPUT_SIZE)
    }

    /// The effective presence threshold.
    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
            .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD)
    }

    /// The effective session pool size.
    pub fn session_pool_size(&self) -> usize {
        self.session_pool_size.unwrap_or(DEFAULT_SESSION_POOL_SIZE)
    }

    /// Validates the detection configuration.
    pub fn validate(&self) -> FoodLensResult<()> {
        validate_threshold(self.confidence_threshold())?;
        validate_input_size(self.input_size())?;
        validate_pool_size(self.session_pool_size())?;
        Ok(())
    }
}

/// Configuration for the classification stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationConfig {
    /// Path to the classification ONNX model file.
    pub model_path: PathBuf,
    /// Input tensor name (defaults to
    /// [`DEFAULT_CLASSIFICATION_INPUT_NAME`]).
    #[serde(default)]
    pub input_name: Option<String>,
    /// Square input resolution (defaults to
    /// [`DEFAULT_CLASSIFICATION_INPUT_SIZE`]).
    #[serde(default)]
    pub input_size: Option<u32>,
    /// Per-channel normalization mean, RGB order (defaults to
    /// [`DEFAULT_CLASSIFICATION_MEAN`]).
    #[serde(default)]
    pub mean: Option<[f32; 3]>,
    /// Per-channel normalization std, RGB order (defaults to
    /// [`DEFAULT_CLASSIFICATION_STD`]).
    #[serde(default)]
    pub std: Option<[f32; 3]>,
    /// In-code ordered label list. Order must match training order.
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    /// Newline-delimited label file shipped alongside the model artifact.
    /// Mutually exclusive with `labels`.
    #[serde(default)]
    pub label_file: Option<PathBuf>,
    /// Number of pooled sessions for concurrent calls (defaults to
    /// [`DEFAULT_SESSION_POOL_SIZE`]).
    #[serde(default)]
    pub session_pool_size: Option<usize>,
}

impl ClassificationConfig {
    /// Creates a classification configuration with trained defaults for
    /// everything but the model path.
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            input_name: None,
            input_size: None,
            mean: None,
            std: None,
            labels: None,
            label_file: None,
            session_pool_size: None,
        }
    }

    /// The effective input tensor name.
    pub fn input_name(&self) -> &str {
        self.input_name
            .as_deref()
            .unwrap_or(DEFAULT_CLASSIFICATION_INPUT_NAME)
    }

    /// The effective square input resolution.
    pub fn input_size(&self) -> u32 {
        self.input_size.unwrap_or(DEFAULT_CLASSIFICATION_INPUT_SIZE)
    }

    /// The effective per-channel normalization mean.
    pub fn mean(&self) -> [f32; 3] {
        self.mean.unwrap_or(DEFAULT_CLASSIFICATION_MEAN)
    }

    /// The effective per-channel normalization std.
    pub fn std(&self) -> [f32; 3] {
        self.std.unwrap_or(DEFAULT_CLASSIFICATION_STD)
    }

    /// The effective session pool size.
    pub fn session_pool_size(&self) -> usize {
        self.session_pool_size.unwrap_or(DEFAULT_SESSION_POOL_SIZE)
    }

    /// Validates the classification configuration.
    pub fn validate(&self) -> FoodLensResult<()> {
        validate_input_size(self.input_size())?;
        validate_pool_size(self.session_pool_size())?;

        for (i, &m) in self.mean().iter().enumerate() {
            if !m.is_finite() {
                return Err(FoodLensError::config(format!(
                    "normalization mean at index {i} is not finite: {m}"
                )));
            }
        }
        for (i, &s) in self.std().iter().enumerate() {
            if !s.is_finite() || s <= 0.0 {
                return Err(FoodLensError::config(format!(
                    "normalization std at index {i} must be a positive finite value, got {s}"
                )));
            }
        }

        if let Some(labels) = &self.labels {
            if labels.is_empty() {
                return Err(FoodLensError::config(
                    "label list must not be empty".to_string(),
                ));
            }
            if self.label_file.is_some() {
                return Err(FoodLensError::config(
                    "labels and label_file are mutually exclusive".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Top-level configuration for the two-model pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodPipelineConfig {
    /// Detection stage configuration.
    pub detection: DetectionConfig,
    /// Classification stage configuration.
    pub classification: ClassificationConfig,
}

impl FoodPipelineConfig {
    /// Creates a pipeline configuration from the two model paths, with
    /// trained defaults for everything else.
    pub fn new(
        detection_model: impl Into<PathBuf>,
        classification_model: impl Into<PathBuf>,
    ) -> Self {
        Self {
            detection: DetectionConfig::new(detection_model),
            classification: ClassificationConfig::new(classification_model),
        }
    }

    /// Parses a pipeline configuration from a JSON string.
    pub fn from_json_str(json: &str) -> FoodLensResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| FoodLensError::config(format!("failed to parse config JSON: {e}")))
    }

    /// Reads and parses a pipeline configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> FoodLensResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Validates both stage configurations.
    pub fn validate(&self) -> FoodLensResult<()> {
        self.detection.validate()?;
        self.classification.validate()?;
        Ok(())
    }
}

pub(crate) fn validate_threshold(threshold: f32) -> FoodLensResult<()> {
    if !threshold.is_finite() || !(0.0..1.0).contains(&threshold) {
        return Err(FoodLensError::config(format!(
            "confidence threshold must be in [0, 1), got {threshold}"
        )));
    }
    Ok(())
}

fn validate_input_size(size: u32) -> FoodLensResult<()> {
    if size == 0 {
        return Err(FoodLensError::config(
            "input size must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

fn validate_pool_size(size: usize) -> FoodLensResult<()> {
    if size == 0 {
        return Err(FoodLensError::config(
            "session pool size must be greater than 0".to_string(),
        ));
    }
    Ok(())
}
