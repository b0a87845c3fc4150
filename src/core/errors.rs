//! Error types for the food recognition pipeline.
//!
//! This module defines the error taxonomy for the pipeline: input validation
//! failures, model loading and inference failures, the orchestrator-level
//! wrapper that names the failing stage, and the one-time initialization
//! guard violation. Constructor helpers keep call sites short.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Pipeline stages the orchestrator can attribute a failure to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Food-presence detection, including its preprocessing.
    Detection,
    /// Food classification, including its preprocessing.
    Classification,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineStage::Detection => write!(f, "detection"),
            PipelineStage::Classification => write!(f, "classification"),
        }
    }
}

/// Enum representing the errors that can occur in the food recognition
/// pipeline.
#[derive(Error, Debug)]
pub enum FoodLensError {
    /// The input image cannot be used (zero width or height, unreadable
    /// pixel data).
    #[error("invalid image: {message}")]
    InvalidImage {
        /// A message describing the invalid input.
        message: String,
    },

    /// The input image does not carry exactly 3 color channels.
    #[error("unsupported format: {message}")]
    UnsupportedFormat {
        /// A message describing the unsupported pixel format.
        message: String,
    },

    /// An ONNX model could not be loaded at startup.
    #[error("failed to load model at {path}: {context}")]
    ModelLoad {
        /// Path to the model file.
        path: PathBuf,
        /// Additional context about the failure.
        context: String,
        /// The underlying ONNX Runtime error, if any.
        #[source]
        source: Option<ort::Error>,
    },

    /// A model invocation failed.
    #[error("inference failed for model '{model}': {context}")]
    Inference {
        /// Name of the model that failed.
        model: String,
        /// Additional context about the failure.
        context: String,
        /// The underlying error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A stage failure wrapped by the orchestrator. The stage error is
    /// forwarded without retry.
    #[error("analysis failed in the {stage} stage")]
    Analysis {
        /// The stage the failure occurred in.
        stage: PipelineStage,
        /// The stage-specific error.
        #[source]
        source: Box<FoodLensError>,
    },

    /// The process-wide pipeline was initialized more than once.
    #[error("pipeline already initialized")]
    AlreadyInitialized,

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    Config {
        /// A message describing the configuration error.
        message: String,
    },

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from tensor operations.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// Error occurred while loading an image.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

/// Convenient result alias for pipeline operations.
pub type FoodLensResult<T> = Result<T, FoodLensError>;

impl FoodLensError {
    /// Creates an error for an unusable input image.
    pub fn invalid_image(message: impl Into<String>) -> Self {
        Self::InvalidImage {
            message: message.into(),
        }
    }

    /// Creates an error for a pixel format the pipeline does not accept.
    pub fn unsupported_format(message: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            message: message.into(),
        }
    }

    /// Creates an error for an invalid configuration value.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an error for a failed model load.
    pub fn model_load(
        path: impl AsRef<Path>,
        context: impl Into<String>,
        source: Option<ort::Error>,
    ) -> Self {
        Self::ModelLoad {
            path: path.as_ref().to_path_buf(),
            context: context.into(),
            source,
        }
    }

    /// Creates an error for a failed model invocation with an underlying
    /// cause.
    pub fn inference(
        model: impl Into<String>,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Inference {
            model: model.into(),
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates an error for a failed model invocation where the context
    /// message is the whole story (e.g. an unexpected output layout).
    pub fn inference_context(model: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Inference {
            model: model.into(),
            context: context.into(),
            source: None,
        }
    }

    /// Wraps a stage error the way the orchestrator surfaces it.
    pub fn analysis(stage: PipelineStage, source: FoodLensError) -> Self {
        Self::Analysis {
            stage,
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_wrapper_names_the_stage() {
        let inner = FoodLensError::invalid_image("zero width");
        let wrapped = FoodLensError::analysis(PipelineStage::Detection, inner);
        assert!(wrapped.to_string().contains("detection"));
        match wrapped {
            FoodLensError::Analysis { stage, source } => {
                assert_eq!(stage, PipelineStage::Detection);
                assert!(matches!(*source, FoodLensError::InvalidImage { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
