//! The core module of the food recognition pipeline.
//!
//! This module contains the fundamental components of the pipeline, including:
//! - Configuration management
//! - Error handling
//! - Inference engine integration
//! - Traits defining the seams between the orchestrator and its stages
//!
//! It also provides re-exports of commonly used types for convenience.

pub mod config;
pub mod errors;
pub mod inference;
pub mod traits;

/// 2D tensor of scores (batch x classes).
pub type Tensor2D = ndarray::Array2<f32>;
/// 3D tensor of detection candidates (batch x candidates x fields).
pub type Tensor3D = ndarray::Array3<f32>;
/// 4D image tensor (batch x channels x height x width).
pub type Tensor4D = ndarray::Array4<f32>;

pub use config::{ClassificationConfig, DetectionConfig, FoodPipelineConfig};
pub use errors::{FoodLensError, FoodLensResult, PipelineStage};
pub use inference::OrtInfer;
pub use traits::{LabelPredictor, PresenceGate};

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and
/// formatting layer. It's typically called at the start of an application to
/// enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
