//! # foodlens
//!
//! A Rust library for on-device food recognition from photos using ONNX
//! models. A detection model decides whether an image contains food at all;
//! only then does a classification model assign one of a fixed set of food
//! labels.
//!
//! ## Features
//!
//! - Two-stage pipeline with a short-circuit on "no food"
//! - Separate preprocessing per model (plain scaling for detection,
//!   mean/std normalization for classification)
//! - ONNX Runtime integration with session pooling for concurrent calls
//! - Fixed, ordered label table loaded alongside the model artifact
//! - Process-wide one-time initialization guard
//!
//! ## Modules
//!
//! * [`core`] - Error handling, configuration, and the inference engine
//! * [`domain`] - The food label table
//! * [`models`] - Pure model implementations for detection and classification
//! * [`pipeline`] - The analysis orchestrator
//! * [`processors`] - Image transforms shared by the models
//! * [`utils`] - Image loading helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use foodlens::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FoodPipelineConfig::new(
//!     "models/food_detect.onnx",
//!     "models/food_classify.onnx",
//! );
//! let pipeline = FoodPipeline::new(&config)?;
//!
//! let image = load_image(Path::new("photo.jpg"))?;
//! match pipeline.analyze(&image)? {
//!     AnalysisResult::Classified(label) => println!("found {label}"),
//!     AnalysisResult::NoFoodDetected => println!("no food detected"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## JSON Configuration
//!
//! ```rust,no_run
//! use foodlens::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FoodPipelineConfig::from_json_str(r#"
//! {
//!   "detection": {
//!     "model_path": "models/food_detect.onnx",
//!     "confidence_threshold": 0.5
//!   },
//!   "classification": {
//!     "model_path": "models/food_classify.onnx",
//!     "labels": ["Pizza", "Burger", "Sushi", "Fries"]
//!   }
//! }
//! "#)?;
//! let pipeline = FoodPipeline::initialize(&config)?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod models;

pub mod pipeline;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// Bring the essentials into scope with a single use statement:
///
/// ```rust
/// use foodlens::prelude::*;
/// ```
///
/// Included items cover the common path: the pipeline and its result type,
/// configuration, errors, and image loading. For advanced use (individual
/// models, processors, the label table), import directly from the respective
/// modules.
pub mod prelude {
    pub use crate::core::config::{ClassificationConfig, DetectionConfig, FoodPipelineConfig};
    pub use crate::core::{FoodLensError, FoodLensResult};
    pub use crate::pipeline::{AnalysisResult, FoodPipeline, FoodPipelineBuilder};
    pub use crate::utils::load_image;
}
