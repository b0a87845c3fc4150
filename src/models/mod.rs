//! Pure model implementations for the two pipeline stages.
//!
//! Each model owns its own preprocessing (resize + normalization), its ONNX
//! inference engine, and its postprocessing, exposed as
//! preprocess / infer / postprocess steps plus a combined forward entry
//! point. Builders construct them from configuration.

pub mod classification;
pub mod detection;

pub use classification::{FoodClassifier, FoodClassifierBuilder};
pub use detection::{DetectionCandidate, YoloFoodDetector, YoloFoodDetectorBuilder};
