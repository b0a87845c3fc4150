//! Traits defining the seams between the orchestrator and its two stages.
//!
//! The orchestrator sequences the stages through these traits rather than
//! concrete model types, which keeps the short-circuit contract testable
//! without loaded models.

use crate::core::errors::FoodLensResult;
use image::DynamicImage;
use std::sync::Arc;

/// Decides whether any food is present in an image.
///
/// Implementations run the full detection stage: preprocessing, model
/// invocation, and confidence thresholding.
pub trait PresenceGate {
    /// Returns `true` if the image contains food.
    fn detect(&self, image: &DynamicImage) -> FoodLensResult<bool>;
}

/// Maps an image to a label from the fixed food class list.
///
/// Implementations run the full classification stage and never hard-fail on
/// an unresolvable score vector; they degrade to the `Unknown` sentinel
/// instead.
pub trait LabelPredictor {
    /// Returns the most likely food label for the image.
    fn classify(&self, image: &DynamicImage) -> FoodLensResult<Arc<str>>;
}
