//! Food classification over a fixed label table.
//!
//! The model consumes a `[1, 3, S, S]` tensor normalized with its trained
//! per-channel mean/std constants and emits a `[1, num_classes]` score
//! vector. The maximum score's index selects the label; ties break to the
//! lowest index. Unlike detection, this stage never hard-fails on an
//! unresolvable score vector: once invoked it always produces an answer,
//! degrading to the `Unknown` sentinel. No softmax is applied; argmax is
//! scale-invariant.

use crate::core::config::ClassificationConfig;
use crate::core::errors::FoodLensResult;
use crate::core::inference::OrtInfer;
use crate::core::traits::LabelPredictor;
use crate::core::{Tensor2D, Tensor4D};
use crate::domain::LabelTable;
use crate::processors::{NormalizeImage, StretchResize, argmax};
use image::DynamicImage;
use image::imageops::FilterType;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves a `[1, num_classes]` score tensor to a label.
///
/// Empty score vectors and argmax indices outside the table degrade to the
/// `Unknown` sentinel.
pub fn resolve_label(predictions: &Tensor2D, labels: &LabelTable) -> Arc<str> {
    let Some(row) = predictions.outer_iter().next() else {
        warn!("classifier produced no score rows, degrading to Unknown");
        return labels.unknown();
    };
    let scores = row.to_vec();

    match argmax(&scores) {
        Some(index) => labels.get(index).unwrap_or_else(|| {
            warn!(
                index,
                classes = labels.len(),
                "argmax index outside label table, degrading to Unknown"
            );
            labels.unknown()
        }),
        None => {
            warn!("empty score vector from classifier, degrading to Unknown");
            labels.unknown()
        }
    }
}

/// Classifier mapping an image to one of the trained food labels.
#[derive(Debug)]
pub struct FoodClassifier {
    inference: OrtInfer,
    resizer: StretchResize,
    normalizer: NormalizeImage,
    labels: LabelTable,
}

impl FoodClassifier {
    /// Creates a builder with the trained defaults.
    pub fn builder() -> FoodClassifierBuilder {
        FoodClassifierBuilder::new()
    }

    /// Builds a classifier from a validated stage configuration.
    ///
    /// The label table resolves in order of preference: label file, in-code
    /// list, bundled defaults.
    pub fn from_config(config: &ClassificationConfig) -> FoodLensResult<Self> {
        config.validate()?;
        let labels = match (&config.label_file, &config.labels) {
            (Some(path), _) => LabelTable::from_file(path)?,
            (None, Some(names)) => LabelTable::from_names(names.iter().cloned())?,
            (None, None) => LabelTable::default_food_labels(),
        };

        FoodClassifierBuilder::new()
            .input_name(config.input_name())
            .input_size(config.input_size())
            .normalization(config.mean(), config.std())
            .session_pool_size(config.session_pool_size())
            .labels(labels)
            .build(&config.model_path)
    }

    /// Validates and stretches the image, then normalizes it with the
    /// model's trained mean/std constants. Pure transformation.
    pub fn preprocess(&self, image: &DynamicImage) -> FoodLensResult<Tensor4D> {
        let resized = self.resizer.apply(image)?;
        self.normalizer.normalize_to(&resized)
    }

    /// Runs the classification model on a preprocessed tensor.
    pub fn infer(&self, batch: &Tensor4D) -> FoodLensResult<Tensor2D> {
        self.inference.infer_2d(batch)
    }

    /// Runs the full stage and returns the most likely food label.
    pub fn classify(&self, image: &DynamicImage) -> FoodLensResult<Arc<str>> {
        let batch = self.preprocess(image)?;
        let predictions = self.infer(&batch)?;
        let label = resolve_label(&predictions, &self.labels);
        debug!(%label, "classification stage decision");
        Ok(label)
    }

    /// The label table this classifier maps scores onto.
    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }
}

impl LabelPredictor for FoodClassifier {
    fn classify(&self, image: &DynamicImage) -> FoodLensResult<Arc<str>> {
        FoodClassifier::classify(self, image)
    }
}

/// Builder for [`FoodClassifier`].
#[derive(Debug)]
pub struct FoodClassifierBuilder {
    input_name: String,
    input_size: u32,
    mean: [f32; 3],
    std: [f32; 3],
    session_pool_size: usize,
    resize_filter: FilterType,
    labels: Option<LabelTable>,
}

impl Default for FoodClassifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FoodClassifierBuilder {
    /// Creates a builder with the trained defaults.
    pub fn new() -> Self {
        Self {
            input_name: crate::core::config::DEFAULT_CLASSIFICATION_INPUT_NAME.to_string(),
            input_size: crate::core::config::DEFAULT_CLASSIFICATION_INPUT_SIZE,
            mean: crate::core::config::DEFAULT_CLASSIFICATION_MEAN,
            std: crate::core::config::DEFAULT_CLASSIFICATION_STD,
            session_pool_size: crate::core::config::DEFAULT_SESSION_POOL_SIZE,
            resize_filter: FilterType::Triangle,
            labels: None,
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

    /// Sets the per-channel normalization constants (RGB order).
    pub fn normalization(mut self, mean: [f32; 3], std: [f32; 3]) -> Self {
        self.mean = mean;
        self.std = std;
        self
    }

    /// Sets the session pool size.
    pub fn session_pool_size(mut self, size: usize) -> Self {
        self.session_pool_size = size;
        self
    }

    /// Sets the ordered label table.
    pub fn labels(mut self, labels: LabelTable) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Sets the resizing filter.
    pub fn resize_filter(mut self, filter: FilterType) -> Self {
        self.resize_filter = filter;
        self
    }

    /// Builds the classifier, loading the ONNX model at `model_path`.
    pub fn build(self, model_path: &Path) -> FoodLensResult<FoodClassifier> {
        let inference = OrtInfer::with_pool(model_path, &self.input_name, self.session_pool_size)?;
        let resizer = StretchResize::new(self.input_size, self.resize_filter)?;
        let normalizer = NormalizeImage::new(1.0 / 255.0, self.mean, self.std)?;

        Ok(FoodClassifier {
            inference,
            resizer,
            normalizer,
            labels: self.labels.unwrap_or_else(LabelTable::default_food_labels),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn table() -> LabelTable {
        LabelTable::from_names(["Pizza", "Burger", "Sushi", "Fries"]).unwrap()
    }

    #[test]
    fn maps_top_score_to_its_label() {
        let predictions =
            Array2::from_shape_vec((1, 4), vec![0.1, 0.9, 0.2, 0.05]).unwrap();
        assert_eq!(&*resolve_label(&predictions, &table()), "Burger");
    }

    #[test]
    fn ties_resolve_to_the_earlier_label() {
        let predictions = Array2::from_shape_vec((1, 4), vec![0.2, 0.9, 0.9, 0.1]).unwrap();
        assert_eq!(&*resolve_label(&predictions, &table()), "Burger");
    }

    #[test]
    fn empty_score_vector_degrades_to_unknown() {
        let predictions = Array2::<f32>::zeros((1, 0));
        assert_eq!(&*resolve_label(&predictions, &table()), "Unknown");
    }

    #[test]
    fn missing_row_degrades_to_unknown() {
        let predictions = Array2::<f32>::zeros((0, 4));
        assert_eq!(&*resolve_label(&predictions, &table()), "Unknown");
    }

    #[test]
    fn out_of_table_index_degrades_to_unknown() {
        // Six scores against a four-label table, top score past the end.
        let predictions =
            Array2::from_shape_vec((1, 6), vec![0.1, 0.2, 0.1, 0.05, 0.3, 0.9]).unwrap();
        assert_eq!(&*resolve_label(&predictions, &table()), "Unknown");
    }
}
