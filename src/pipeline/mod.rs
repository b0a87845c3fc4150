//! The analysis orchestrator.
//!
//! Sequences the two stages as a linear state machine:
//!
//! ```text
//! preprocess+detect -> { NoFoodDetected | preprocess+classify -> Classified }
//! ```
//!
//! The classification stage is never invoked when the detection gate
//! decides no food is present. Stage failures are wrapped with the failing
//! stage's name and forwarded without retry; model session state is
//! unaffected for the next call.

use crate::core::config::FoodPipelineConfig;
use crate::core::errors::{FoodLensError, FoodLensResult, PipelineStage};
use crate::core::traits::{LabelPredictor, PresenceGate};
use crate::models::classification::FoodClassifier;
use crate::models::detection::YoloFoodDetector;
use image::DynamicImage;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::debug;

/// Outcome of one analysis call.
///
/// No confidence or bounding-box data crosses this boundary; downstream
/// collaborators (e.g. nutrition lookup) key off the label alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisResult {
    /// No detection candidate cleared the confidence gate.
    NoFoodDetected,
    /// The most likely food label for the image.
    Classified(Arc<str>),
}

impl AnalysisResult {
    /// The label, if the image was classified.
    pub fn label(&self) -> Option<&str> {
        match self {
            AnalysisResult::Classified(label) => Some(label),
            AnalysisResult::NoFoodDetected => None,
        }
    }
}

/// Runs the stage state machine over the given seams.
///
/// Factored out of [`FoodPipeline::analyze`] so the short-circuit contract
/// is testable without loaded models.
fn run_stages<D, C>(
    detector: &D,
    classifier: &C,
    image: &DynamicImage,
) -> FoodLensResult<AnalysisResult>
where
    D: PresenceGate,
    C: LabelPredictor,
{
    let present = detector
        .detect(image)
        .map_err(|e| FoodLensError::analysis(PipelineStage::Detection, e))?;

    if !present {
        debug!("presence gate rejected the image, skipping classification");
        return Ok(AnalysisResult::NoFoodDetected);
    }

    let label = classifier
        .classify(image)
        .map_err(|e| FoodLensError::analysis(PipelineStage::Classification, e))?;
    Ok(AnalysisResult::Classified(label))
}

/// The two-stage food recognition pipeline.
///
/// Owns both model sessions for the process's lifetime. `analyze` takes
/// `&self` and the pipeline is `Send + Sync`: sessions are read-only during
/// inference and every call builds its own tensors, so concurrent calls are
/// safe.
#[derive(Debug)]
pub struct FoodPipeline {
    detector: YoloFoodDetector,
    classifier: FoodClassifier,
}

static GLOBAL_PIPELINE: PipelineSlot<FoodPipeline> = PipelineSlot::new();

impl FoodPipeline {
    /// Constructs a pipeline, loading both models.
    ///
    /// Callers that want a process-wide instance should use
    /// [`FoodPipeline::initialize`] instead.
    pub fn new(config: &FoodPipelineConfig) -> FoodLensResult<Self> {
        config.validate()?;
        let detector = YoloFoodDetector::from_config(&config.detection)?;
        let classifier = FoodClassifier::from_config(&config.classification)?;
        debug!(
            detection_model = %config.detection.model_path.display(),
            classification_model = %config.classification.model_path.display(),
            "pipeline constructed"
        );
        Ok(Self {
            detector,
            classifier,
        })
    }

    /// Creates a builder for assembling the pipeline configuration.
    pub fn builder() -> FoodPipelineBuilder {
        FoodPipelineBuilder::new()
    }

    /// Installs the process-wide pipeline, loading both models exactly once.
    ///
    /// Concurrent first calls are serialized by the initialization barrier;
    /// only one loads the models. Any later call fails with
    /// `AlreadyInitialized` rather than silently double-loading. A failed
    /// attempt leaves the slot empty, so initialization can be retried.
    pub fn initialize(config: &FoodPipelineConfig) -> FoodLensResult<&'static FoodPipeline> {
        GLOBAL_PIPELINE.initialize_with(|| Self::new(config))
    }

    /// The process-wide pipeline, if [`FoodPipeline::initialize`] has
    /// succeeded.
    pub fn global() -> Option<&'static FoodPipeline> {
        GLOBAL_PIPELINE.get()
    }

    /// Analyzes one image: decides whether it contains food and, if so,
    /// which label it most likely depicts.
    ///
    /// All tensors are scoped to this call and released on every path.
    pub fn analyze(&self, image: &DynamicImage) -> FoodLensResult<AnalysisResult> {
        run_stages(&self.detector, &self.classifier, image)
    }

    /// The detection stage.
    pub fn detector(&self) -> &YoloFoodDetector {
        &self.detector
    }

    /// The classification stage.
    pub fn classifier(&self) -> &FoodClassifier {
        &self.classifier
    }
}

/// Builder for [`FoodPipeline`].
#[derive(Debug, Default)]
pub struct FoodPipelineBuilder {
    config: Option<FoodPipelineConfig>,
}

impl FoodPipelineBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the full pipeline configuration.
    pub fn config(mut self, config: FoodPipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets both model paths, keeping trained defaults for everything else.
    pub fn model_paths(
        mut self,
        detection_model: impl Into<std::path::PathBuf>,
        classification_model: impl Into<std::path::PathBuf>,
    ) -> Self {
        self.config = Some(FoodPipelineConfig::new(detection_model, classification_model));
        self
    }

    /// Builds the pipeline.
    pub fn build(self) -> FoodLensResult<FoodPipeline> {
        let config = self.config.ok_or_else(|| {
            FoodLensError::config("pipeline builder requires a configuration".to_string())
        })?;
        FoodPipeline::new(&config)
    }
}

/// A one-time initialization slot.
///
/// Wraps the initialization barrier so that the first `initialize_with`
/// wins, concurrent first calls run the closure exactly once, and every
/// later call fails with `AlreadyInitialized`.
pub struct PipelineSlot<T> {
    cell: OnceCell<T>,
}

impl<T> PipelineSlot<T> {
    /// Creates an empty slot.
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Initializes the slot with the value produced by `init`.
    ///
    /// Returns `AlreadyInitialized` if the slot already holds a value. If
    /// `init` fails the slot stays empty and a later call may retry.
    pub fn initialize_with<F>(&self, init: F) -> FoodLensResult<&T>
    where
        F: FnOnce() -> FoodLensResult<T>,
    {
        let mut fresh = false;
        let value = self.cell.get_or_try_init(|| {
            fresh = true;
            init()
        })?;
        if fresh {
            Ok(value)
        } else {
            Err(FoodLensError::AlreadyInitialized)
        }
    }

    /// The installed value, if any.
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }
}

impl<T> Default for PipelineSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for PipelineSlot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineSlot")
            .field("initialized", &self.cell.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct GateStub {
        present: bool,
        calls: AtomicUsize,
    }

    impl GateStub {
        fn new(present: bool) -> Self {
            Self {
                present,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PresenceGate for GateStub {
        fn detect(&self, _image: &DynamicImage) -> FoodLensResult<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.present)
        }
    }

    struct FailingGate;

    impl PresenceGate for FailingGate {
        fn detect(&self, _image: &DynamicImage) -> FoodLensResult<bool> {
            Err(FoodLensError::invalid_image("zero width"))
        }
    }

    struct ClassifierStub {
        label: Arc<str>,
        calls: AtomicUsize,
    }

    impl ClassifierStub {
        fn new(label: &str) -> Self {
            Self {
                label: Arc::from(label),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl LabelPredictor for ClassifierStub {
        fn classify(&self, _image: &DynamicImage) -> FoodLensResult<Arc<str>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.label.clone())
        }
    }

    struct FailingClassifier;

    impl LabelPredictor for FailingClassifier {
        fn classify(&self, _image: &DynamicImage) -> FoodLensResult<Arc<str>> {
            Err(FoodLensError::inference_context("test", "shape mismatch"))
        }
    }

    fn image() -> DynamicImage {
        DynamicImage::new_rgb8(1, 1)
    }

    #[test]
    fn no_food_short_circuits_classification() {
        let gate = GateStub::new(false);
        let classifier = ClassifierStub::new("Burger");

        let result = run_stages(&gate, &classifier, &image()).unwrap();
        assert_eq!(result, AnalysisResult::NoFoodDetected);
        assert_eq!(gate.calls.load(Ordering::SeqCst), 1);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn detected_food_is_classified() {
        let gate = GateStub::new(true);
        let classifier = ClassifierStub::new("Burger");

        let result = run_stages(&gate, &classifier, &image()).unwrap();
        assert_eq!(result.label(), Some("Burger"));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn detection_failure_is_wrapped_with_its_stage() {
        let classifier = ClassifierStub::new("Burger");

        let err = run_stages(&FailingGate, &classifier, &image()).unwrap_err();
        match err {
            FoodLensError::Analysis { stage, source } => {
                assert_eq!(stage, PipelineStage::Detection);
                assert!(matches!(*source, FoodLensError::InvalidImage { .. }));
            }
            other => panic!("expected Analysis error, got {other:?}"),
        }
        // The failure happened before detection could gate anything.
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn classification_failure_is_wrapped_with_its_stage() {
        let gate = GateStub::new(true);

        let err = run_stages(&gate, &FailingClassifier, &image()).unwrap_err();
        match err {
            FoodLensError::Analysis { stage, source } => {
                assert_eq!(stage, PipelineStage::Classification);
                assert!(matches!(*source, FoodLensError::Inference { .. }));
            }
            other => panic!("expected Analysis error, got {other:?}"),
        }
    }

    #[test]
    fn slot_rejects_a_second_initialization() {
        let slot: PipelineSlot<u32> = PipelineSlot::new();
        assert!(slot.get().is_none());

        let value = slot.initialize_with(|| Ok(7)).unwrap();
        assert_eq!(*value, 7);
        assert_eq!(slot.get(), Some(&7));

        let err = slot.initialize_with(|| Ok(8)).unwrap_err();
        assert!(matches!(err, FoodLensError::AlreadyInitialized));
        assert_eq!(slot.get(), Some(&7));
    }

    #[test]
    fn failed_initialization_can_be_retried() {
        let slot: PipelineSlot<u32> = PipelineSlot::new();

        let err = slot
            .initialize_with(|| Err(FoodLensError::config("bad config")))
            .unwrap_err();
        assert!(matches!(err, FoodLensError::Config { .. }));
        assert!(slot.get().is_none());

        assert_eq!(*slot.initialize_with(|| Ok(7)).unwrap(), 7);
    }

    #[test]
    fn builder_without_config_is_an_error() {
        assert!(matches!(
            FoodPipelineBuilder::new().build(),
            Err(FoodLensError::Config { .. })
        ));
    }
}
