//! ONNX Runtime inference engine with session pooling.
//!
//! Sessions are created once at startup and held for the process lifetime.
//! They are read-only during inference; a small `Mutex` pool with a
//! round-robin cursor lets concurrent calls proceed without contending on a
//! single session.

use crate::core::errors::{FoodLensError, FoodLensResult};
use crate::core::{Tensor2D, Tensor3D, Tensor4D};
use ndarray::{ArrayView2, ArrayView3};
use ort::logging::LogLevel;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct OrtInfer {
    sessions: Vec<Mutex<Session>>,
    next_idx: AtomicUsize,
    input_name: String,
    output_name: Option<String>,
    model_path: PathBuf,
    model_name: String,
}

impl std::fmt::Debug for OrtInfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtInfer")
            .field("sessions", &self.sessions.len())
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("model_path", &self.model_path)
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl OrtInfer {
    /// Creates a new OrtInfer instance with default ONNX Runtime settings
    /// and a single session.
    pub fn new(model_path: impl AsRef<Path>, input_name: &str) -> FoodLensResult<Self> {
        Self::with_pool(model_path, input_name, 1)
    }

    /// Creates a new OrtInfer instance with a pool of identical sessions
    /// for concurrent predictions.
    pub fn with_pool(
        model_path: impl AsRef<Path>,
        input_name: &str,
        pool_size: usize,
    ) -> FoodLensResult<Self> {
        let path = model_path.as_ref();
        let pool_size = pool_size.max(1);
        let mut sessions = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let session = Session::builder()?
                .with_log_level(LogLevel::Error)?
                .commit_from_file(path)
                .map_err(|e| {
                    FoodLensError::model_load(
                        path,
                        "failed to create ONNX session; verify model file exists and is readable",
                        Some(e),
                    )
                })?;
            sessions.push(Mutex::new(session));
        }
        let model_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown_model")
            .to_string();

        Ok(OrtInfer {
            sessions,
            next_idx: AtomicUsize::new(0),
            input_name: input_name.to_string(),
            output_name: None,
            model_path: path.to_path_buf(),
            model_name,
        })
    }

    /// Returns the model path associated with this inference engine.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Returns the model name associated with this inference engine.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Returns the configured or discovered output tensor name.
    fn get_output_name(&self) -> FoodLensResult<String> {
        if let Some(ref name) = self.output_name {
            Ok(name.clone())
        } else {
            let session = self.sessions[0].lock().map_err(|_| {
                FoodLensError::inference_context(&self.model_name, "failed to acquire session lock")
            })?;
            if let Some(output) = session.outputs.first() {
                Ok(output.name.clone())
            } else {
                Err(FoodLensError::inference_context(
                    &self.model_name,
                    "no outputs available in session; model may be invalid or corrupted",
                ))
            }
        }
    }

    fn run_inference_with_processor<T>(
        &self,
        x: &Tensor4D,
        processor: impl FnOnce(&[i64], &[f32]) -> FoodLensResult<T>,
    ) -> FoodLensResult<T> {
        let input_shape = x.shape().to_vec();
        let output_name = self.get_output_name()?;

        let input_tensor = TensorRef::from_array_view(x.view()).map_err(|e| {
            FoodLensError::inference(
                &self.model_name,
                format!("failed to convert input tensor with shape {input_shape:?}"),
                e,
            )
        })?;

        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        let idx = self.next_idx.fetch_add(1, Ordering::Relaxed) % self.sessions.len();
        let mut session_guard = self.sessions[idx].lock().map_err(|_| {
            FoodLensError::inference_context(
                &self.model_name,
                format!(
                    "failed to acquire session lock for session {}/{}",
                    idx,
                    self.sessions.len()
                ),
            )
        })?;

        let outputs = session_guard.run(inputs).map_err(|e| {
            FoodLensError::inference(
                &self.model_name,
                format!(
                    "ONNX Runtime inference failed with input '{}' -> output '{}' for shape {:?}",
                    self.input_name, output_name, input_shape
                ),
                e,
            )
        })?;

        let output = outputs[output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                FoodLensError::inference(
                    &self.model_name,
                    format!("failed to extract output tensor '{output_name}' as f32"),
                    e,
                )
            })?;
        let (output_shape, output_data) = output;

        processor(output_shape, output_data)
    }

    /// Runs inference and returns a 2D score tensor (batch x classes).
    pub fn infer_2d(&self, x: &Tensor4D) -> FoodLensResult<Tensor2D> {
        self.run_inference_with_processor(x, |output_shape, output_data| {
            if output_shape.len() != 2 {
                return Err(FoodLensError::inference_context(
                    &self.model_name,
                    format!(
                        "expected 2D output tensor, got {}D with shape {:?}",
                        output_shape.len(),
                        output_shape
                    ),
                ));
            }

            let batch_size = output_shape[0] as usize;
            let num_classes = output_shape[1] as usize;
            let expected_len = batch_size * num_classes;

            if output_data.len() != expected_len {
                return Err(FoodLensError::inference_context(
                    &self.model_name,
                    format!(
                        "output data size mismatch: expected {}, got {}",
                        expected_len,
                        output_data.len()
                    ),
                ));
            }

            let array_view = ArrayView2::from_shape((batch_size, num_classes), output_data)
                .map_err(FoodLensError::Tensor)?;
            Ok(array_view.to_owned())
        })
    }

    /// Runs inference and returns a 3D candidate tensor
    /// (batch x candidates x fields).
    pub fn infer_3d(&self, x: &Tensor4D) -> FoodLensResult<Tensor3D> {
        self.run_inference_with_processor(x, |output_shape, output_data| {
            if output_shape.len() != 3 {
                return Err(FoodLensError::inference_context(
                    &self.model_name,
                    format!(
                        "expected 3D output tensor, got {}D with shape {:?}",
                        output_shape.len(),
                        output_shape
                    ),
                ));
            }

            let batch_size = output_shape[0] as usize;
            let num_candidates = output_shape[1] as usize;
            let num_fields = output_shape[2] as usize;
            let expected_len = batch_size * num_candidates * num_fields;

            if output_data.len() != expected_len {
                return Err(FoodLensError::inference_context(
                    &self.model_name,
                    format!(
                        "output data size mismatch: expected {}, got {}",
                        expected_len,
                        output_data.len()
                    ),
                ));
            }

            let array_view =
                ArrayView3::from_shape((batch_size, num_candidates, num_fields), output_data)
                    .map_err(FoodLensError::Tensor)?;
            Ok(array_view.to_owned())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_file_is_a_load_error() {
        let result = OrtInfer::new("no_such_model.onnx", "images");
        assert!(result.is_err());
    }

    #[test]
    fn pool_size_zero_is_clamped() {
        // Still fails on the missing file, not on an empty pool.
        let result = OrtInfer::with_pool("no_such_model.onnx", "images", 0);
        assert!(result.is_err());
    }
}
