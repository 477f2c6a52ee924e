//! Tract backend implementation for the segmentation model
//!
//! Runs the ONNX model with Tract, a pure Rust neural network inference
//! library with no external dependencies. The model is read from the fixed
//! filesystem path in the configuration.

use crate::config::RemovalConfig;
use crate::error::Result;
use crate::inference::{InferenceBackend, MODEL_INPUT_SIZE};
use ndarray::Array4;
use tract_onnx::prelude::*;
use tracing::{debug, info};

/// Type alias for the complex Tract model type to reduce complexity warnings
type TractModel = RunnableModel<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

// Use instant crate for cross-platform time compatibility
use instant::{Duration, Instant};

/// Tract backend running the segmentation model in pure Rust
#[derive(Debug)]
pub struct TractBackend {
    model: Option<TractModel>,
    initialized: bool,
}

impl TractBackend {
    /// Create a new uninitialized Tract backend
    #[must_use]
    pub fn new() -> Self {
        Self {
            model: None,
            initialized: false,
        }
    }

    /// Load and initialize the model using Tract
    fn load_model(&mut self, config: &RemovalConfig) -> Result<Duration> {
        let model_load_start = Instant::now();

        let model_path = &config.model_path;
        let model_data = std::fs::read(model_path).map_err(|e| {
            crate::error::RemovalError::model_error_with_context(
                "load",
                model_path,
                &e.to_string(),
                &["check the model path", "verify read permissions"],
            )
        })?;

        info!(
            path = %model_path.display(),
            size_bytes = model_data.len(),
            "loading segmentation model"
        );

        let model = onnx()
            .model_for_read(&mut std::io::Cursor::new(model_data))
            .map_err(|e| {
                crate::error::RemovalError::model(format!("Failed to load ONNX model: {e}"))
            })?
            .into_optimized()
            .map_err(|e| {
                crate::error::RemovalError::model(format!("Failed to optimize model: {e}"))
            })?
            .into_runnable()
            .map_err(|e| {
                crate::error::RemovalError::model(format!("Failed to create runnable model: {e}"))
            })?;

        self.model = Some(model);
        self.initialized = true;

        let model_load_time = model_load_start.elapsed();
        info!(
            elapsed_ms = model_load_time.as_millis() as u64,
            "tract backend initialized"
        );

        Ok(model_load_time)
    }
}

impl Default for TractBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceBackend for TractBackend {
    fn initialize(&mut self, config: &RemovalConfig) -> Result<Option<Duration>> {
        if self.initialized {
            return Ok(None); // No model loading time for already initialized backend
        }

        let model_load_time = self.load_model(config)?;
        Ok(Some(model_load_time))
    }

    #[allow(clippy::get_first)]
    fn infer(&mut self, input: &Array4<f32>) -> Result<Array4<f32>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| crate::error::RemovalError::inference("Tract model not initialized"))?;

        debug!(input_shape = ?input.shape(), "running tract inference");

        let inference_start = Instant::now();

        // Convert ndarray to Tract tensor
        let input_tensor = Tensor::from(input.clone());

        // Run inference
        let outputs = model.run(tvec![input_tensor.into()]).map_err(|e| {
            crate::error::RemovalError::inference(format!("Tract inference failed: {e}"))
        })?;

        // Extract output tensor
        let output_tensor = outputs
            .into_iter()
            .next()
            .ok_or_else(|| crate::error::RemovalError::inference("No output tensor found"))?
            .into_arc_tensor();

        // Convert back to ndarray
        let output_data = output_tensor.to_array_view::<f32>().map_err(|e| {
            crate::error::RemovalError::inference(format!("Failed to convert output tensor: {e}"))
        })?;

        let output_shape = output_data.shape();
        if output_shape.len() != 4 {
            return Err(crate::error::RemovalError::inference(format!(
                "Expected 4D output tensor, got {}D",
                output_shape.len()
            )));
        }

        let output_array = Array4::from_shape_vec(
            (
                output_shape.get(0).copied().unwrap_or(1),
                output_shape.get(1).copied().unwrap_or(MODEL_INPUT_SIZE),
                output_shape.get(2).copied().unwrap_or(MODEL_INPUT_SIZE),
                output_shape.get(3).copied().unwrap_or(1),
            ),
            output_data.to_owned().into_raw_vec_and_offset().0,
        )
        .map_err(|e| {
            crate::error::RemovalError::inference(format!("Failed to reshape output tensor: {e}"))
        })?;

        let inference_time = inference_start.elapsed();
        debug!(
            elapsed_ms = inference_time.as_millis() as u64,
            output_shape = ?output_array.shape(),
            "tract inference completed"
        );

        Ok(output_array)
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}
