//! Inference backend abstraction

use crate::{config::RemovalConfig, error::Result};
use ndarray::Array4;

// Use instant crate for cross-platform time compatibility
use instant::Duration;

/// Side length of the model's square input and output, in pixels
///
/// The segmentation model works at a fixed 256x256 resolution. Masks for
/// larger images are upscaled afterwards, so fine edge detail above this
/// resolution is not recoverable.
pub const MODEL_INPUT_SIZE: usize = 256;

/// Trait for inference backends
///
/// Tensors are NHWC: input (1, 256, 256, 3) in [0,1], output (1, 256, 256, 1).
pub trait InferenceBackend: Send {
    /// Initialize the backend with the given configuration
    ///
    /// Returns the model load duration when a load actually happened.
    ///
    /// # Errors
    /// - Backend initialization failures
    /// - Model loading or validation errors
    /// - Invalid configuration parameters
    fn initialize(&mut self, config: &RemovalConfig) -> Result<Option<Duration>>;

    /// Run inference on the input tensor
    ///
    /// # Errors
    /// - Backend not initialized
    /// - Model inference failures
    /// - Tensor conversion or processing errors
    /// - Invalid input tensor dimensions
    fn infer(&mut self, input: &Array4<f32>) -> Result<Array4<f32>>;

    /// Get the expected input shape for this backend (NHWC)
    fn input_shape(&self) -> (usize, usize, usize, usize) {
        (1, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, 3)
    }

    /// Get the expected output shape for this backend (NHWC)
    fn output_shape(&self) -> (usize, usize, usize, usize) {
        (1, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, 1)
    }

    /// Check if backend is initialized
    fn is_initialized(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::test_utils::MockBackend;

    #[test]
    fn test_backend_shapes() {
        let backend = MockBackend::new();

        let input_shape = backend.input_shape();
        let output_shape = backend.output_shape();

        assert_eq!(input_shape, (1, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, 3));
        assert_eq!(output_shape, (1, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, 1));
    }

    #[test]
    fn test_backend_starts_uninitialized() {
        let backend = MockBackend::new();
        assert!(!backend.is_initialized());
    }

    #[test]
    fn test_backend_trait_object() {
        let backend: Box<dyn InferenceBackend> = Box::new(MockBackend::new());

        let (batch, height, width, channels) = backend.input_shape();
        assert_eq!(batch, 1);
        assert_eq!(height, MODEL_INPUT_SIZE);
        assert_eq!(width, MODEL_INPUT_SIZE);
        assert_eq!(channels, 3);
    }
}
