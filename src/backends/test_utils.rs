//! Test utilities and mock backends for testing inference functionality
//!
//! This module provides mock implementations of the `InferenceBackend` trait
//! to enable comprehensive testing without requiring an actual model file.

use crate::{
    config::RemovalConfig,
    error::{RemovalError, Result},
    inference::{InferenceBackend, MODEL_INPUT_SIZE},
};
use instant::Duration;
use ndarray::Array4;
use std::sync::{Arc, Mutex};

/// Scripted output pattern for the mock backend
#[derive(Debug, Clone, Copy)]
pub enum MockOutput {
    /// Every mask value is the given constant (0.0 = all background,
    /// 1.0 = all foreground)
    Constant(f32),
    /// Soft circular mask centered in the frame
    Circle,
}

/// Mock inference backend for testing
#[derive(Debug, Clone)]
pub struct MockBackend {
    /// Whether the backend has been initialized
    initialized: bool,
    /// Scripted output pattern
    output: MockOutput,
    /// Call history for verification in tests
    call_history: Arc<Mutex<Vec<String>>>,
    /// Whether to simulate initialization failure
    should_fail_init: bool,
    /// Whether to simulate inference failure
    should_fail_inference: bool,
    /// Rendezvous points entered at the start and end of `infer`
    gate: Option<Arc<std::sync::Barrier>>,
}

impl MockBackend {
    /// Create a new mock backend producing a soft circular mask
    #[must_use]
    pub fn new() -> Self {
        Self {
            initialized: false,
            output: MockOutput::Circle,
            call_history: Arc::new(Mutex::new(Vec::new())),
            should_fail_init: false,
            should_fail_inference: false,
            gate: None,
        }
    }

    /// Create a mock backend producing a constant mask value
    #[must_use]
    pub fn constant(value: f32) -> Self {
        let mut backend = Self::new();
        backend.output = MockOutput::Constant(value);
        backend
    }

    /// Create a mock backend whose model marks everything as background
    #[must_use]
    pub fn all_zero() -> Self {
        Self::constant(0.0)
    }

    /// Create a mock backend whose model marks everything as foreground
    #[must_use]
    pub fn all_one() -> Self {
        Self::constant(1.0)
    }

    /// Create a mock backend that will fail during initialization
    #[must_use]
    pub fn new_failing_init() -> Self {
        let mut backend = Self::new();
        backend.should_fail_init = true;
        backend
    }

    /// Create a mock backend that will fail during inference
    #[must_use]
    pub fn new_failing_inference() -> Self {
        let mut backend = Self::new();
        backend.should_fail_inference = true;
        backend
    }

    /// Create a mock backend whose `infer` waits on the barrier twice,
    /// once on entry and once before returning
    ///
    /// Lets a test hold a removal run in flight at a known point.
    #[must_use]
    pub fn gated(barrier: Arc<std::sync::Barrier>) -> Self {
        let mut backend = Self::new();
        backend.gate = Some(barrier);
        backend
    }

    /// Get the call history for verification in tests
    pub fn get_call_history(&self) -> Vec<String> {
        self.call_history.lock().unwrap().clone()
    }

    /// Clear the call history
    pub fn clear_call_history(&self) {
        self.call_history.lock().unwrap().clear();
    }

    /// A clone sharing this backend's call history
    ///
    /// Useful when the backend is moved into a processor but the test still
    /// needs to observe which methods were invoked.
    #[must_use]
    pub fn history_handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.call_history)
    }

    /// Record a method call for testing verification
    fn record_call(&self, method: &str) {
        if let Ok(mut history) = self.call_history.lock() {
            history.push(method.to_string());
        }
    }

    /// Generate the scripted output tensor (NHWC)
    fn generate_mock_output(&self, input: &Array4<f32>) -> Array4<f32> {
        let batch_size = input.shape()[0];
        let height = MODEL_INPUT_SIZE;
        let width = MODEL_INPUT_SIZE;

        match self.output {
            MockOutput::Constant(value) => {
                Array4::<f32>::from_elem((batch_size, height, width, 1), value)
            },
            MockOutput::Circle => {
                let mut output = Array4::<f32>::zeros((batch_size, height, width, 1));

                let center_x = width as f32 / 2.0;
                let center_y = height as f32 / 2.0;
                let radius = (width.min(height) as f32 / 3.0).max(10.0);

                for b in 0..batch_size {
                    for y in 0..height {
                        for x in 0..width {
                            let dx = x as f32 - center_x;
                            let dy = y as f32 - center_y;
                            let distance = (dx * dx + dy * dy).sqrt();

                            let mask_value = if distance < radius {
                                ((radius - distance) / radius).clamp(0.0, 1.0)
                            } else {
                                0.0
                            };

                            output[[b, y, x, 0]] = mask_value;
                        }
                    }
                }

                output
            },
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceBackend for MockBackend {
    fn initialize(&mut self, _config: &RemovalConfig) -> Result<Option<Duration>> {
        self.record_call("initialize");

        if self.should_fail_init {
            return Err(RemovalError::model("Mock backend initialization failed"));
        }

        self.initialized = true;
        Ok(Some(Duration::from_millis(50)))
    }

    fn infer(&mut self, input: &Array4<f32>) -> Result<Array4<f32>> {
        self.record_call("infer");

        if let Some(ref gate) = self.gate {
            gate.wait();
        }

        if !self.initialized {
            return Err(RemovalError::inference("Mock backend not initialized"));
        }

        if self.should_fail_inference {
            return Err(RemovalError::inference("Mock backend inference failed"));
        }

        let input_shape = input.shape();
        if input_shape.len() != 4
            || input_shape[1] != MODEL_INPUT_SIZE
            || input_shape[2] != MODEL_INPUT_SIZE
            || input_shape[3] != 3
        {
            return Err(RemovalError::inference(format!(
                "Input tensor must be (N, {size}, {size}, 3), got {shape:?}",
                size = MODEL_INPUT_SIZE,
                shape = input_shape
            )));
        }

        let output = self.generate_mock_output(input);

        if let Some(ref gate) = self.gate {
            gate.wait();
        }

        Ok(output)
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}

/// Helper functions for creating test images and tensors
pub mod test_helpers {
    use image::DynamicImage;
    use ndarray::Array4;

    /// Create a test image with a gradient pattern
    pub fn create_test_image(width: u32, height: u32) -> DynamicImage {
        use image::{ImageBuffer, Rgb};

        let img = ImageBuffer::from_fn(width, height, |x, y| {
            let r = ((x as f32 / width as f32) * 255.0) as u8;
            let g = ((y as f32 / height as f32) * 255.0) as u8;
            let b = 128;
            Rgb([r, g, b])
        });

        DynamicImage::ImageRgb8(img)
    }

    /// Create a test tensor with the given NHWC shape
    pub fn create_test_tensor(
        batch: usize,
        height: usize,
        width: usize,
        channels: usize,
    ) -> Array4<f32> {
        Array4::<f32>::from_shape_fn((batch, height, width, channels), |(b, h, w, c)| {
            (b + h + w + c) as f32 / (batch + height + width + channels) as f32
        })
    }

    /// Encode an image as PNG bytes
    pub fn encode_png(image: &DynamicImage) -> Vec<u8> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        image
            .write_to(&mut cursor, image::ImageFormat::Png)
            .unwrap();
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_backend_creation() {
        let backend = MockBackend::new();
        assert!(!backend.is_initialized());
        assert_eq!(
            backend.input_shape(),
            (1, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, 3)
        );
        assert_eq!(
            backend.output_shape(),
            (1, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, 1)
        );
    }

    #[test]
    fn test_mock_backend_initialization() {
        let mut backend = MockBackend::new();
        let config = RemovalConfig::default();

        assert!(!backend.is_initialized());
        let result = backend.initialize(&config);
        assert!(result.is_ok());
        assert!(backend.is_initialized());

        let init_time = result.unwrap();
        assert!(init_time.is_some());
        assert!(init_time.unwrap() > Duration::from_millis(0));
    }

    #[test]
    fn test_mock_backend_inference() {
        let mut backend = MockBackend::new();
        backend.initialize(&RemovalConfig::default()).unwrap();

        let input = test_helpers::create_test_tensor(1, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, 3);
        let output = backend.infer(&input).unwrap();

        assert_eq!(output.shape(), &[1, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, 1]);
        for value in output.iter() {
            assert!(*value >= 0.0 && *value <= 1.0);
        }
    }

    #[test]
    fn test_mock_backend_constant_outputs() {
        let config = RemovalConfig::default();
        let input = test_helpers::create_test_tensor(1, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, 3);

        let mut zero_backend = MockBackend::all_zero();
        zero_backend.initialize(&config).unwrap();
        let output = zero_backend.infer(&input).unwrap();
        assert!(output.iter().all(|&v| v == 0.0));

        let mut one_backend = MockBackend::all_one();
        one_backend.initialize(&config).unwrap();
        let output = one_backend.infer(&input).unwrap();
        assert!(output.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_mock_backend_rejects_wrong_shape() {
        let mut backend = MockBackend::new();
        backend.initialize(&RemovalConfig::default()).unwrap();

        // NCHW layout must be rejected
        let input = test_helpers::create_test_tensor(1, 3, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE);
        assert!(backend.infer(&input).is_err());
    }

    #[test]
    fn test_mock_backend_failure_scenarios() {
        let config = RemovalConfig::default();

        let mut failing_backend = MockBackend::new_failing_init();
        let result = failing_backend.initialize(&config);
        assert!(result.is_err());
        assert!(!failing_backend.is_initialized());

        let mut inference_failing_backend = MockBackend::new_failing_inference();
        inference_failing_backend.initialize(&config).unwrap();

        let input = test_helpers::create_test_tensor(1, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, 3);
        let result = inference_failing_backend.infer(&input);
        assert!(result.is_err());
    }

    #[test]
    fn test_mock_backend_call_history() {
        let mut backend = MockBackend::new();

        assert!(backend.get_call_history().is_empty());

        backend.initialize(&RemovalConfig::default()).unwrap();
        let input = test_helpers::create_test_tensor(1, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, 3);
        let _ = backend.infer(&input);

        let history = backend.get_call_history();
        assert_eq!(history, vec!["initialize".to_string(), "infer".to_string()]);

        backend.clear_call_history();
        assert!(backend.get_call_history().is_empty());
    }
}
