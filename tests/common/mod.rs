//! Shared helpers for integration tests

// Each test binary compiles its own copy and uses a different subset
#![allow(dead_code)]

use cutout::{
    BackgroundRemovalProcessor, InferenceBackend, ModelSession, RemovalConfig, RemovalError,
    Result, Workbench, MODEL_INPUT_SIZE,
};
use image::{DynamicImage, ImageBuffer, Rgb};
use instant::Duration;
use ndarray::Array4;
use std::sync::Arc;

/// Inference backend producing a constant mask value
///
/// Stands in for the real model so integration tests stay deterministic and
/// need no ONNX file on disk.
pub(crate) struct StubBackend {
    value: f32,
    initialized: bool,
    fail_init: bool,
}

impl StubBackend {
    pub(crate) fn constant(value: f32) -> Self {
        Self {
            value,
            initialized: false,
            fail_init: false,
        }
    }

    pub(crate) fn failing_init() -> Self {
        Self {
            value: 0.0,
            initialized: false,
            fail_init: true,
        }
    }
}

impl InferenceBackend for StubBackend {
    fn initialize(&mut self, _config: &RemovalConfig) -> Result<Option<Duration>> {
        if self.fail_init {
            return Err(RemovalError::model("Stub model failed to load"));
        }
        self.initialized = true;
        Ok(Some(Duration::from_millis(1)))
    }

    fn infer(&mut self, input: &Array4<f32>) -> Result<Array4<f32>> {
        if !self.initialized {
            return Err(RemovalError::inference("Stub backend not initialized"));
        }
        let shape = input.shape();
        Ok(Array4::from_elem(
            (shape[0], shape[1], shape[2], 1),
            self.value,
        ))
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}

/// A processor wired to a private session holding the given backend
pub(crate) fn processor_with(backend: StubBackend) -> BackgroundRemovalProcessor {
    let session = Arc::new(ModelSession::with_backend(Box::new(backend)));
    BackgroundRemovalProcessor::with_session(RemovalConfig::default(), session)
        .expect("default config is valid")
}

/// A workbench wired to a private session holding the given backend
pub(crate) fn workbench_with(backend: StubBackend) -> Workbench {
    Workbench::with_processor(processor_with(backend))
}

/// A small RGB gradient image
pub(crate) fn test_image(width: u32, height: u32) -> DynamicImage {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });
    DynamicImage::ImageRgb8(img)
}

/// PNG-encode an image into memory
pub(crate) fn encode_png(image: &DynamicImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .expect("in-memory PNG encoding succeeds");
    bytes
}

/// The model's square working resolution as u32
pub(crate) const MODEL_SIZE: u32 = MODEL_INPUT_SIZE as u32;
