//! Background removal pipeline orchestration
//!
//! [`BackgroundRemovalProcessor`] drives one removal run end to end:
//! acquire the processing slot, acquire the model session, preprocess,
//! infer, quantize the mask, and composite the cutout.
//!
//! All processing methods take `&self`. Mutual exclusion comes from the
//! processing slot rather than the borrow checker, so an overlapping call
//! observably fails with [`RemovalError::Busy`] instead of being ruled out
//! at compile time.

use crate::{
    config::RemovalConfig,
    error::{RemovalError, Result},
    guard::ProcessingSlot,
    services::{ImageIoService, ProcessingStage, ProgressReporter, ProgressTracker},
    session::ModelSession,
    types::{ProcessingMetadata, ProcessingTimings, RemovalResult, SegmentationMask, SourceImage},
    utils::ImagePreprocessor,
};
use image::{DynamicImage, ImageBuffer, RgbaImage};
use instant::Instant;
use ndarray::Array4;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, span, Level};

/// High-level processor for single-image background removal
pub struct BackgroundRemovalProcessor {
    config: RemovalConfig,
    session: Arc<ModelSession>,
    slot: ProcessingSlot,
    reporter: Option<Arc<dyn ProgressReporter>>,
}

impl BackgroundRemovalProcessor {
    /// Create a processor using the process-wide model session
    ///
    /// # Errors
    /// Returns an error when the configuration is invalid.
    pub fn new(config: RemovalConfig) -> Result<Self> {
        Self::with_session(config, ModelSession::global())
    }

    /// Create a processor bound to a specific model session
    ///
    /// # Errors
    /// Returns an error when the configuration is invalid.
    pub fn with_session(config: RemovalConfig, session: Arc<ModelSession>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            session,
            slot: ProcessingSlot::new(),
            reporter: None,
        })
    }

    /// Attach a progress reporter for subsequent runs
    #[must_use]
    pub fn with_progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Current configuration
    #[must_use]
    pub fn config(&self) -> &RemovalConfig {
        &self.config
    }

    /// Whether a removal run is currently in flight
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.slot.is_busy()
    }

    /// A handle observing this processor's busy flag
    #[must_use]
    pub fn processing_slot(&self) -> ProcessingSlot {
        self.slot.clone()
    }

    /// Whether the model has been loaded into the session
    #[must_use]
    pub fn is_model_loaded(&self) -> bool {
        self.session.is_loaded()
    }

    /// Remove the background from an image file
    ///
    /// # Errors
    /// - [`RemovalError::Busy`] when another run is in flight
    /// - Intake failures (size ceiling, unsupported format, decode)
    /// - Model loading and inference failures
    pub fn process_file<P: AsRef<Path>>(&self, input_path: P) -> Result<RemovalResult> {
        let guard = self.slot.try_acquire()?;
        let _held = guard;

        let mut tracker = self.tracker();
        let total_start = Instant::now();

        tracker.report_stage(ProcessingStage::ImageLoading);
        let decode_start = Instant::now();
        let source = ImageIoService::load_image(&input_path)?;
        let decode_ms = decode_start.elapsed().as_millis() as u64;

        let mut result = self.run_pipeline(&source, &mut tracker, total_start, decode_ms)?;
        result.input_path = Some(input_path.as_ref().display().to_string());
        Ok(result)
    }

    /// Remove the background from encoded image bytes
    ///
    /// # Errors
    /// - [`RemovalError::Busy`] when another run is in flight
    /// - Intake failures (size ceiling, unsupported format, decode)
    /// - Model loading and inference failures
    pub fn process_bytes(&self, image_bytes: &[u8]) -> Result<RemovalResult> {
        let guard = self.slot.try_acquire()?;
        let _held = guard;

        let mut tracker = self.tracker();
        let total_start = Instant::now();

        tracker.report_stage(ProcessingStage::ImageLoading);
        let decode_start = Instant::now();
        let source = ImageIoService::load_from_bytes(image_bytes)?;
        let decode_ms = decode_start.elapsed().as_millis() as u64;

        self.run_pipeline(&source, &mut tracker, total_start, decode_ms)
    }

    /// Remove the background from an already-decoded source image
    ///
    /// # Errors
    /// - [`RemovalError::Busy`] when another run is in flight
    /// - Model loading and inference failures
    pub fn process_source(&self, source: &SourceImage) -> Result<RemovalResult> {
        let guard = self.slot.try_acquire()?;
        let _held = guard;

        let mut tracker = self.tracker();
        self.run_pipeline(source, &mut tracker, Instant::now(), 0)
    }

    /// Remove the background from image data read from an async stream
    ///
    /// # Errors
    /// - Stream read failures
    /// - All errors from [`Self::process_bytes`]
    pub async fn process_reader<R: tokio::io::AsyncRead + Unpin>(
        &self,
        mut reader: R,
    ) -> Result<RemovalResult> {
        use tokio::io::AsyncReadExt;

        let mut buffer = Vec::new();
        AsyncReadExt::read_to_end(&mut reader, &mut buffer)
            .await
            .map_err(|e| RemovalError::processing(format!("Failed to read from stream: {e}")))?;

        self.process_bytes(&buffer)
    }

    fn tracker(&self) -> ProgressTracker {
        match &self.reporter {
            Some(reporter) => ProgressTracker::new(Box::new(Arc::clone(reporter))),
            None => ProgressTracker::no_op(),
        }
    }

    /// The pipeline proper; the processing slot must already be held
    #[instrument(
        skip(self, source, tracker, total_start, decode_ms),
        fields(dimensions = %format!("{}x{}", source.image.width(), source.image.height()))
    )]
    fn run_pipeline(
        &self,
        source: &SourceImage,
        tracker: &mut ProgressTracker,
        total_start: Instant,
        decode_ms: u64,
    ) -> Result<RemovalResult> {
        let mut timings = ProcessingTimings::default();
        timings.image_decode_ms = decode_ms;
        let original_dimensions = source.dimensions();

        info!(
            input_format = ?source.format,
            width = original_dimensions.0,
            height = original_dimensions.1,
            "starting background removal"
        );

        tracker.report_stage(ProcessingStage::Initialization);
        let mut session = match self.session.acquire(&self.config) {
            Ok(session) => session,
            Err(e) => {
                tracker.report_error(&e.to_string());
                return Err(e);
            },
        };
        if let Some(load_time) = session.model_load_time() {
            timings.model_load_ms = load_time.as_millis() as u64;
        }

        tracker.report_stage(ProcessingStage::Preprocessing);
        let input_tensor = {
            let _span = span!(
                Level::DEBUG,
                "preprocessing",
                original_width = original_dimensions.0,
                original_height = original_dimensions.1
            )
            .entered();
            let preprocess_start = Instant::now();
            let tensor = ImagePreprocessor::preprocess_for_inference(&source.image)?;
            timings.preprocessing_ms = preprocess_start.elapsed().as_millis() as u64;
            tensor
        };

        tracker.report_stage(ProcessingStage::Inference);
        let output_tensor = {
            let _span = span!(Level::INFO, "inference").entered();
            let inference_start = Instant::now();
            let output = match session.infer(&input_tensor) {
                Ok(output) => output,
                Err(e) => {
                    tracker.report_error(&e.to_string());
                    return Err(e);
                },
            };
            timings.inference_ms = inference_start.elapsed().as_millis() as u64;
            output
        };
        drop(session);

        let postprocess_start = Instant::now();

        tracker.report_stage(ProcessingStage::MaskGeneration);
        let mask = Self::tensor_to_mask(&output_tensor)?;

        tracker.report_stage(ProcessingStage::BackgroundRemoval);
        let cutout = {
            let _span = span!(
                Level::DEBUG,
                "background_removal",
                width = original_dimensions.0,
                height = original_dimensions.1
            )
            .entered();
            Self::apply_background_removal(&source.image, &mask)?
        };
        timings.postprocessing_ms = postprocess_start.elapsed().as_millis() as u64;

        timings.total_ms = total_start.elapsed().as_millis() as u64;

        let model_name = self
            .config
            .model_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();
        let mut metadata = ProcessingMetadata::new(model_name);
        metadata.input_format = format!("{:?}", source.format).to_lowercase();
        metadata.output_format = self.config.export.format.to_string();
        metadata.set_timings(timings.clone());

        let result = RemovalResult::new(
            DynamicImage::ImageRgba8(cutout),
            mask,
            original_dimensions,
            metadata,
        );

        tracker.report_stage(ProcessingStage::Completed);
        tracker.report_completion(timings);

        Ok(result)
    }

    /// Quantize the model output into a byte mask at model resolution
    ///
    /// The output tensor is NHWC (1, H, W, 1) with values in [0, 1]. Values
    /// are clamped, scaled by 255 and truncated.
    fn tensor_to_mask(tensor: &Array4<f32>) -> Result<SegmentationMask> {
        let shape = tensor.shape();
        if shape.len() != 4 || shape[0] != 1 || shape[3] != 1 {
            return Err(RemovalError::processing(format!(
                "Expected output tensor (1, H, W, 1), got {shape:?}"
            )));
        }

        let height = shape[1];
        let width = shape[2];
        let mut mask_data = Vec::with_capacity(height * width);

        for y in 0..height {
            for x in 0..width {
                let value = tensor
                    .get([0, y, x, 0])
                    .copied()
                    .unwrap_or(0.0)
                    .clamp(0.0, 1.0);
                mask_data.push((value * 255.0) as u8);
            }
        }

        debug!(width, height, "mask quantized");
        Ok(SegmentationMask::new(mask_data, (width as u32, height as u32)))
    }

    /// Composite the cutout: mask upscaled to source dimensions and applied
    /// as the alpha channel
    fn apply_background_removal(
        image: &DynamicImage,
        mask: &SegmentationMask,
    ) -> Result<RgbaImage> {
        let rgba_image = image.to_rgba8();
        let (width, height) = rgba_image.dimensions();

        let sized_mask = if mask.dimensions == (width, height) {
            mask.clone()
        } else {
            mask.resize(width, height)?
        };

        let mut result: RgbaImage = ImageBuffer::new(width, height);
        for (x, y, pixel) in rgba_image.enumerate_pixels() {
            let pixel_index = (y * width + x) as usize;
            let alpha = sized_mask.data.get(pixel_index).copied().unwrap_or(0);
            result.put_pixel(x, y, image::Rgba([pixel[0], pixel[1], pixel[2], alpha]));
        }

        Ok(result)
    }
}
