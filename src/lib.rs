#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # Cutout
//!
//! A Rust library for single-image background removal with a pure Rust
//! inference backend (Tract) and a fixed-path ONNX segmentation model.
//!
//! The pipeline decodes a PNG or JPEG input, resizes it to the model's
//! 256x256 input frame, runs a forward pass, quantizes the predicted
//! soft mask, and composites it back onto the original bitmap as an
//! alpha channel.
//!
//! ## Features
//!
//! - **Strict intake**: single image, PNG/JPEG only, 10 MiB ceiling
//!   enforced before any decoding
//! - **Cached model session**: the model loads at most once per process
//!   and is reused across runs
//! - **Observable mutual exclusion**: overlapping runs fail fast with a
//!   busy error instead of queueing
//! - **Export control**: PNG (with alpha) or flattened JPEG at selectable
//!   quality levels
//! - **CLI integration**: optional `cutout` binary (enable with the `cli`
//!   feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cutout::{remove_background_from_reader, RemovalConfig};
//! use tokio::fs::File;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = RemovalConfig::default();
//! let file = File::open("input.jpg").await?;
//! let result = remove_background_from_reader(file, &config).await?;
//! result.save_png("output.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Interactive state
//!
//! [`Workbench`] wraps the pipeline with the state an interactive front end
//! needs: the currently displayed image, a notification log, and mutable
//! export settings.
//!
//! ```rust,no_run
//! use cutout::{RemovalConfig, Workbench};
//!
//! # fn example() -> anyhow::Result<()> {
//! let mut workbench = Workbench::new(RemovalConfig::default())?;
//! workbench.open("photo.png")?;
//! workbench.remove_background()?;
//! workbench.export("cutout.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Library vs CLI Usage
//!
//! - **Library usage**: all processing functionality is available by default
//! - **CLI usage**: the `cli` feature adds the binary, progress bars, and
//!   tracing setup
//!
//! ### Feature Flags
//!
//! - `tract` (default): pure Rust inference backend
//! - `cli` (default): command-line interface and console progress reporting

pub mod backends;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod guard;
pub mod inference;
pub mod processor;
pub mod services;
pub mod session;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;
pub mod utils;
pub mod workbench;

use tokio::io::AsyncRead;

pub use backends::*;
pub use config::{
    ExportSettings, OutputFormat, QualityLevel, RemovalConfig, RemovalConfigBuilder,
    DEFAULT_MODEL_PATH,
};
pub use error::{RemovalError, Result};
pub use guard::{ProcessingGuard, ProcessingSlot};
pub use inference::{InferenceBackend, MODEL_INPUT_SIZE};
pub use processor::BackgroundRemovalProcessor;
pub use services::{
    ConsoleProgressReporter, ImageIoService, NoOpProgressReporter, OutputFormatHandler,
    ProcessingStage, ProgressReporter, ProgressTracker, ProgressUpdate, MAX_INPUT_BYTES,
};
pub use session::{BackendFactory, DefaultBackendFactory, ModelSession, SessionGuard};
pub use types::{
    MaskStatistics, ProcessingMetadata, ProcessingTimings, RemovalResult, SegmentationMask,
    SourceImage,
};
pub use utils::ImagePreprocessor;
pub use workbench::{Notification, NotificationSeverity, RemovalOutcome, Workbench};

#[cfg(feature = "cli")]
pub use tracing_config::{init_cli_tracing, TracingConfig};

/// Remove the background from an image provided as encoded bytes
///
/// Suitable for web servers and memory-based processing where no file is
/// available. The bytes go through the same intake validation as files:
/// size ceiling first, then content sniffing, then decode.
///
/// # Examples
///
/// ```rust,no_run
/// use cutout::{remove_background_from_bytes, RemovalConfig};
///
/// # async fn example(upload_bytes: Vec<u8>) -> anyhow::Result<()> {
/// let config = RemovalConfig::default();
/// let result = remove_background_from_bytes(&upload_bytes, &config).await?;
/// let output = result.to_bytes(config.export)?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
/// - Intake failures (size ceiling, unsupported format, decode)
/// - Model loading and inference failures
/// - [`RemovalError::Busy`] when another run holds the processing slot
pub async fn remove_background_from_bytes(
    image_bytes: &[u8],
    config: &RemovalConfig,
) -> Result<RemovalResult> {
    let processor = BackgroundRemovalProcessor::new(config.clone())?;
    processor.process_bytes(image_bytes)
}

/// Remove the background from an already-decoded image
///
/// The most direct API for in-memory processing: no intake validation
/// happens because there are no encoded bytes to validate. The result
/// metadata records the input as PNG since the bitmap carries no encoding.
///
/// # Examples
///
/// ```rust,no_run
/// use cutout::{remove_background_from_image, RemovalConfig};
/// use image::DynamicImage;
///
/// # async fn example(img: DynamicImage) -> anyhow::Result<()> {
/// let config = RemovalConfig::default();
/// let result = remove_background_from_image(img, &config).await?;
/// result.save_png("output.png")?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
/// - Model loading and inference failures
/// - [`RemovalError::Busy`] when another run holds the processing slot
pub async fn remove_background_from_image(
    image: image::DynamicImage,
    config: &RemovalConfig,
) -> Result<RemovalResult> {
    let source = SourceImage::new(image, image::ImageFormat::Png, 0);
    let processor = BackgroundRemovalProcessor::new(config.clone())?;
    processor.process_source(&source)
}

/// Remove the background from an async reader stream
///
/// Accepts any async readable stream: network bodies, files, cursors. The
/// stream is drained into memory and handed to the byte-based intake.
///
/// # Examples
///
/// ```rust,no_run
/// use cutout::{remove_background_from_reader, RemovalConfig};
/// use std::io::Cursor;
///
/// # async fn example(image_bytes: Vec<u8>) -> anyhow::Result<()> {
/// let config = RemovalConfig::default();
/// let result = remove_background_from_reader(Cursor::new(image_bytes), &config).await?;
/// result.save_png("output.png")?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
/// - Stream read failures
/// - All errors from [`remove_background_from_bytes`]
pub async fn remove_background_from_reader<R: AsyncRead + Unpin>(
    reader: R,
    config: &RemovalConfig,
) -> Result<RemovalResult> {
    let processor = BackgroundRemovalProcessor::new(config.clone())?;
    processor.process_reader(reader).await
}
