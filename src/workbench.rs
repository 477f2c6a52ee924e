//! Stateful front end over the removal pipeline
//!
//! [`Workbench`] models an interactive editing surface: it holds at most one
//! displayed image, a notification log, and the export settings the user has
//! selected. Opening a new image replaces the displayed one; removal replaces
//! it with the cutout. Failures never clobber the displayed image, and every
//! failure surfaced here records exactly one notification.

use crate::{
    config::{ExportSettings, OutputFormat, QualityLevel, RemovalConfig},
    error::{RemovalError, Result},
    processor::BackgroundRemovalProcessor,
    services::{ImageIoService, OutputFormatHandler},
    types::{SegmentationMask, SourceImage},
};
use image::DynamicImage;
use std::path::Path;
use tracing::{debug, info};

/// Severity of a workbench notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSeverity {
    /// Informational status update
    Info,
    /// A failure the user should see
    Error,
}

/// One entry in the workbench notification log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// How loudly to present this entry
    pub severity: NotificationSeverity,
    /// Human-readable message
    pub message: String,
}

/// What a removal trigger ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// The displayed image was replaced with its cutout
    Completed,
    /// No image was loaded; nothing happened
    NothingToDo,
}

/// Interactive state around the removal pipeline
///
/// Holds the currently displayed image (if any), the segmentation mask from
/// the most recent removal, a notification log, and mutable export settings.
pub struct Workbench {
    processor: BackgroundRemovalProcessor,
    current: Option<SourceImage>,
    last_mask: Option<SegmentationMask>,
    notifications: Vec<Notification>,
    export_settings: ExportSettings,
}

impl Workbench {
    /// Create a workbench with the given configuration
    ///
    /// # Errors
    /// Returns an error when the configuration is invalid.
    pub fn new(config: RemovalConfig) -> Result<Self> {
        let export_settings = config.export;
        Ok(Self {
            processor: BackgroundRemovalProcessor::new(config)?,
            current: None,
            last_mask: None,
            notifications: Vec::new(),
            export_settings,
        })
    }

    /// Create a workbench around an existing processor
    #[must_use]
    pub fn with_processor(processor: BackgroundRemovalProcessor) -> Self {
        let export_settings = processor.config().export;
        Self {
            processor,
            current: None,
            last_mask: None,
            notifications: Vec::new(),
            export_settings,
        }
    }

    /// Open an image file as the displayed image
    ///
    /// On failure the previously displayed image is left untouched and one
    /// failure notification is recorded.
    ///
    /// # Errors
    /// Intake failures: size ceiling, unsupported format, decode errors.
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let loaded = ImageIoService::load_image(&path);
        self.publish(loaded, || format!("Failed to open {}", path.as_ref().display()))
    }

    /// Open encoded image bytes as the displayed image
    ///
    /// On failure the previously displayed image is left untouched and one
    /// failure notification is recorded.
    ///
    /// # Errors
    /// Intake failures: size ceiling, unsupported format, decode errors.
    pub fn open_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let loaded = ImageIoService::load_from_bytes(bytes);
        self.publish(loaded, || "Failed to open image data".to_string())
    }

    fn publish<F>(&mut self, loaded: Result<SourceImage>, context: F) -> Result<()>
    where
        F: FnOnce() -> String,
    {
        match loaded {
            Ok(source) => {
                let (width, height) = source.dimensions();
                info!(width, height, format = ?source.format, "image opened");
                self.notify_info(format!("Opened {width}x{height} image"));
                self.current = Some(source);
                self.last_mask = None;
                Ok(())
            },
            Err(e) => {
                self.notify_error(format!("{}: {e}", context()));
                Err(e)
            },
        }
    }

    /// Remove the background of the displayed image
    ///
    /// With no image loaded this is a no-op: the model is not touched and no
    /// error is raised. On success the displayed image becomes the cutout.
    /// On failure the displayed image stays as it was and exactly one failure
    /// notification is recorded.
    ///
    /// # Errors
    /// - [`RemovalError::Busy`] when a run is already in flight
    /// - Model loading and inference failures
    pub fn remove_background(&mut self) -> Result<RemovalOutcome> {
        let Some(source) = self.current.as_ref() else {
            debug!("no image loaded, removal is a no-op");
            return Ok(RemovalOutcome::NothingToDo);
        };

        match self.processor.process_source(source) {
            Ok(result) => {
                self.notify_info(format!(
                    "Background removed ({})",
                    result.timing_summary()
                ));
                if let Some(current) = self.current.as_mut() {
                    current.image = result.image;
                }
                self.last_mask = Some(result.mask);
                Ok(RemovalOutcome::Completed)
            },
            Err(e) => {
                self.notify_error(format!("Background removal failed: {e}"));
                Err(e)
            },
        }
    }

    /// Encode the displayed image with the current export settings
    ///
    /// # Errors
    /// Fails when no image is displayed or encoding fails; either failure
    /// records one notification.
    pub fn export_to_bytes(&mut self) -> Result<Vec<u8>> {
        let Some(source) = self.current.as_ref() else {
            let e = RemovalError::processing("No image to export");
            self.notify_error(e.to_string());
            return Err(e);
        };

        match OutputFormatHandler::encode(source.image.to_rgba8(), self.export_settings) {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                self.notify_error(format!("Export failed: {e}"));
                Err(e)
            },
        }
    }

    /// Encode the displayed image and write it to a file
    ///
    /// # Errors
    /// All failures from [`Self::export_to_bytes`] plus write errors.
    pub fn export<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let bytes = self.export_to_bytes()?;
        if let Err(e) = std::fs::write(&path, &bytes) {
            let e = RemovalError::file_io_error("write exported image to", &path, e);
            self.notify_error(e.to_string());
            return Err(e);
        }
        info!(path = %path.as_ref().display(), bytes = bytes.len(), "image exported");
        Ok(())
    }

    /// The currently displayed image
    #[must_use]
    pub fn current_image(&self) -> Option<&DynamicImage> {
        self.current.as_ref().map(|source| &source.image)
    }

    /// The segmentation mask from the most recent removal
    #[must_use]
    pub fn last_mask(&self) -> Option<&SegmentationMask> {
        self.last_mask.as_ref()
    }

    /// Whether an image is currently displayed
    #[must_use]
    pub fn has_image(&self) -> bool {
        self.current.is_some()
    }

    /// Whether a removal run is in flight
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.processor.is_processing()
    }

    /// Select the export format
    pub fn set_export_format(&mut self, format: OutputFormat) {
        self.export_settings.format = format;
    }

    /// Select the export quality
    pub fn set_export_quality(&mut self, quality: QualityLevel) {
        self.export_settings.quality = quality;
    }

    /// The currently selected export settings
    #[must_use]
    pub fn export_settings(&self) -> ExportSettings {
        self.export_settings
    }

    /// The notification log, oldest first
    #[must_use]
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Drop all recorded notifications
    pub fn clear_notifications(&mut self) {
        self.notifications.clear();
    }

    fn notify_info(&mut self, message: String) {
        self.notifications.push(Notification {
            severity: NotificationSeverity::Info,
            message,
        });
    }

    fn notify_error(&mut self, message: String) {
        self.notifications.push(Notification {
            severity: NotificationSeverity::Error,
            message,
        });
    }
}
