//! Configuration types for background removal operations

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default location of the segmentation model, relative to the working directory
pub const DEFAULT_MODEL_PATH: &str = "models/cutout.onnx";

/// Output image format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// PNG with alpha channel transparency
    #[serde(rename = "png")]
    Png,
    /// JPEG (no transparency, flattened RGB output)
    #[serde(rename = "jpg")]
    Jpeg,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Png
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Png => write!(f, "png"),
            Self::Jpeg => write!(f, "jpg"),
        }
    }
}

/// Export quality level
///
/// Maps to the JPEG encoder quality. PNG output is lossless and ignores
/// the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    /// Maximum quality (JPEG quality 100)
    Original,
    /// High quality (JPEG quality 90)
    High,
    /// Medium quality (JPEG quality 75)
    Medium,
}

impl Default for QualityLevel {
    fn default() -> Self {
        Self::Original
    }
}

impl QualityLevel {
    /// The JPEG encoder quality this level maps to
    #[must_use]
    pub fn jpeg_quality(self) -> u8 {
        match self {
            Self::Original => 100,
            Self::High => 90,
            Self::Medium => 75,
        }
    }
}

impl std::fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Original => write!(f, "original"),
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
        }
    }
}

/// Export settings selected by the user
///
/// This is a recognized configuration object: both fields feed the export
/// encoder directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Output format
    pub format: OutputFormat,
    /// Quality level (JPEG only, PNG is lossless)
    pub quality: QualityLevel,
}

impl ExportSettings {
    /// Create export settings from a format and quality pair
    #[must_use]
    pub fn new(format: OutputFormat, quality: QualityLevel) -> Self {
        Self { format, quality }
    }
}

/// Configuration for background removal operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovalConfig {
    /// Path to the ONNX segmentation model
    pub model_path: PathBuf,

    /// Export settings for the processed image
    pub export: ExportSettings,

    /// Enable debug mode (additional logging and validation)
    pub debug: bool,

    /// Number of intra-op threads for inference (0 = auto)
    pub intra_threads: usize,

    /// Number of inter-op threads for inference (0 = auto)
    pub inter_threads: usize,

    /// Optional format hint for reader-based processing
    #[serde(skip)]
    pub format_hint: Option<ImageFormat>,
}

impl Default for RemovalConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            export: ExportSettings::default(),
            debug: false,
            intra_threads: 0, // Auto-detect optimal intra-op threads
            inter_threads: 0, // Auto-detect optimal inter-op threads
            format_hint: None,
        }
    }
}

impl RemovalConfig {
    /// Create a new configuration builder for fluent API construction
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cutout::{OutputFormat, QualityLevel, RemovalConfig};
    ///
    /// let config = RemovalConfig::builder()
    ///     .output_format(OutputFormat::Jpeg)
    ///     .quality(QualityLevel::High)
    ///     .build()
    ///     .unwrap();
    /// ```
    #[must_use]
    pub fn builder() -> RemovalConfigBuilder {
        RemovalConfigBuilder::default()
    }

    /// Validate all configuration parameters
    ///
    /// # Errors
    /// - Empty model path
    pub fn validate(&self) -> crate::Result<()> {
        if self.model_path.as_os_str().is_empty() {
            return Err(crate::error::RemovalError::invalid_config(
                "Model path must not be empty",
            ));
        }

        Ok(())
    }
}

/// Builder for `RemovalConfig`
#[derive(Debug, Default)]
pub struct RemovalConfigBuilder {
    config: RemovalConfig,
}

impl RemovalConfigBuilder {
    /// Set the model file path
    #[must_use]
    pub fn model_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.model_path = path.into();
        self
    }

    /// Set the export settings in one call
    #[must_use]
    pub fn export_settings(mut self, settings: ExportSettings) -> Self {
        self.config.export = settings;
        self
    }

    /// Set output format
    #[must_use]
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.export.format = format;
        self
    }

    /// Set export quality level
    #[must_use]
    pub fn quality(mut self, quality: QualityLevel) -> Self {
        self.config.export.quality = quality;
        self
    }

    /// Enable debug mode
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Set number of intra-op threads
    #[must_use]
    pub fn intra_threads(mut self, threads: usize) -> Self {
        self.config.intra_threads = threads;
        self
    }

    /// Set number of inter-op threads
    #[must_use]
    pub fn inter_threads(mut self, threads: usize) -> Self {
        self.config.inter_threads = threads;
        self
    }

    /// Set both intra and inter threads (convenience method)
    ///
    /// Intra-op threads are set to `threads`, inter-op threads to half of
    /// that with a minimum of 1. Zero keeps both on auto-detection.
    #[must_use]
    pub fn num_threads(mut self, threads: usize) -> Self {
        self.config.intra_threads = threads;
        self.config.inter_threads = if threads > 0 { (threads / 2).max(1) } else { 0 };
        self
    }

    /// Set the format hint for reader-based processing
    #[must_use]
    pub fn format_hint(mut self, format: Option<ImageFormat>) -> Self {
        self.config.format_hint = format;
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    /// - Empty model path
    pub fn build(self) -> crate::Result<RemovalConfig> {
        let config = self.config;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RemovalConfig::default();
        assert_eq!(config.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
        assert_eq!(config.export.format, OutputFormat::Png);
        assert_eq!(config.export.quality, QualityLevel::Original);
        assert!(!config.debug);
    }

    #[test]
    fn test_config_builder() {
        let config = RemovalConfig::builder()
            .output_format(OutputFormat::Jpeg)
            .quality(QualityLevel::Medium)
            .debug(true)
            .build()
            .unwrap();

        assert_eq!(config.export.format, OutputFormat::Jpeg);
        assert_eq!(config.export.quality, QualityLevel::Medium);
        assert!(config.debug);
    }

    #[test]
    fn test_config_validation() {
        let config = RemovalConfig::default();
        assert!(config.validate().is_ok());

        let mut config = RemovalConfig::default();
        config.model_path = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_quality_level_mapping() {
        assert_eq!(QualityLevel::Original.jpeg_quality(), 100);
        assert_eq!(QualityLevel::High.jpeg_quality(), 90);
        assert_eq!(QualityLevel::Medium.jpeg_quality(), 75);
    }

    #[test]
    fn test_output_format_enum() {
        assert_eq!(OutputFormat::default(), OutputFormat::Png);

        assert_eq!(format!("{}", OutputFormat::Png), "png");
        assert_eq!(format!("{}", OutputFormat::Jpeg), "jpg");

        let format1 = OutputFormat::Jpeg;
        let format2 = format1;
        assert_eq!(format1, format2);
    }

    #[test]
    fn test_quality_level_enum() {
        assert_eq!(QualityLevel::default(), QualityLevel::Original);

        assert_eq!(format!("{}", QualityLevel::Original), "original");
        assert_eq!(format!("{}", QualityLevel::High), "high");
        assert_eq!(format!("{}", QualityLevel::Medium), "medium");
    }

    #[test]
    fn test_export_settings_recognized_object() {
        // The option object arrives as {"format": ..., "quality": ...}
        let settings: ExportSettings =
            serde_json::from_str(r#"{"format":"jpg","quality":"medium"}"#).unwrap();
        assert_eq!(settings.format, OutputFormat::Jpeg);
        assert_eq!(settings.quality, QualityLevel::Medium);

        let settings: ExportSettings =
            serde_json::from_str(r#"{"format":"png","quality":"original"}"#).unwrap();
        assert_eq!(settings.format, OutputFormat::Png);
        assert_eq!(settings.quality, QualityLevel::Original);

        let json = serde_json::to_string(&ExportSettings::default()).unwrap();
        assert!(json.contains(r#""format":"png""#));
        assert!(json.contains(r#""quality":"original""#));
    }

    #[test]
    fn test_export_settings_rejects_unknown_values() {
        let result = serde_json::from_str::<ExportSettings>(r#"{"format":"webp","quality":"high"}"#);
        assert!(result.is_err());

        let result = serde_json::from_str::<ExportSettings>(r#"{"format":"png","quality":"low"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_removal_config_builder_thread_methods() {
        let config = RemovalConfig::builder().intra_threads(4).build().unwrap();
        assert_eq!(config.intra_threads, 4);

        let config = RemovalConfig::builder().inter_threads(2).build().unwrap();
        assert_eq!(config.inter_threads, 2);

        let config = RemovalConfig::builder().num_threads(8).build().unwrap();
        assert_eq!(config.intra_threads, 8);
        assert_eq!(config.inter_threads, 4);

        let config = RemovalConfig::builder().num_threads(1).build().unwrap();
        assert_eq!(config.intra_threads, 1);
        assert_eq!(config.inter_threads, 1);

        let config = RemovalConfig::builder().num_threads(0).build().unwrap();
        assert_eq!(config.intra_threads, 0);
        assert_eq!(config.inter_threads, 0);
    }

    #[test]
    fn test_removal_config_format_hint() {
        let config = RemovalConfig::builder()
            .format_hint(Some(ImageFormat::Png))
            .build()
            .unwrap();
        assert_eq!(config.format_hint, Some(ImageFormat::Png));

        let config = RemovalConfig::builder().build().unwrap();
        assert_eq!(config.format_hint, None);
    }

    #[test]
    fn test_removal_config_builder_chaining() {
        let config = RemovalConfig::builder()
            .model_path("custom/model.onnx")
            .output_format(OutputFormat::Jpeg)
            .quality(QualityLevel::High)
            .debug(true)
            .intra_threads(6)
            .inter_threads(3)
            .build()
            .unwrap();

        assert_eq!(config.model_path, PathBuf::from("custom/model.onnx"));
        assert_eq!(config.export.format, OutputFormat::Jpeg);
        assert_eq!(config.export.quality, QualityLevel::High);
        assert!(config.debug);
        assert_eq!(config.intra_threads, 6);
        assert_eq!(config.inter_threads, 3);
    }

    #[test]
    fn test_removal_config_serde_attributes() {
        let config = RemovalConfig {
            format_hint: Some(ImageFormat::Png),
            ..RemovalConfig::default()
        };

        let json = serde_json::to_string(&config).unwrap();

        // format_hint is skipped in serialization
        assert!(!json.contains("format_hint"));
        assert!(json.contains("model_path"));
        assert!(json.contains("export"));

        let deserialized: RemovalConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.model_path, config.model_path);
        assert_eq!(deserialized.export, config.export);
        assert_eq!(deserialized.format_hint, None);
    }

    #[test]
    fn test_removal_config_builder_default() {
        let builder = RemovalConfigBuilder::default();
        let config = builder.build().unwrap();
        assert_eq!(config, RemovalConfig::default());
    }
}
