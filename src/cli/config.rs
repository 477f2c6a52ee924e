//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::{Cli, CliOutputFormat, CliQuality};
use crate::{
    config::{OutputFormat, QualityLevel, RemovalConfig},
    services::ImageIoService,
};
use anyhow::{Context, Result};
use std::path::Path;

/// Convert CLI arguments to a [`RemovalConfig`]
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build a removal configuration from CLI arguments
    pub(crate) fn from_cli(cli: &Cli) -> Result<RemovalConfig> {
        let mut builder = RemovalConfig::builder()
            .output_format(OutputFormat::from(cli.format))
            .quality(QualityLevel::from(cli.quality))
            .num_threads(cli.threads)
            .debug(cli.verbose >= 2);

        if let Some(model_path) = &cli.model {
            builder = builder.model_path(model_path);
        }

        builder.build().context("Invalid configuration")
    }

    /// Validate CLI arguments before any work happens
    pub(crate) fn validate_cli(cli: &Cli) -> Result<()> {
        if cli.input != "-" {
            let path = Path::new(&cli.input);
            if !ImageIoService::is_supported_format(path) {
                anyhow::bail!(
                    "Unsupported input '{}': only PNG and JPEG images are accepted",
                    cli.input
                );
            }
        }

        if let Some(model_path) = &cli.model {
            if model_path.as_os_str().is_empty() {
                anyhow::bail!("Model path must not be empty");
            }
        }

        Ok(())
    }
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(format: CliOutputFormat) -> Self {
        match format {
            CliOutputFormat::Png => Self::Png,
            CliOutputFormat::Jpeg => Self::Jpeg,
        }
    }
}

impl From<CliQuality> for QualityLevel {
    fn from(quality: CliQuality) -> Self {
        match quality {
            CliQuality::Original => Self::Original,
            CliQuality::High => Self::High,
            CliQuality::Medium => Self::Medium,
        }
    }
}
