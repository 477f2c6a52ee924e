//! Command-line interface for single-image background removal

use super::config::CliConfigBuilder;
use crate::{
    config::ExportSettings,
    processor::BackgroundRemovalProcessor,
    services::{ProcessingStage, ProgressReporter, ProgressUpdate},
    tracing_config::init_cli_tracing,
    types::{ProcessingTimings, RemovalResult},
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Background removal CLI tool
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "cutout")]
pub struct Cli {
    /// Input image file (use "-" for stdin)
    #[arg(value_name = "INPUT")]
    pub input: String,

    /// Output file (use "-" for stdout) [default: <INPUT stem>_cutout.<ext>]
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = CliOutputFormat::Png)]
    pub format: CliOutputFormat,

    /// Export quality (JPEG only, PNG is lossless)
    #[arg(long, value_enum, default_value_t = CliQuality::Original)]
    pub quality: CliQuality,

    /// Path to the ONNX segmentation model [default: models/cutout.onnx]
    #[arg(short, long, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// Write the raw 256x256 segmentation mask instead of the cutout
    #[arg(long)]
    pub mask_only: bool,

    /// Number of inference threads (0 = auto-detect)
    #[arg(short, long, default_value_t = 0)]
    pub threads: usize,

    /// Increase logging verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format choices exposed on the command line
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliOutputFormat {
    /// PNG with alpha channel
    Png,
    /// Flattened JPEG
    #[value(name = "jpg", alias = "jpeg")]
    Jpeg,
}

/// Quality choices exposed on the command line
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliQuality {
    /// Maximum quality
    Original,
    /// High quality
    High,
    /// Medium quality
    Medium,
}

/// CLI entry point
///
/// # Errors
/// Returns an error for invalid arguments, intake failures, model failures,
/// and output write failures.
pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_cli_tracing(cli.verbose, cli.quiet).context("Failed to initialize tracing")?;

    CliConfigBuilder::validate_cli(&cli).context("Invalid CLI arguments")?;
    let config = CliConfigBuilder::from_cli(&cli).context("Failed to build configuration")?;
    let settings = config.export;

    info!(input = %cli.input, model = %config.model_path.display(), "starting cutout");

    let mut processor = BackgroundRemovalProcessor::new(config)
        .context("Failed to create background removal processor")?;

    let to_stdout = wants_stdout(&cli);
    if !cli.quiet && !to_stdout {
        processor = processor.with_progress_reporter(Arc::new(CliProgressReporter::new()));
    }

    let start_time = Instant::now();
    let result = if cli.input == "-" {
        let image_data = read_stdin()?;
        processor
            .process_bytes(&image_data)
            .context("Failed to remove background")?
    } else {
        processor
            .process_file(Path::new(&cli.input))
            .context("Failed to remove background")?
    };

    info!(timings = %result.timing_summary(), "background removal finished");

    write_result(&cli, &result, settings, to_stdout)?;

    info!(elapsed_ms = start_time.elapsed().as_millis() as u64, "done");
    Ok(())
}

/// Whether the result should go to stdout
///
/// Explicit `-o -` always wins; stdin input without an output target also
/// defaults to stdout so pipelines compose.
fn wants_stdout(cli: &Cli) -> bool {
    match cli.output.as_deref() {
        Some(target) => target == "-",
        None => cli.input == "-",
    }
}

fn write_result(
    cli: &Cli,
    result: &RemovalResult,
    settings: ExportSettings,
    to_stdout: bool,
) -> Result<()> {
    if cli.mask_only {
        if cli.format == CliOutputFormat::Jpeg {
            warn!("mask output is always PNG, ignoring --format jpg");
        }
        return write_mask(cli, result, to_stdout);
    }

    if to_stdout {
        let output_data = result
            .to_bytes(settings)
            .context("Failed to encode result")?;
        write_stdout(&output_data)?;
        info!("image written to stdout");
        return Ok(());
    }

    let output_path = match cli.output.as_deref() {
        Some(target) => PathBuf::from(target),
        None => default_output_path(Path::new(&cli.input), "cutout", settings.format.to_string()),
    };
    result
        .save(&output_path, settings)
        .context("Failed to save result")?;
    info!(path = %output_path.display(), "image saved");
    Ok(())
}

fn write_mask(cli: &Cli, result: &RemovalResult, to_stdout: bool) -> Result<()> {
    if to_stdout {
        let mask_image = result.mask.to_image().context("Failed to build mask image")?;
        let mut buffer = Vec::new();
        image::DynamicImage::ImageLuma8(mask_image)
            .write_to(
                &mut io::Cursor::new(&mut buffer),
                image::ImageFormat::Png,
            )
            .context("Failed to encode mask")?;
        write_stdout(&buffer)?;
        info!("mask written to stdout");
        return Ok(());
    }

    let output_path = match cli.output.as_deref() {
        Some(target) => PathBuf::from(target),
        None => default_output_path(Path::new(&cli.input), "mask", "png".to_string()),
    };
    result
        .mask
        .save_png(&output_path)
        .context("Failed to save mask")?;
    info!(path = %output_path.display(), "mask saved");
    Ok(())
}

/// Derive an output path next to the input: `photo.jpg` -> `photo_cutout.png`
fn default_output_path(input_path: &Path, suffix: &str, extension: String) -> PathBuf {
    let stem = input_path
        .file_stem()
        .map_or_else(|| "output".to_string(), |s| s.to_string_lossy().to_string());
    let file_name = format!("{stem}_{suffix}.{extension}");
    match input_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(file_name),
        _ => PathBuf::from(file_name),
    }
}

/// Read image data from stdin
fn read_stdin() -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    io::stdin()
        .read_to_end(&mut buffer)
        .context("Failed to read image data from stdin")?;
    if buffer.is_empty() {
        anyhow::bail!("No data received on stdin");
    }
    Ok(buffer)
}

/// Write encoded output to stdout
fn write_stdout(data: &[u8]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(data)
        .context("Failed to write to stdout")?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}

/// Progress bar bridging the pipeline's progress updates to the terminal
struct CliProgressReporter {
    bar: ProgressBar,
}

impl CliProgressReporter {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{bar:30.cyan/blue} {percent:>3}% {msg}")
        {
            bar.set_style(style);
        }
        Self { bar }
    }
}

impl ProgressReporter for CliProgressReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        self.bar.set_position(u64::from(update.progress));
        self.bar.set_message(update.description);
    }

    fn report_completion(&self, timings: ProcessingTimings) {
        self.bar
            .finish_with_message(format!("done in {}ms", timings.total_ms));
    }

    fn report_error(&self, stage: ProcessingStage, error: &str) {
        self.bar
            .abandon_with_message(format!("failed during {}: {error}", stage.description()));
    }
}
