//! Output format handling for exported cutouts
//!
//! Converts RGBA cutouts into the shape each export format needs and encodes
//! them according to the recognized export settings.

use crate::{
    config::{ExportSettings, OutputFormat},
    error::{RemovalError, Result},
};
use image::{DynamicImage, ImageBuffer, RgbaImage};
use tracing::warn;

/// Service for export format conversion and encoding
pub struct OutputFormatHandler;

impl OutputFormatHandler {
    /// Convert an RGBA cutout to the representation the format needs
    ///
    /// JPEG has no alpha channel, so the cutout is flattened to RGB; the
    /// transparent background becomes black.
    pub fn convert_format(rgba_image: RgbaImage, format: OutputFormat) -> DynamicImage {
        match format {
            OutputFormat::Png => DynamicImage::ImageRgba8(rgba_image),
            OutputFormat::Jpeg => {
                let (width, height) = rgba_image.dimensions();
                let mut rgb_image = ImageBuffer::new(width, height);

                for (x, y, pixel) in rgba_image.enumerate_pixels() {
                    rgb_image.put_pixel(x, y, image::Rgb([pixel[0], pixel[1], pixel[2]]));
                }

                DynamicImage::ImageRgb8(rgb_image)
            },
        }
    }

    /// Encode an RGBA cutout to bytes per the export settings
    ///
    /// PNG is lossless and ignores the quality level; JPEG uses the encoder
    /// quality mapped from the quality level.
    ///
    /// # Errors
    /// Returns an error when encoding fails.
    pub fn encode(rgba_image: RgbaImage, settings: ExportSettings) -> Result<Vec<u8>> {
        let converted = Self::convert_format(rgba_image, settings.format);
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);

        match settings.format {
            OutputFormat::Png => {
                converted
                    .write_to(&mut cursor, image::ImageFormat::Png)
                    .map_err(|e| {
                        RemovalError::processing(format!("Failed to encode PNG: {e}"))
                    })?;
            },
            OutputFormat::Jpeg => {
                let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                    &mut cursor,
                    settings.quality.jpeg_quality(),
                );
                encoder.encode_image(&converted).map_err(|e| {
                    RemovalError::processing(format!("Failed to encode JPEG: {e}"))
                })?;
            },
        }

        Ok(buffer)
    }

    /// File extension for a format, without the dot
    #[must_use]
    pub fn get_extension(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }

    /// Whether a format keeps the alpha channel
    #[must_use]
    pub fn supports_transparency(format: OutputFormat) -> bool {
        match format {
            OutputFormat::Png => true,
            OutputFormat::Jpeg => false,
        }
    }

    /// Warn when the chosen format will flatten the transparent background
    pub fn validate_for_cutout(format: OutputFormat) {
        if !Self::supports_transparency(format) {
            warn!(
                format = %format,
                "output format has no alpha channel, cutout background will be flattened"
            );
        }
    }
}
