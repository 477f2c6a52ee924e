//! Image intake and file I/O
//!
//! All image bytes enter the pipeline through this module. The size ceiling
//! is enforced on the encoded bytes before any decode work happens, so an
//! oversized file is rejected without allocating decoder state.

use crate::{
    error::{RemovalError, Result},
    types::SourceImage,
};
use image::ImageFormat;
use std::path::Path;
use tracing::debug;

/// Maximum accepted encoded image size, checked before decoding
pub const MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;

/// Service for image intake and export I/O
pub struct ImageIoService;

impl ImageIoService {
    /// Load and validate an image file
    ///
    /// The file size is checked against [`MAX_INPUT_BYTES`] from filesystem
    /// metadata before the file content is read.
    ///
    /// # Errors
    /// - [`RemovalError::SizeLimit`] when the file exceeds the ceiling
    /// - [`RemovalError::UnsupportedFormat`] for anything but PNG or JPEG
    /// - I/O and decode failures
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<SourceImage> {
        let path_ref = path.as_ref();

        let metadata = std::fs::metadata(path_ref)
            .map_err(|e| RemovalError::file_io_error("read image file", path_ref, e))?;
        if metadata.len() > MAX_INPUT_BYTES {
            return Err(RemovalError::size_limit(metadata.len(), MAX_INPUT_BYTES));
        }

        let bytes = std::fs::read(path_ref)
            .map_err(|e| RemovalError::file_io_error("read image file", path_ref, e))?;

        Self::load_from_bytes(&bytes).map_err(|e| match e {
            RemovalError::UnsupportedFormat(format) => {
                let extension = path_ref
                    .extension()
                    .and_then(|s| s.to_str())
                    .unwrap_or("unknown");
                RemovalError::unsupported_format(format!("{format} (extension: {extension})"))
            },
            other => other,
        })
    }

    /// Decode image bytes into a validated source image
    ///
    /// The byte length is checked against [`MAX_INPUT_BYTES`] before the
    /// format sniff and decode. Only PNG and JPEG content is accepted, based
    /// on the magic bytes rather than any filename.
    ///
    /// # Errors
    /// - [`RemovalError::SizeLimit`] when the payload exceeds the ceiling
    /// - [`RemovalError::UnsupportedFormat`] for unrecognized or excluded
    ///   content
    /// - Decode failures
    pub fn load_from_bytes(bytes: &[u8]) -> Result<SourceImage> {
        let encoded_size = bytes.len() as u64;
        if encoded_size > MAX_INPUT_BYTES {
            return Err(RemovalError::size_limit(encoded_size, MAX_INPUT_BYTES));
        }

        let format = image::guess_format(bytes)
            .map_err(|_| RemovalError::unsupported_format("unrecognized image content"))?;

        if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
            return Err(RemovalError::unsupported_format(format!("{format:?}")));
        }

        let decoded = image::load_from_memory_with_format(bytes, format)?;

        debug!(
            format = ?format,
            encoded_size,
            width = decoded.width(),
            height = decoded.height(),
            "image intake accepted"
        );

        Ok(SourceImage {
            image: decoded,
            format,
            encoded_size,
        })
    }

    /// Load an image from an async reader
    ///
    /// Reads the stream fully into memory, then applies the same intake
    /// checks as [`Self::load_from_bytes`].
    ///
    /// # Errors
    /// - Stream read failures
    /// - All intake errors from [`Self::load_from_bytes`]
    pub async fn load_from_reader<R: tokio::io::AsyncRead + Unpin>(
        mut reader: R,
    ) -> Result<SourceImage> {
        use tokio::io::AsyncReadExt;

        let mut buffer = Vec::new();
        AsyncReadExt::read_to_end(&mut reader, &mut buffer)
            .await
            .map_err(|e| RemovalError::processing(format!("Failed to read from stream: {e}")))?;

        Self::load_from_bytes(&buffer)
    }

    /// Whether a file path carries an accepted image extension
    #[must_use]
    pub fn is_supported_format<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_lowercase)
            .is_some_and(|ext| matches!(ext.as_str(), "jpg" | "jpeg" | "png"))
    }
}
