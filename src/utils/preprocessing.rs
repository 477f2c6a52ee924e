//! Image preprocessing for the segmentation model
//!
//! The model consumes a fixed 256x256 RGB frame. Input images are resized
//! directly to that resolution with a bilinear filter (no aspect-ratio
//! preservation or padding) and normalized to [0, 1].

use crate::{error::Result, inference::MODEL_INPUT_SIZE};
use image::DynamicImage;
use ndarray::Array4;

/// Shared preprocessing for inference inputs
pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// Build the NHWC inference tensor for an image
    ///
    /// Steps: RGB conversion, bilinear resize to 256x256, division by 255.
    /// The returned tensor has shape (1, 256, 256, 3) with values in [0, 1].
    ///
    /// # Errors
    /// Currently infallible; the signature leaves room for resize limits.
    pub fn preprocess_for_inference(image: &DynamicImage) -> Result<Array4<f32>> {
        let rgb_image = image.to_rgb8();

        let resized = image::imageops::resize(
            &rgb_image,
            MODEL_INPUT_SIZE as u32,
            MODEL_INPUT_SIZE as u32,
            image::imageops::FilterType::Triangle,
        );

        let mut tensor =
            Array4::<f32>::zeros((1, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, 3));

        #[allow(clippy::indexing_slicing)]
        // Tensor dimensions are pre-allocated to match the resized frame
        for (y, row) in resized.rows().enumerate() {
            for (x, pixel) in row.enumerate() {
                tensor[[0, y, x, 0]] = f32::from(pixel[0]) / 255.0;
                tensor[[0, y, x, 1]] = f32::from(pixel[1]) / 255.0;
                tensor[[0, y, x, 2]] = f32::from(pixel[2]) / 255.0;
            }
        }

        Ok(tensor)
    }
}
