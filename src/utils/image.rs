//! Utility functions for loading and constructing images.
//!
//! The pipeline itself only consumes decoded images; these helpers exist
//! for callers that start from a file on disk or from raw pixel data.

use crate::core::errors::{FoodLensError, FoodLensResult};
use image::{DynamicImage, ImageBuffer, RgbImage};

/// Loads an image from a file path.
///
/// Decoding failures surface as `ImageLoad`; format validation (channel
/// count, dimensions) happens later, inside the pipeline's preprocessing.
///
/// # Arguments
///
/// * `path` - A reference to the path of the image file to load
///
/// # Returns
///
/// * `Ok(DynamicImage)` - The decoded image
/// * `Err(FoodLensError)` - An error if the image could not be decoded
pub fn load_image(path: &std::path::Path) -> FoodLensResult<DynamicImage> {
    image::open(path).map_err(FoodLensError::ImageLoad)
}

/// Creates an RgbImage from raw pixel data.
///
/// The data must be in interleaved RGB format (3 bytes per pixel) and the
/// length must match the specified width and height.
///
/// # Returns
///
/// * `Some(RgbImage)` - The created RGB image if the data is valid
/// * `None` - If the data length doesn't match the specified dimensions
pub fn rgb_from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<RgbImage> {
    if data.len() != (width * height * 3) as usize {
        return None;
    }

    ImageBuffer::from_raw(width, height, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_construction_checks_length() {
        assert!(rgb_from_raw(2, 2, vec![0u8; 12]).is_some());
        assert!(rgb_from_raw(2, 2, vec![0u8; 11]).is_none());
    }

    #[test]
    fn missing_file_is_an_image_load_error() {
        let err = load_image(std::path::Path::new("no_such_photo.jpg")).unwrap_err();
        assert!(matches!(err, FoodLensError::ImageLoad(_)));
    }
}
