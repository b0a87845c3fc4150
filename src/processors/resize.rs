//! Square-stretch resizing for model input.
//!
//! Both models were trained on square-stretched input, so aspect ratio is
//! deliberately not preserved: the image is stretched to the target
//! resolution, never letterboxed. Input validation lives here because
//! resizing is the first step of every preprocessing path.

use crate::core::errors::{FoodLensError, FoodLensResult};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage};

/// Stretches images to a fixed square resolution.
#[derive(Debug, Clone)]
pub struct StretchResize {
    target: u32,
    filter: FilterType,
}

impl StretchResize {
    /// Creates a resizer for the given square target resolution.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `target` is 0.
    pub fn new(target: u32, filter: FilterType) -> FoodLensResult<Self> {
        if target == 0 {
            return Err(FoodLensError::config(
                "resize target must be greater than 0".to_string(),
            ));
        }
        Ok(Self { target, filter })
    }

    /// The square target resolution.
    pub fn target(&self) -> u32 {
        self.target
    }

    /// Validates the input and stretches it to the target resolution.
    ///
    /// # Errors
    ///
    /// * `InvalidImage` if the input has zero width or height.
    /// * `UnsupportedFormat` if the decoded pixel format does not carry
    ///   exactly 3 color channels.
    pub fn apply(&self, image: &DynamicImage) -> FoodLensResult<RgbImage> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(FoodLensError::invalid_image(format!(
                "image has zero dimension: {width}x{height}"
            )));
        }

        let channels = image.color().channel_count();
        if channels != 3 {
            return Err(FoodLensError::unsupported_format(format!(
                "expected 3-channel RGB input, got {channels} channels ({:?})",
                image.color()
            )));
        }

        let rgb = image.to_rgb8();
        Ok(image::imageops::resize(
            &rgb,
            self.target,
            self.target,
            self.filter,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Rgb, RgbaImage};

    fn gradient_image(width: u32, height: u32) -> DynamicImage {
        let mut img = RgbImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8]);
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn stretches_to_square_target() {
        let resizer = StretchResize::new(8, FilterType::Triangle).unwrap();
        let resized = resizer.apply(&gradient_image(20, 5)).unwrap();
        assert_eq!(resized.dimensions(), (8, 8));
    }

    #[test]
    fn zero_dimension_image_is_invalid() {
        let resizer = StretchResize::new(8, FilterType::Triangle).unwrap();
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 10));
        match resizer.apply(&empty) {
            Err(FoodLensError::InvalidImage { .. }) => {}
            other => panic!("expected InvalidImage, got {other:?}"),
        }
    }

    #[test]
    fn non_rgb_input_is_unsupported() {
        let resizer = StretchResize::new(8, FilterType::Triangle).unwrap();

        let rgba = DynamicImage::ImageRgba8(RgbaImage::new(4, 4));
        match resizer.apply(&rgba) {
            Err(FoodLensError::UnsupportedFormat { .. }) => {}
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }

        let gray = DynamicImage::ImageLuma8(GrayImage::new(4, 4));
        assert!(matches!(
            resizer.apply(&gray),
            Err(FoodLensError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn resizing_is_deterministic() {
        let resizer = StretchResize::new(16, FilterType::Triangle).unwrap();
        let img = gradient_image(33, 17);
        let first = resizer.apply(&img).unwrap();
        let second = resizer.apply(&img).unwrap();
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn zero_target_is_rejected() {
        assert!(StretchResize::new(0, FilterType::Triangle).is_err());
    }
}
