//! Image normalization for model input.
//!
//! This module converts an RGB image into a planar (CHW) float tensor with a
//! batch dimension of 1. Scale, mean, and std are folded into per-channel
//! `alpha`/`beta` factors so a single multiply-add covers both normalization
//! schemes used in the pipeline: plain `value / 255` scaling for the
//! detection model, and mean/std normalization for the classification model.

use crate::core::Tensor4D;
use crate::core::errors::{FoodLensError, FoodLensResult};
use image::RgbImage;

/// Normalizes images into planar CHW tensors.
///
/// The output value for channel `c` is `pixel[c] * alpha[c] + beta[c]`, with
/// `alpha = scale / std` and `beta = -mean / std`.
#[derive(Debug, Clone)]
pub struct NormalizeImage {
    /// Scaling factors for each channel (alpha = scale / std).
    alpha: [f32; 3],
    /// Offset values for each channel (beta = -mean / std).
    beta: [f32; 3],
}

impl NormalizeImage {
    /// Creates a new NormalizeImage instance with the specified parameters.
    ///
    /// # Arguments
    ///
    /// * `scale` - Scaling factor applied before mean subtraction (typically
    ///   `1.0 / 255.0`)
    /// * `mean` - Mean values for each channel (RGB order)
    /// * `std` - Standard deviation values for each channel (RGB order)
    ///
    /// # Errors
    ///
    /// Returns a configuration error if scale is not a positive finite value
    /// or any standard deviation is not a positive finite value.
    pub fn new(scale: f32, mean: [f32; 3], std: [f32; 3]) -> FoodLensResult<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(FoodLensError::config(format!(
                "scale must be a positive finite value, got {scale}"
            )));
        }
        for (i, &s) in std.iter().enumerate() {
            if !s.is_finite() || s <= 0.0 {
                return Err(FoodLensError::config(format!(
                    "standard deviation at index {i} must be a positive finite value, got {s}"
                )));
            }
        }
        for (i, &m) in mean.iter().enumerate() {
            if !m.is_finite() {
                return Err(FoodLensError::config(format!(
                    "mean at index {i} is not finite: {m}"
                )));
            }
        }

        let mut alpha = [0.0f32; 3];
        let mut beta = [0.0f32; 3];
        for c in 0..3 {
            alpha[c] = scale / std[c];
            beta[c] = -mean[c] / std[c];
        }

        Ok(Self { alpha, beta })
    }

    /// Creates a normalizer that only rescales pixel values to `[0, 1]`,
    /// as the detection model expects.
    pub fn unit_scale() -> Self {
        Self {
            alpha: [1.0 / 255.0; 3],
            beta: [0.0; 3],
        }
    }

    /// Normalizes a single image into a planar CHW tensor with batch
    /// dimension 1.
    ///
    /// All R values come first, then all G, then all B; within a channel,
    /// values are in row-major pixel order. The transformation is pure and
    /// deterministic: the same image yields a bit-identical tensor.
    pub fn normalize_to(&self, img: &RgbImage) -> FoodLensResult<Tensor4D> {
        let (width, height) = img.dimensions();
        let channels = 3usize;
        let plane = (height * width) as usize;

        let mut result = vec![0.0f32; channels * plane];
        for c in 0..channels {
            let dst = &mut result[c * plane..(c + 1) * plane];
            for (i, pixel) in img.pixels().enumerate() {
                dst[i] = pixel[c] as f32 * self.alpha[c] + self.beta[c];
            }
        }

        let tensor = Tensor4D::from_shape_vec(
            (1, channels, height as usize, width as usize),
            result,
        )?;
        Ok(tensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn test_image() -> RgbImage {
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 255, 0]));
        img.put_pixel(0, 1, Rgb([0, 0, 255]));
        img.put_pixel(1, 1, Rgb([51, 102, 153]));
        img
    }

    #[test]
    fn unit_scale_divides_by_255() {
        let normalizer = NormalizeImage::unit_scale();
        let tensor = normalizer.normalize_to(&test_image()).unwrap();

        assert_eq!(tensor.shape(), &[1, 3, 2, 2]);
        assert_eq!(tensor[[0, 0, 0, 0]], 1.0);
        assert_eq!(tensor[[0, 1, 0, 1]], 1.0);
        assert_eq!(tensor[[0, 2, 1, 0]], 1.0);
        assert_eq!(tensor[[0, 0, 1, 1]], 51.0 / 255.0);
    }

    #[test]
    fn output_is_planar_not_interleaved() {
        let normalizer = NormalizeImage::unit_scale();
        let tensor = normalizer.normalize_to(&test_image()).unwrap();

        // Pixel (x=0, y=0) is pure red: the R plane holds 1.0 at its first
        // slot while G and B planes hold 0.0 there.
        let (raw, _) = tensor.into_raw_vec_and_offset();
        assert_eq!(raw[0], 1.0);
        assert_eq!(raw[4], 0.0);
        assert_eq!(raw[8], 0.0);
    }

    #[test]
    fn mean_std_fold_matches_reference_formula() {
        let mean = [0.485, 0.456, 0.406];
        let std = [0.229, 0.224, 0.225];
        let normalizer = NormalizeImage::new(1.0 / 255.0, mean, std).unwrap();
        let tensor = normalizer.normalize_to(&test_image()).unwrap();

        for c in 0..3 {
            let v = 51.0 * (c as f32 + 1.0); // pixel (1, 1) per channel
            let expected = (v / 255.0 - mean[c]) / std[c];
            let got = tensor[[0, c, 1, 1]];
            assert!(
                (got - expected).abs() < 1e-6,
                "channel {c}: got {got}, expected {expected}"
            );
        }
    }

    #[test]
    fn normalization_is_deterministic() {
        let normalizer =
            NormalizeImage::new(1.0 / 255.0, [0.485, 0.456, 0.406], [0.229, 0.224, 0.225])
                .unwrap();
        let img = test_image();
        let first = normalizer.normalize_to(&img).unwrap();
        let second = normalizer.normalize_to(&img).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_non_positive_std() {
        assert!(NormalizeImage::new(1.0 / 255.0, [0.0; 3], [0.2, 0.0, 0.2]).is_err());
        assert!(NormalizeImage::new(1.0 / 255.0, [0.0; 3], [0.2, -1.0, 0.2]).is_err());
    }

    #[test]
    fn rejects_non_positive_scale() {
        assert!(NormalizeImage::new(0.0, [0.0; 3], [1.0; 3]).is_err());
        assert!(NormalizeImage::new(f32::NAN, [0.0; 3], [1.0; 3]).is_err());
    }
}
