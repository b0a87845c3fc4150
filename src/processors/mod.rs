//! Image processing components shared by the two models.
//!
//! Each model composes its own instances of these transforms; the two
//! normalization schemes (plain scaling for detection, mean/std for
//! classification) stay in two separately constructed values.

pub mod argmax;
pub mod normalization;
pub mod resize;

pub use argmax::argmax;
pub use normalization::NormalizeImage;
pub use resize::StretchResize;
