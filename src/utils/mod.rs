//! Utility functions for images.

pub mod image;

pub use image::{load_image, rgb_from_raw};
