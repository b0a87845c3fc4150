//! Domain types for the food recognition pipeline.

pub mod labels;

pub use labels::LabelTable;
