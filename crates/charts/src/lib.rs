//! Reporting job for the math-performance model.
//!
//! Loads (or synthesizes) the training dataset and a model, then renders
//! four fixed chart images into a static output directory. Entirely
//! offline; shares only the artifact formats with the running service.

pub mod cart;
pub mod dataset;
pub mod errors;
pub mod render;
pub mod synthetic;

pub use dataset::{StudentDataset, StudentRow};
pub use errors::ChartError;
