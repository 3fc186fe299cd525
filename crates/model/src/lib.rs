//! Math-performance classifier core.
//!
//! Holds everything the prediction server and the reporting job share:
//! the training-time feature schema, the fitted categorical encoders,
//! the decision-tree ensemble itself, artifact (de)serialization, and
//! the request-to-prediction inference pipeline.

pub mod artifacts;
pub mod encoders;
pub mod errors;
pub mod model;
pub mod pipeline;
pub mod schema;

pub use artifacts::Artifacts;
pub use encoders::{EncoderSet, LabelEncoder};
pub use errors::{ArtifactError, PredictError};
pub use model::{ClassifierModel, Node, Tree};
pub use pipeline::{PredictService, Prediction, PredictionRequest, StudentRecord};
