//! Error types for the classifier core.
//!
//! `PredictError` display strings are user-visible wire text and must stay
//! byte-compatible with the deployed service.

use thiserror::Error;

/// Errors raised by the inference pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    /// A required categorical field was absent from the request.
    #[error("Field {0} wajib diisi")]
    MissingField(&'static str),

    /// A categorical value was not in the encoder's fitted vocabulary.
    #[error("Nilai '{value}' tidak dikenal untuk field {field}")]
    UnknownCategory { field: String, value: String },

    /// Model or encoders are not loaded.
    #[error("Model belum dimuat. Silakan coba lagi dalam beberapa saat.")]
    ModelUnavailable,

    /// Any other processing failure.
    #[error("Terjadi kesalahan: {0}")]
    Unexpected(String),
}

/// Errors raised while loading or validating persisted artifacts.
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// Artifact file does not exist.
    #[error("artifact file not found: {0}")]
    NotFound(String),

    /// Model failed structural validation.
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// Encoder set failed validation against the schema.
    #[error("invalid encoders: {0}")]
    InvalidEncoders(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
