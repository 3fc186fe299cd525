//! Error types for the reporting job.

use mathperf_model::ArtifactError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    /// Dataset file is malformed.
    #[error("invalid dataset: {0}")]
    Dataset(String),

    /// Chart rendering failed.
    #[error("failed to render chart: {0}")]
    Render(String),

    /// Model or encoder artifact problem.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// CSV parse error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
