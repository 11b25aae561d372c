//! Error types for the stress pipeline.

use thiserror::Error;

/// Errors surfaced by pipeline stages and their file collaborators.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Missing or malformed required input
    #[error("validation failed: {0}")]
    Validation(String),

    /// A center, or the whole input, has no records
    #[error("empty series: {0}")]
    EmptySeries(String),

    /// CSV encoding/decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
