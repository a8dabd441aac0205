//! Error types for darklimit

use thiserror::Error;

/// darklimit error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration or input data. Fatal for the affected detector.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Numerical failure (no bracket, no convergence). Recoverable per mass point.
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
