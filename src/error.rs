//! Error types for Barakah Score

use thiserror::Error;

/// Errors that can occur at the parsing, storage and modeling boundaries.
///
/// The scoring core itself never returns these; malformed values are recovered
/// into defaults before they reach a scorer.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse log payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Model fitting failed: {0}")]
    ModelError(String),
}
