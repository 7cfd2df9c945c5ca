//! Error types for Airtime

use thiserror::Error;

/// Errors raised outside the classifier itself.
///
/// The classifier is total over its inputs; these cover parsing recorded
/// samples, loading configuration and encoding reports.
#[derive(Debug, Error)]
pub enum AirtimeError {
    #[error("Failed to parse sample stream: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid sample: {0}")]
    InvalidSample(String),

    #[error("Invalid classifier config: {0}")]
    InvalidConfig(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
