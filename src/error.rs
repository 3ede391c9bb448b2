use thiserror::Error;

/// Failures the scoring core is allowed to raise.
///
/// Data gaps (empty series, short history) are never errors; they are
/// absorbed by fallbacks. Only malformed configuration and boundary I/O end
/// up here.
#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Invalid weight for '{key}': {value} (weights must be finite and non-negative)")]
    InvalidWeight { key: String, value: f64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScoringError>;
