//! Synthesis client error types.

use thiserror::Error;

pub type SynthResult<T> = Result<T, SynthError>;

#[derive(Debug, Error)]
pub enum SynthError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Synthesis API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Prediction {id} ended with status '{status}': {message}")]
    PredictionFailed {
        id: String,
        status: String,
        message: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Empty payload returned from {0}")]
    EmptyPayload(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SynthError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Check if error is transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            SynthError::Network(_) => true,
            SynthError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
