//! Generative model client error types.

use thiserror::Error;

pub type GenAiResult<T> = Result<T, GenAiError>;

#[derive(Debug, Error)]
pub enum GenAiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Model refused the request: {0}")]
    Refusal(String),

    #[error("No content in model response")]
    EmptyResponse,

    #[error("Failed to parse structured output: {0}")]
    Parse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenAiError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GenAiError::Api { status: 429, .. })
    }
}
