//! Catalog client error types.

use thiserror::Error;

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Tour not found: {0}")]
    NotFound(String),

    #[error("Rate limited by catalog")]
    RateLimited,

    #[error("Catalog server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Map a non-success HTTP status to an error.
    pub fn from_http_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            404 => Self::NotFound(body),
            429 => Self::RateLimited,
            500..=599 => Self::ServerError(status, body),
            _ => Self::RequestFailed(format!("HTTP {}: {}", status, body)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_status() {
        assert!(matches!(CatalogError::from_http_status(404, "x"), CatalogError::NotFound(_)));
        assert!(matches!(CatalogError::from_http_status(429, ""), CatalogError::RateLimited));
        assert!(matches!(
            CatalogError::from_http_status(503, "down"),
            CatalogError::ServerError(503, _)
        ));
        assert!(matches!(
            CatalogError::from_http_status(400, "bad"),
            CatalogError::RequestFailed(_)
        ));
    }
}
