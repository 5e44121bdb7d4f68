//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use tourclip_pipeline::PipelineError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Body returned for every failed run; upstream details stay in the logs.
pub const GENERIC_FAILURE_DETAIL: &str = "Video generation failed";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Pipeline error: {0}")]
    Pipeline(PipelineError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Pipeline(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Only rejections of the request itself reach the caller; every stage
/// failure becomes the generic body.
impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(msg) => ApiError::Validation(msg),
            e @ PipelineError::RunInProgress(_) => ApiError::Conflict(e.to_string()),
            other => ApiError::Pipeline(other),
        }
    }
}

#[derive(Serialize)]
struct DetailResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'static str>,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            ApiError::Validation(msg) | ApiError::BadRequest(msg) | ApiError::Conflict(msg) => {
                DetailResponse {
                    result: None,
                    detail: msg.clone(),
                }
            }
            ApiError::Pipeline(_) | ApiError::Internal(_) => {
                error!(error = %self, "Request failed");
                DetailResponse {
                    result: Some("failure"),
                    detail: GENERIC_FAILURE_DETAIL.to_string(),
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourclip_models::{RunId, RunStage, TourId};

    #[test]
    fn test_request_rejection_maps_to_bad_request() {
        let err: ApiError = PipelineError::validation("run id is not path-safe").into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "run id is not path-safe");
    }

    #[test]
    fn test_stage_failure_maps_to_internal() {
        let err: ApiError = PipelineError::stage_failed(
            RunStage::ImagesSelected,
            PipelineError::NoImages(TourId::parse("4242").unwrap()),
        )
        .into();
        assert!(matches!(err, ApiError::Pipeline(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err: ApiError = PipelineError::stage_failed(
            RunStage::AudioGenerated,
            PipelineError::validation("narration script is empty"),
        )
        .into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_run_in_progress_maps_to_conflict() {
        let err: ApiError = PipelineError::RunInProgress(RunId::from_string("run-1")).into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
