//! Video generation trigger.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use tourclip_models::{RunId, TourId};
use tourclip_pipeline::{RunRequest, SkipStages};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Query string of `GET /api/generate-video`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct GenerateVideoQuery {
    /// Tour group identifier
    pub tgid: Option<String>,
    /// Existing run to resume
    #[validate(length(min = 1, max = 128))]
    pub run_id: Option<String>,
    /// Comma-separated stages to skip (`select,prompts,clips`)
    #[validate(length(max = 64))]
    pub skip: Option<String>,
    /// Narration language code
    #[validate(length(min = 2, max = 8))]
    pub language: Option<String>,
}

impl GenerateVideoQuery {
    /// Turn the query into a pipeline request. Rejects a missing or blank tgid first.
    pub fn into_run_request(self) -> ApiResult<RunRequest> {
        let tour_id = TourId::parse(self.tgid.as_deref().unwrap_or_default())
            .map_err(|_| ApiError::validation("tgid is required"))?;

        self.validate()
            .map_err(|e| ApiError::validation(e.to_string()))?;

        let mut request = RunRequest::new(tour_id);
        if let Some(run_id) = self.run_id {
            request = request.with_run_id(RunId::from_string(run_id));
        }
        if let Some(skip) = self.skip.as_deref().filter(|s| !s.trim().is_empty()) {
            let skip = skip
                .parse::<SkipStages>()
                .map_err(|e| ApiError::bad_request(e.to_string()))?;
            request = request.with_skip(skip);
        }
        if let Some(language) = self.language {
            request = request.with_language(language);
        }
        Ok(request)
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateVideoResponse {
    pub result: &'static str,
    pub run_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_clip_indices: Vec<usize>,
}

/// Run the whole pipeline for one tour and wait for it to finish.
pub async fn generate_video(
    State(state): State<AppState>,
    Query(query): Query<GenerateVideoQuery>,
) -> ApiResult<Json<GenerateVideoResponse>> {
    let request = query.into_run_request()?;
    info!(tgid = %request.tour_id, "Video generation requested");

    let report = state.orchestrator.run(request).await?;

    Ok(Json(GenerateVideoResponse {
        result: "success",
        run_id: report.run_id.to_string(),
        failed_clip_indices: report.failed_clip_indices,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(tgid: Option<&str>) -> GenerateVideoQuery {
        GenerateVideoQuery {
            tgid: tgid.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_or_blank_tgid_is_rejected() {
        for tgid in [None, Some(""), Some("   ")] {
            let err = query(tgid).into_run_request().unwrap_err();
            assert_eq!(err.to_string(), "tgid is required");
        }
    }

    #[test]
    fn test_optional_fields_are_carried() {
        let request = GenerateVideoQuery {
            tgid: Some(" 4242 ".to_string()),
            run_id: Some("run-1".to_string()),
            skip: Some("select,clips".to_string()),
            language: Some("fr".to_string()),
        }
        .into_run_request()
        .unwrap();

        assert_eq!(request.tour_id.as_str(), "4242");
        assert_eq!(request.run_id.unwrap().as_str(), "run-1");
        let skip = request.skip.unwrap();
        assert!(skip.selection && skip.clips && !skip.prompts);
        assert_eq!(request.language.as_deref(), Some("fr"));
    }

    #[test]
    fn test_unknown_skip_stage_is_bad_request() {
        let err = GenerateVideoQuery {
            tgid: Some("4242".to_string()),
            skip: Some("narration".to_string()),
            ..Default::default()
        }
        .into_run_request()
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_overlong_language_is_rejected() {
        let err = GenerateVideoQuery {
            tgid: Some("4242".to_string()),
            language: Some("not-a-language-code".to_string()),
            ..Default::default()
        }
        .into_run_request()
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
