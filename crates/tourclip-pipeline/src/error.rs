//! Pipeline error types.

use thiserror::Error;

use tourclip_catalog::CatalogError;
use tourclip_genai::GenAiError;
use tourclip_media::MediaError;
use tourclip_models::{RunId, RunStage, TourId};
use tourclip_storage::StorageError;
use tourclip_synth::SynthError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Model error: {0}")]
    Model(#[from] GenAiError),

    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthError),

    #[error("Clip {index} timed out after {secs}s")]
    ClipTimeout { index: usize, secs: u64 },

    #[error("{failed} of {total} clips failed (indices {indices:?})")]
    ClipBatch {
        failed: usize,
        total: usize,
        indices: Vec<usize>,
    },

    #[error("Tour {0} has no images to animate")]
    NoImages(TourId),

    #[error("Run {0} is already in progress")]
    RunInProgress(RunId),

    #[error("Missing output of stage {0}")]
    MissingOutput(RunStage),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Stage {stage} failed: {source}")]
    StageFailed {
        stage: RunStage,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn stage_failed(stage: RunStage, source: PipelineError) -> Self {
        Self::StageFailed {
            stage,
            source: Box::new(source),
        }
    }

    /// Stage that was being attempted, when known.
    pub fn stage(&self) -> Option<RunStage> {
        match self {
            PipelineError::StageFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Whether the request was rejected before any stage ran.
    ///
    /// Failures inside a stage are never the caller's fault, whatever their cause.
    pub fn is_validation(&self) -> bool {
        matches!(self, PipelineError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_failed_keeps_stage_and_source() {
        let err = PipelineError::stage_failed(
            RunStage::MetadataFetched,
            CatalogError::from_http_status(404, "no tour").into(),
        );
        assert_eq!(err.stage(), Some(RunStage::MetadataFetched));
        assert!(!err.is_validation());
        assert!(err.to_string().contains("metadata_fetched"));
    }

    #[test]
    fn test_stage_failure_is_never_validation() {
        let err = PipelineError::stage_failed(
            RunStage::AudioGenerated,
            PipelineError::validation("narration script is empty"),
        );
        assert!(!err.is_validation());
        assert!(PipelineError::validation("bad run id").is_validation());
    }
}
