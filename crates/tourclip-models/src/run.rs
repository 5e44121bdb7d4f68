//! Pipeline run identifiers, stages and checkpoint records.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{NarrationScript, ScenePrompt, SelectedImageSet, TourContext, TourId};

/// Unique identifier for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the ID is safe to use as a single path component.
    pub fn is_path_safe(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Linear pipeline states. Each transition is exactly one component call.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Validated,
    MetadataFetched,
    ImagesSelected,
    PromptsGenerated,
    ScriptGenerated,
    ClipsGenerated,
    AudioGenerated,
    Reported,
}

impl RunStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStage::Validated => "validated",
            RunStage::MetadataFetched => "metadata_fetched",
            RunStage::ImagesSelected => "images_selected",
            RunStage::PromptsGenerated => "prompts_generated",
            RunStage::ScriptGenerated => "script_generated",
            RunStage::ClipsGenerated => "clips_generated",
            RunStage::AudioGenerated => "audio_generated",
            RunStage::Reported => "reported",
        }
    }

    /// The state reached after this one, or `None` at the terminal state.
    pub fn next(&self) -> Option<RunStage> {
        match self {
            RunStage::Validated => Some(RunStage::MetadataFetched),
            RunStage::MetadataFetched => Some(RunStage::ImagesSelected),
            RunStage::ImagesSelected => Some(RunStage::PromptsGenerated),
            RunStage::PromptsGenerated => Some(RunStage::ScriptGenerated),
            RunStage::ScriptGenerated => Some(RunStage::ClipsGenerated),
            RunStage::ClipsGenerated => Some(RunStage::AudioGenerated),
            RunStage::AudioGenerated => Some(RunStage::Reported),
            RunStage::Reported => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStage::Reported)
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted clip, keyed by its sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClipArtifact {
    pub index: usize,
    pub path: String,
}

/// Outputs of every stage completed so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StageOutputs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tour: Option<TourContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<SelectedImageSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<Vec<ScenePrompt>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<NarrationScript>,
    #[serde(default)]
    pub clips: Vec<ClipArtifact>,
    /// Indices whose synthesis failed under a keep-successful policy
    #[serde(default)]
    pub failed_clip_indices: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_path: Option<String>,
    /// Assembled video, set only when assembly ran and succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_video: Option<String>,
}

/// Durable record of a run, rewritten after every stage transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RunRecord {
    pub run_id: RunId,
    pub tour_id: TourId,
    /// Last stage that completed
    pub stage: RunStage,
    #[serde(default)]
    pub outputs: StageOutputs,
    /// Stage that was being attempted when the run failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<RunStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RunRecord {
    pub fn new(run_id: RunId, tour_id: TourId) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            tour_id,
            stage: RunStage::Validated,
            outputs: StageOutputs::default(),
            failed_stage: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record that `stage` completed. Clears any earlier failure.
    pub fn advance(&mut self, stage: RunStage) {
        self.stage = stage;
        self.failed_stage = None;
        self.error = None;
        self.updated_at = Utc::now();
    }

    /// Record a failure while attempting `stage`.
    pub fn fail(&mut self, stage: RunStage, error: impl Into<String>) {
        self.failed_stage = Some(stage);
        self.error = Some(error.into());
        self.updated_at = Utc::now();
    }

    /// Whether `stage` has already completed in this run.
    pub fn has_completed(&self, stage: RunStage) -> bool {
        self.stage >= stage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_chain_is_linear() {
        let mut stage = RunStage::Validated;
        let mut visited = vec![stage];
        while let Some(next) = stage.next() {
            assert!(next > stage);
            stage = next;
            visited.push(stage);
        }
        assert_eq!(visited.len(), 8);
        assert!(stage.is_terminal());
    }

    #[test]
    fn test_record_advance_and_fail() {
        let mut record = RunRecord::new(RunId::new(), TourId::parse("7").unwrap());
        record.advance(RunStage::MetadataFetched);
        record.fail(RunStage::ImagesSelected, "boom");
        assert!(record.has_completed(RunStage::MetadataFetched));
        assert!(!record.has_completed(RunStage::ImagesSelected));
        assert_eq!(record.failed_stage, Some(RunStage::ImagesSelected));

        record.advance(RunStage::ImagesSelected);
        assert!(record.error.is_none());
    }

    #[test]
    fn test_run_id_path_safety() {
        assert!(RunId::new().is_path_safe());
        assert!(!RunId::from_string("../etc").is_path_safe());
        assert!(!RunId::from_string("").is_path_safe());
    }
}
