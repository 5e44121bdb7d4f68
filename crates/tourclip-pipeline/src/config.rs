//! Pipeline configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::PipelineError;

/// Stages that can be bypassed for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipStages {
    /// Use the first images instead of asking the model to choose
    pub selection: bool,
    /// Use the fallback prompt for every scene
    pub prompts: bool,
    /// Produce no clip artifacts
    pub clips: bool,
}

impl SkipStages {
    pub fn is_empty(&self) -> bool {
        !(self.selection || self.prompts || self.clips)
    }
}

impl FromStr for SkipStages {
    type Err = PipelineError;

    /// Parse a comma-separated list such as `select,prompts,clips`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut skip = SkipStages::default();
        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token.to_ascii_lowercase().as_str() {
                "select" | "selection" => skip.selection = true,
                "prompts" | "prompt" => skip.prompts = true,
                "clips" | "video" => skip.clips = true,
                other => {
                    return Err(PipelineError::validation(format!(
                        "unknown stage to skip: '{}'",
                        other
                    )))
                }
            }
        }
        Ok(skip)
    }
}

/// What to do when some clips of a batch fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClipFailurePolicy {
    /// Any failure fails the stage and nothing is persisted
    #[default]
    Abort,
    /// Persist the successful clips and report the failed indices
    KeepSuccessful,
}

impl FromStr for ClipFailurePolicy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "keep_successful" => Ok(Self::KeepSuccessful),
            other => Err(PipelineError::config(format!(
                "unknown clip failure policy: '{}'",
                other
            ))),
        }
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root directory for run artifacts and checkpoints
    pub work_dir: PathBuf,
    /// Maximum number of images in the video
    pub max_images: usize,
    /// Stages bypassed unless a request says otherwise
    pub skip: SkipStages,
    /// Narration used instead of asking the model
    pub script_override: Option<String>,
    pub clip_failure_policy: ClipFailurePolicy,
    /// Per-clip time limit; `None` waits indefinitely
    pub clip_timeout: Option<Duration>,
    /// Run ffmpeg after the artifacts are written
    pub assemble: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("./output"),
            max_images: 10,
            skip: SkipStages::default(),
            script_override: None,
            clip_failure_policy: ClipFailurePolicy::Abort,
            clip_timeout: None,
            assemble: false,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, PipelineError> {
        let defaults = Self::default();

        let skip = match std::env::var("PIPELINE_SKIP_STAGES") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.skip,
        };
        let clip_failure_policy = match std::env::var("PIPELINE_CLIP_FAILURE_POLICY") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.clip_failure_policy,
        };

        Ok(Self {
            work_dir: std::env::var("PIPELINE_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            max_images: std::env::var("PIPELINE_MAX_IMAGES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_images),
            skip,
            script_override: std::env::var("PIPELINE_SCRIPT_OVERRIDE")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            clip_failure_policy,
            clip_timeout: std::env::var("PIPELINE_CLIP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs),
            assemble: std::env::var("PIPELINE_ASSEMBLE")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(defaults.assemble),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_stages_parse() {
        let skip: SkipStages = "select, prompts,clips".parse().unwrap();
        assert!(skip.selection && skip.prompts && skip.clips);

        let none: SkipStages = "".parse().unwrap();
        assert!(none.is_empty());

        assert!("select,render".parse::<SkipStages>().is_err());
    }

    #[test]
    fn test_clip_failure_policy_parse() {
        assert_eq!(
            "keep_successful".parse::<ClipFailurePolicy>().unwrap(),
            ClipFailurePolicy::KeepSuccessful
        );
        assert_eq!("ABORT".parse::<ClipFailurePolicy>().unwrap(), ClipFailurePolicy::Abort);
        assert!("retry".parse::<ClipFailurePolicy>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_images, 10);
        assert!(config.skip.is_empty());
        assert!(config.clip_timeout.is_none());
        assert!(!config.assemble);
    }
}
