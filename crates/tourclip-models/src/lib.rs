//! Shared data models for the TourClip pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Tour metadata fetched from the catalog
//! - Image selection, scene prompts and the video plan
//! - Narration scripts and generated media payloads
//! - Run identifiers, stages and checkpoint records

pub mod media;
pub mod run;
pub mod scene;
pub mod tour;
pub mod utils;

// Re-export common types
pub use media::{clip_file_name, GeneratedAudio, GeneratedClip, AUDIO_FILE_NAME, PLAN_FILE_NAME};
pub use run::{ClipArtifact, RunId, RunRecord, RunStage, StageOutputs};
pub use scene::{
    split_last_sentence, NarrationScript, ScenePrompt, SelectedImageSet, VideoPlan,
    VideoPlanMetadata, VideoSegment, CALL_TO_ACTION, SCENE_SECONDS,
};
pub use tour::{ReviewImage, TourContext, TourId, TourIdError};
pub use utils::file_name_from_url;
