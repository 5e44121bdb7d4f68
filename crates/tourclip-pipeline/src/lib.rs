//! Tour video pipeline.
//!
//! This crate provides:
//! - Service traits for the catalog, language model and synthesis backends
//! - Image selection, scene prompting and narration composition
//! - Concurrent clip generation and narration synthesis
//! - A checkpointed orchestrator driving one run from fetch to report

pub mod clips;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod narration;
pub mod orchestrator;
pub mod prompts;
pub mod selector;
pub mod services;
pub mod voice;

#[cfg(test)]
pub(crate) mod testing;

pub use clips::{ClipBatch, ClipGenerator};
pub use config::{ClipFailurePolicy, PipelineConfig, SkipStages};
pub use error::{PipelineError, PipelineResult};
pub use logging::RunLogger;
pub use narration::{NarrationComposer, FALLBACK_NARRATION};
pub use orchestrator::{Orchestrator, RunReport, RunRequest, Services};
pub use prompts::{fallback_prompt, PromptGenerator, FALLBACK_VIDEO_PROMPT};
pub use selector::{resolve_selection, ImageSelector, Resolution, ResolutionTier};
pub use services::{LanguageModel, SpeechSynthesizer, TourCatalog, VideoSynthesizer};
pub use voice::NarrationSynthesizer;
