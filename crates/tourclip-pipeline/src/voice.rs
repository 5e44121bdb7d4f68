//! Narration voice-over synthesis.

use std::sync::Arc;

use tracing::info;

use tourclip_models::{GeneratedAudio, NarrationScript};

use crate::error::{PipelineError, PipelineResult};
use crate::services::SpeechSynthesizer;

/// Turns the narration script into audio.
pub struct NarrationSynthesizer {
    speech: Arc<dyn SpeechSynthesizer>,
}

impl NarrationSynthesizer {
    pub fn new(speech: Arc<dyn SpeechSynthesizer>) -> Self {
        Self { speech }
    }

    /// Synthesize `script`, in `language` when given. Failures are returned.
    pub async fn synthesize(
        &self,
        script: &NarrationScript,
        language: Option<&str>,
    ) -> PipelineResult<GeneratedAudio> {
        if script.as_str().trim().is_empty() {
            return Err(PipelineError::validation("narration script is empty"));
        }

        let data = self.speech.synthesize(script.as_str(), language).await?;
        info!(
            bytes = data.len(),
            language = language.unwrap_or("default"),
            "Narration audio ready"
        );
        Ok(GeneratedAudio::new(data))
    }
}
