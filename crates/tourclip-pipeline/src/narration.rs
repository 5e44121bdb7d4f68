//! Narration script composition.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, warn};

use tourclip_genai::{GenAiError, GenAiResult, Role, StructuredRequest};
use tourclip_models::{split_last_sentence, NarrationScript, ScenePrompt, CALL_TO_ACTION};

use crate::metrics;
use crate::services::{ask, LanguageModel};

const SCHEMA_NAME: &str = "script";

/// Narration used when the model gives no usable script.
pub const FALLBACK_NARRATION: &str =
    "A beautiful journey of experiences, captured in moments that tell your unique story.";

#[derive(Debug, Deserialize, JsonSchema)]
struct NarrationAnswer {
    script: String,
}

fn timestamp(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// One line per scene: `Scene k (m:ss-m:ss): description`.
pub fn scene_lines(prompts: &[ScenePrompt]) -> String {
    prompts
        .iter()
        .map(|p| {
            format!(
                "Scene {} ({}-{}): {}",
                p.sequence,
                timestamp(p.start_seconds()),
                timestamp(p.end_seconds()),
                p.scene_description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn narration_prompt(prompts: &[ScenePrompt]) -> String {
    let total = prompts.last().map(|p| p.end_seconds()).unwrap_or(0);
    format!(
        "Write a {total}-second voice-over for a video of {count} five-second scenes:\n\
         {scenes}\n\n\
         Requirements:\n\
         1. Describe only what the scene descriptions say is visible.\n\
         2. Add no facts, trivia or information beyond the descriptions.\n\
         3. Give each scene about five seconds of speech, 8 to 10 words.\n\
         4. Use simple, clear, conversational language with natural pauses.\n\
         5. Do not use personal pronouns such as I, me or my.\n\
         6. Do not include scene labels like [Scene 1] or any special characters.\n\
         7. Keep the whole script between 100 and 120 words.\n\
         8. Do not mention images or photos.\n\
         9. End with exactly: \"{cta}\"\n\n\
         Return the text in `script`.\n",
        total = total,
        count = prompts.len(),
        scenes = scene_lines(prompts),
        cta = CALL_TO_ACTION,
    )
}

/// Remove bracketed labels and collapse whitespace.
pub fn sanitize_script(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '[' => depth += 1,
            ']' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Sanitize `text` and make its final sentence exactly the call-to-action.
///
/// A last sentence that already ends with the call-to-action wording, in any
/// case or punctuation, is replaced; otherwise the call-to-action is appended.
pub fn finalize_script(text: &str) -> NarrationScript {
    let cleaned = sanitize_script(text);
    let (body, last) = split_last_sentence(&cleaned);

    let wording = CALL_TO_ACTION.trim_end_matches('.').to_lowercase();
    let last_wording = last.trim_end_matches(['.', '!', '?']).to_lowercase();
    let mut text = if last_wording.ends_with(&wording) {
        body.to_string()
    } else {
        cleaned.clone()
    };

    if !text.is_empty() && !text.ends_with(['.', '!', '?']) {
        text.push('.');
    }
    if !text.is_empty() {
        text.push(' ');
    }
    text.push_str(CALL_TO_ACTION);
    NarrationScript::new(text)
}

/// Writes the voice-over covering all scenes.
pub struct NarrationComposer {
    model: Arc<dyn LanguageModel>,
}

impl NarrationComposer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Compose the narration. Never fails; falls back to a fixed sentence.
    pub async fn compose(&self, prompts: &[ScenePrompt]) -> NarrationScript {
        match self.request_script(prompts).await {
            Ok(script) => {
                info!(words = script.word_count(), "Narration script ready");
                script
            }
            Err(e) => {
                warn!("Narration failed, using fallback: {}", e);
                metrics::record_fallback("narration");
                NarrationScript::new(FALLBACK_NARRATION)
            }
        }
    }

    async fn request_script(&self, prompts: &[ScenePrompt]) -> GenAiResult<NarrationScript> {
        let request =
            StructuredRequest::new(narration_prompt(prompts), SCHEMA_NAME).with_role(Role::System);

        let answer: NarrationAnswer = ask(self.model.as_ref(), &request).await?;
        if sanitize_script(&answer.script).is_empty() {
            return Err(GenAiError::EmptyResponse);
        }
        Ok(finalize_script(&answer.script))
    }
}
