//! Per-image video prompt generation.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, warn};

use tourclip_genai::{GenAiError, GenAiResult, ImageDetail, ImageInput, StructuredRequest};
use tourclip_models::{ScenePrompt, SelectedImageSet};

use crate::metrics;
use crate::services::{ask, LanguageModel};

const SCHEMA_NAME: &str = "videoPrompt";

/// Directive used when the model gives no usable prompt.
pub const FALLBACK_VIDEO_PROMPT: &str = "A cinematic shot with gentle camera movement and warm lighting, transforming this image into a beautiful 5-second video with natural motion and atmospheric depth.";

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct PromptAnswer {
    video_prompt: String,
    scene_description: String,
}

/// Canned prompt for scene `sequence` (1-based).
pub fn fallback_prompt(sequence: u32, image_url: &str) -> ScenePrompt {
    ScenePrompt::new(
        sequence,
        image_url,
        FALLBACK_VIDEO_PROMPT,
        format!("Experience moment {}", sequence),
    )
    .into_fallback()
}

fn prompt_text(sequence: u32, total: usize, tour_name: &str) -> String {
    format!(
        "You direct shots for an image-to-video model.\n\n\
         This is image {sequence} of {total} for the experience \"{name}\". Write a prompt that \
         turns it into a cinematic five-second clip.\n\n\
         HARD RULES:\n\
         - Every person in the image stays completely still. No human motion at all.\n\
         - Keep the original colors and quality. No filters or style changes.\n\
         - Motion comes only from the camera.\n\n\
         Cover:\n\
         1. Camera movement: slow zoom in, gentle pan, orbit, dolly forward, or a static shot.\n\
         2. Visual style: lighting and color as they already appear.\n\
         3. Scene dynamics: ambient motion such as light shifts or moving water.\n\
         4. Mood and atmosphere.\n\
         5. Framing: wide, medium or close-up, and depth of field.\n\n\
         If people are present, keep the camera at a distance from them.\n\n\
         Return `videoPrompt` with the directive in natural language and `sceneDescription` \
         with one short sentence describing what is visible.\n",
        sequence = sequence,
        total = total,
        name = tour_name,
    )
}

/// Writes one video prompt per selected image.
pub struct PromptGenerator {
    model: Arc<dyn LanguageModel>,
}

impl PromptGenerator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Generate prompts in selection order, one request at a time.
    ///
    /// A failed image gets the fallback prompt; the remaining images are
    /// still processed.
    pub async fn generate(&self, images: &SelectedImageSet, tour_name: &str) -> Vec<ScenePrompt> {
        let total = images.len();
        let mut prompts = Vec::with_capacity(total);

        for (i, url) in images.iter().enumerate() {
            let sequence = i as u32 + 1;
            let prompt = match self.generate_one(url, sequence, total, tour_name).await {
                Ok(answer) => {
                    ScenePrompt::new(sequence, url, answer.video_prompt, answer.scene_description)
                }
                Err(e) => {
                    warn!("Prompt for image {}/{} failed, using fallback: {}", sequence, total, e);
                    metrics::record_fallback("prompt");
                    fallback_prompt(sequence, url)
                }
            };
            info!(sequence, image = %prompt.image_name, "Scene prompt ready");
            prompts.push(prompt);
        }

        prompts
    }

    /// Fallback prompts for every image, without calling the model.
    pub fn fallback_all(images: &SelectedImageSet) -> Vec<ScenePrompt> {
        images
            .iter()
            .enumerate()
            .map(|(i, url)| fallback_prompt(i as u32 + 1, url))
            .collect()
    }

    async fn generate_one(
        &self,
        url: &str,
        sequence: u32,
        total: usize,
        tour_name: &str,
    ) -> GenAiResult<PromptAnswer> {
        let request = StructuredRequest::new(prompt_text(sequence, total, tour_name), SCHEMA_NAME)
            .with_image(ImageInput::new(url, ImageDetail::Auto));

        let answer: PromptAnswer = ask(self.model.as_ref(), &request).await?;
        if answer.video_prompt.trim().is_empty() {
            return Err(GenAiError::parse("empty videoPrompt"));
        }
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{image_urls, FakeModel};

    fn selected(n: usize) -> SelectedImageSet {
        SelectedImageSet::new(image_urls(n), 10)
    }

    #[tokio::test]
    async fn test_one_prompt_per_image_in_order() {
        let model = Arc::new(FakeModel::default());
        let generator = PromptGenerator::new(model.clone());
        let images = selected(4);

        let prompts = generator.generate(&images, "Tour").await;
        assert_eq!(prompts.len(), 4);
        for (i, p) in prompts.iter().enumerate() {
            assert_eq!(p.sequence, i as u32 + 1);
            assert_eq!(&p.image_url, &images.as_slice()[i]);
            assert!(!p.is_fallback);
        }

        let requests = model.requests_for("videoPrompt");
        assert_eq!(requests.len(), 4);
        assert!(requests[2].prompt.contains("image 3 of 4"));
        assert_eq!(requests[2].images.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_isolated_to_one_scene() {
        let images = selected(5);
        let model = Arc::new(FakeModel {
            failing_images: vec![images.as_slice()[2].clone()],
            ..Default::default()
        });
        let generator = PromptGenerator::new(model.clone());

        let prompts = generator.generate(&images, "Tour").await;
        assert_eq!(prompts.len(), 5);

        assert!(prompts[2].is_fallback);
        assert_eq!(prompts[2].video_prompt, FALLBACK_VIDEO_PROMPT);
        assert_eq!(prompts[2].scene_description, "Experience moment 3");

        for i in [0, 1, 3, 4] {
            assert!(!prompts[i].is_fallback);
            assert!(prompts[i].video_prompt.contains(&images.as_slice()[i]));
        }
        assert_eq!(model.calls(), 5);
    }

    #[test]
    fn test_fallback_all() {
        let prompts = PromptGenerator::fallback_all(&selected(3));
        assert_eq!(prompts.len(), 3);
        assert!(prompts.iter().all(|p| p.is_fallback));
        assert_eq!(prompts[1].scene_description, "Experience moment 2");
        assert_eq!(prompts[1].image_name, "img_02.jpg");
    }
}
