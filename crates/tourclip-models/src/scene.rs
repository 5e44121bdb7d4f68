//! Scene, narration and video plan models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::file_name_from_url;

/// Nominal length of one scene in seconds.
pub const SCENE_SECONDS: u32 = 5;

/// Closing sentence every generated narration ends with.
pub const CALL_TO_ACTION: &str = "Book on Headout seamlessly now.";

/// Ordered, duplicate-free set of images chosen for the video.
///
/// Order encodes the position of each image in the final sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SelectedImageSet(Vec<String>);

impl SelectedImageSet {
    /// Build a set from URLs, dropping duplicates and keeping at most `max` entries.
    pub fn new(urls: impl IntoIterator<Item = String>, max: usize) -> Self {
        let mut selected: Vec<String> = Vec::with_capacity(max);
        for url in urls {
            if selected.len() >= max {
                break;
            }
            if !selected.contains(&url) {
                selected.push(url);
            }
        }
        Self(selected)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

/// Video-model directive and description for one selected image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScenePrompt {
    /// 1-based position in the video
    pub sequence: u32,
    pub image_url: String,
    /// File name derived from the image URL
    pub image_name: String,
    /// Camera/style/mood directive for the video model
    pub video_prompt: String,
    /// Short human-readable description used for narration
    pub scene_description: String,
    /// True when the canned fallback was substituted
    #[serde(default)]
    pub is_fallback: bool,
}

impl ScenePrompt {
    pub fn new(
        sequence: u32,
        image_url: impl Into<String>,
        video_prompt: impl Into<String>,
        scene_description: impl Into<String>,
    ) -> Self {
        let image_url = image_url.into();
        Self {
            sequence,
            image_name: file_name_from_url(&image_url),
            image_url,
            video_prompt: video_prompt.into(),
            scene_description: scene_description.into(),
            is_fallback: false,
        }
    }

    /// Mark this prompt as a fallback substitution.
    pub fn into_fallback(mut self) -> Self {
        self.is_fallback = true;
        self
    }

    /// Start of this scene's time window in seconds.
    pub fn start_seconds(&self) -> u32 {
        self.sequence.saturating_sub(1) * SCENE_SECONDS
    }

    /// End of this scene's time window in seconds.
    pub fn end_seconds(&self) -> u32 {
        self.sequence * SCENE_SECONDS
    }
}

/// Voice-over text covering all scenes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct NarrationScript(String);

impl NarrationScript {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn word_count(&self) -> usize {
        self.0.split_whitespace().count()
    }

    /// Whether the last sentence is exactly the booking call-to-action.
    pub fn ends_with_call_to_action(&self) -> bool {
        split_last_sentence(&self.0).1 == CALL_TO_ACTION
    }
}

/// Split `text` into the part before its last sentence and the last sentence.
///
/// Sentences end at `.`, `!` or `?`. The first part keeps its terminator.
pub fn split_last_sentence(text: &str) -> (&str, &str) {
    let trimmed = text.trim_end();
    let body = trimmed.trim_end_matches(['.', '!', '?']);
    match body.rfind(['.', '!', '?']) {
        Some(i) => (trimmed[..=i].trim_end(), trimmed[i + 1..].trim()),
        None => ("", trimmed.trim()),
    }
}

impl fmt::Display for NarrationScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of the exported video plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoSegment {
    pub sequence: u32,
    pub start_time: u32,
    pub end_time: u32,
    pub input_image: String,
    pub image_name: String,
    pub video_prompt: String,
    pub scene_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoPlanMetadata {
    pub total_segments: usize,
    pub segment_duration: u32,
    pub generated_at: DateTime<Utc>,
    pub video_model: String,
}

/// Manifest describing the planned video, persisted next to the clips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoPlan {
    pub project: String,
    pub total_duration: u32,
    pub video_segments: Vec<VideoSegment>,
    pub narration_script: NarrationScript,
    pub metadata: VideoPlanMetadata,
}

impl VideoPlan {
    pub fn build(
        project: impl Into<String>,
        prompts: &[ScenePrompt],
        script: &NarrationScript,
        video_model: impl Into<String>,
    ) -> Self {
        let video_segments = prompts
            .iter()
            .map(|p| VideoSegment {
                sequence: p.sequence,
                start_time: p.start_seconds(),
                end_time: p.end_seconds(),
                input_image: p.image_url.clone(),
                image_name: p.image_name.clone(),
                video_prompt: p.video_prompt.clone(),
                scene_description: p.scene_description.clone(),
            })
            .collect::<Vec<_>>();

        Self {
            project: project.into(),
            total_duration: prompts.len() as u32 * SCENE_SECONDS,
            metadata: VideoPlanMetadata {
                total_segments: video_segments.len(),
                segment_duration: SCENE_SECONDS,
                generated_at: Utc::now(),
                video_model: video_model.into(),
            },
            video_segments,
            narration_script: script.clone(),
        }
    }
}
