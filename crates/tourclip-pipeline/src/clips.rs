//! Concurrent video clip generation.
//!
//! Every scene is submitted at once and every task is awaited. Each task
//! yields its own result so the caller decides what a partial batch means.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{info, warn};

use tourclip_models::{GeneratedClip, ScenePrompt};
use tourclip_synth::VideoRequest;

use crate::config::ClipFailurePolicy;
use crate::error::{PipelineError, PipelineResult};
use crate::metrics;
use crate::services::VideoSynthesizer;

/// Outcome of a clip batch after the failure policy was applied.
#[derive(Debug, Default)]
pub struct ClipBatch {
    /// Successful clips, ordered by index
    pub clips: Vec<GeneratedClip>,
    /// Indices whose synthesis failed
    pub failed: Vec<usize>,
}

/// Generates one clip per scene prompt.
pub struct ClipGenerator {
    synth: Arc<dyn VideoSynthesizer>,
    timeout: Option<Duration>,
}

impl ClipGenerator {
    pub fn new(synth: Arc<dyn VideoSynthesizer>, timeout: Option<Duration>) -> Self {
        Self { synth, timeout }
    }

    /// Run every scene concurrently and return the per-index results.
    pub async fn generate_all(
        &self,
        prompts: &[ScenePrompt],
    ) -> Vec<PipelineResult<GeneratedClip>> {
        info!("Submitting {} clips for synthesis", prompts.len());

        let futures = prompts.iter().enumerate().map(|(index, prompt)| {
            let request = VideoRequest {
                prompt: prompt.video_prompt.clone(),
                start_image_url: prompt.image_url.clone(),
            };
            async move {
                let result = self.generate_one(index, &request).await;
                metrics::record_clip(result.is_ok());
                result
            }
        });

        join_all(futures).await
    }

    async fn generate_one(
        &self,
        index: usize,
        request: &VideoRequest,
    ) -> PipelineResult<GeneratedClip> {
        let data = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.synth.generate(request))
                .await
                .map_err(|_| PipelineError::ClipTimeout {
                    index,
                    secs: limit.as_secs(),
                })??,
            None => self.synth.generate(request).await?,
        };
        Ok(GeneratedClip::new(index, data))
    }

    /// Generate all clips and apply `policy` to the results.
    pub async fn generate(
        &self,
        prompts: &[ScenePrompt],
        policy: ClipFailurePolicy,
    ) -> PipelineResult<ClipBatch> {
        let results = self.generate_all(prompts).await;
        apply_policy(results, policy)
    }
}

/// Split per-index results according to `policy`.
///
/// `Abort` fails on any error. `KeepSuccessful` fails only when nothing
/// succeeded.
pub fn apply_policy(
    results: Vec<PipelineResult<GeneratedClip>>,
    policy: ClipFailurePolicy,
) -> PipelineResult<ClipBatch> {
    let total = results.len();
    let mut batch = ClipBatch::default();

    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(clip) => batch.clips.push(clip),
            Err(e) => {
                warn!("Clip {} failed: {}", index, e);
                batch.failed.push(index);
            }
        }
    }

    if batch.failed.is_empty() {
        return Ok(batch);
    }

    let all_failed = batch.clips.is_empty();
    if policy == ClipFailurePolicy::Abort || all_failed {
        return Err(PipelineError::ClipBatch {
            failed: batch.failed.len(),
            total,
            indices: batch.failed,
        });
    }

    warn!(
        "Keeping {} of {} clips, failed indices {:?}",
        batch.clips.len(),
        total,
        batch.failed
    );
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{image_urls, FakeVideo};
    use async_trait::async_trait;
    use tourclip_synth::SynthResult;

    fn prompts(n: usize) -> Vec<ScenePrompt> {
        image_urls(n)
            .into_iter()
            .enumerate()
            .map(|(i, url)| ScenePrompt::new(i as u32 + 1, url, "Orbit slowly", "Dome"))
            .collect()
    }

    #[tokio::test]
    async fn test_all_clips_indexed_in_order() {
        let video = Arc::new(FakeVideo::default());
        let generator = ClipGenerator::new(video.clone(), None);
        let prompts = prompts(10);

        let batch = generator
            .generate(&prompts, ClipFailurePolicy::Abort)
            .await
            .unwrap();

        assert_eq!(batch.clips.len(), 10);
        assert!(batch.failed.is_empty());
        for (i, clip) in batch.clips.iter().enumerate() {
            assert_eq!(clip.index, i);
            assert_eq!(clip.data, prompts[i].image_url.as_bytes());
        }
        assert_eq!(video.calls(), 10);
    }

    #[tokio::test]
    async fn test_abort_policy_fails_whole_batch() {
        let prompts = prompts(6);
        let video = Arc::new(FakeVideo {
            failing_images: vec![prompts[4].image_url.clone()],
            ..Default::default()
        });
        let generator = ClipGenerator::new(video.clone(), None);

        let err = generator
            .generate(&prompts, ClipFailurePolicy::Abort)
            .await
            .unwrap_err();

        match err {
            PipelineError::ClipBatch { failed, total, indices } => {
                assert_eq!((failed, total), (1, 6));
                assert_eq!(indices, vec![4]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Siblings still ran to completion.
        assert_eq!(video.calls(), 6);
    }

    #[tokio::test]
    async fn test_keep_successful_reports_failed_indices() {
        let prompts = prompts(5);
        let video = Arc::new(FakeVideo {
            failing_images: vec![prompts[1].image_url.clone(), prompts[3].image_url.clone()],
            ..Default::default()
        });
        let generator = ClipGenerator::new(video, None);

        let batch = generator
            .generate(&prompts, ClipFailurePolicy::KeepSuccessful)
            .await
            .unwrap();

        let indices: Vec<_> = batch.clips.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 2, 4]);
        assert_eq!(batch.failed, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_keep_successful_with_no_success_is_error() {
        let prompts = prompts(2);
        let video = Arc::new(FakeVideo {
            failing_images: prompts.iter().map(|p| p.image_url.clone()).collect(),
            ..Default::default()
        });
        let generator = ClipGenerator::new(video, None);

        assert!(generator
            .generate(&prompts, ClipFailurePolicy::KeepSuccessful)
            .await
            .is_err());
    }

    struct SlowVideo;

    #[async_trait]
    impl VideoSynthesizer for SlowVideo {
        async fn generate(&self, request: &VideoRequest) -> SynthResult<Vec<u8>> {
            if request.start_image_url.ends_with("img_02.jpg") {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            Ok(vec![1])
        }

        fn model(&self) -> &str {
            "slow/model"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_marks_single_clip_failed() {
        let generator = ClipGenerator::new(Arc::new(SlowVideo), Some(Duration::from_secs(5)));
        let results = generator.generate_all(&prompts(3)).await;

        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(PipelineError::ClipTimeout { index: 1, secs: 5 })
        ));
        assert!(results[2].is_ok());
    }
}
