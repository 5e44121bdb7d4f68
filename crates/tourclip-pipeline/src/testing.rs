//! In-memory service fakes shared by the pipeline tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use tourclip_catalog::{CatalogError, CatalogResult};
use tourclip_genai::{GenAiError, GenAiResult, StructuredRequest};
use tourclip_models::{TourContext, TourId};
use tourclip_synth::{SynthError, SynthResult, VideoRequest};

use crate::services::{LanguageModel, SpeechSynthesizer, TourCatalog, VideoSynthesizer};

pub fn image_urls(n: usize) -> Vec<String> {
    (1..=n)
        .map(|i| format!("https://cdn.test/tours/img_{:02}.jpg", i))
        .collect()
}

pub fn tour(n: usize) -> TourContext {
    TourContext {
        id: TourId::parse("4242").unwrap(),
        name: "Colosseum Underground".to_string(),
        images: image_urls(n),
        review_images: vec![],
    }
}

pub struct FakeCatalog {
    pub tour: Option<TourContext>,
    pub calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn with_images(n: usize) -> Self {
        Self {
            tour: Some(tour(n)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            tour: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TourCatalog for FakeCatalog {
    async fn fetch_tour(&self, _tour_id: &TourId) -> CatalogResult<TourContext> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tour
            .clone()
            .ok_or_else(|| CatalogError::from_http_status(503, "catalog down"))
    }
}

/// Answers by schema name: `selectedImages`, `videoPrompt` and `script`.
pub struct FakeModel {
    /// Raw selection answer; `None` fails the call
    pub selection: Option<String>,
    /// Prompt requests for these image URLs fail
    pub failing_images: Vec<String>,
    /// Narration answer; `None` fails the call
    pub script: Option<String>,
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<StructuredRequest>>,
}

impl Default for FakeModel {
    fn default() -> Self {
        Self {
            selection: None,
            failing_images: Vec::new(),
            script: Some("Ancient arches glow at dusk. Book on Headout seamlessly now.".to_string()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl FakeModel {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests_for(&self, schema_name: &str) -> Vec<StructuredRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.schema_name == schema_name)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LanguageModel for FakeModel {
    async fn complete(
        &self,
        request: &StructuredRequest,
        _schema: serde_json::Value,
    ) -> GenAiResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        match request.schema_name.as_str() {
            "selectedImages" => self.selection.clone().ok_or(GenAiError::EmptyResponse),
            "videoPrompt" => {
                let url = request.images.first().map(|i| i.url.clone()).unwrap_or_default();
                if self.failing_images.contains(&url) {
                    return Err(GenAiError::Api {
                        status: 500,
                        body: "overloaded".to_string(),
                    });
                }
                Ok(json!({
                    "videoPrompt": format!("Slow dolly forward over {}", url),
                    "sceneDescription": format!("View of {}", url)
                })
                .to_string())
            }
            "script" => self
                .script
                .as_ref()
                .map(|s| json!({ "script": s }).to_string())
                .ok_or_else(|| GenAiError::parse("truncated output")),
            other => Err(GenAiError::parse(format!("unexpected schema {}", other))),
        }
    }
}

#[derive(Default)]
pub struct FakeVideo {
    /// Start images whose synthesis fails
    pub failing_images: Vec<String>,
    pub calls: AtomicUsize,
}

impl FakeVideo {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoSynthesizer for FakeVideo {
    async fn generate(&self, request: &VideoRequest) -> SynthResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_images.contains(&request.start_image_url) {
            return Err(SynthError::PredictionFailed {
                id: "p-fail".to_string(),
                status: "failed".to_string(),
                message: "content rejected".to_string(),
            });
        }
        Ok(request.start_image_url.as_bytes().to_vec())
    }

    fn model(&self) -> &str {
        "luma/ray"
    }
}

#[derive(Default)]
pub struct FakeSpeech {
    pub fail: bool,
    pub calls: AtomicUsize,
    pub languages: Mutex<Vec<Option<String>>>,
}

impl FakeSpeech {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, text: &str, language: Option<&str>) -> SynthResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.languages
            .lock()
            .unwrap()
            .push(language.map(str::to_string));
        if self.fail {
            return Err(SynthError::Api {
                status: 401,
                body: "bad key".to_string(),
            });
        }
        Ok(text.as_bytes().to_vec())
    }
}
