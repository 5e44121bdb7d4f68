//! Service seams between the pipeline and its external collaborators.
//!
//! Each trait is implemented by the matching HTTP client; the orchestrator
//! receives them as trait objects built once at startup.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use tourclip_catalog::{CatalogClient, CatalogResult};
use tourclip_genai::client::{parse_structured, schema_value};
use tourclip_genai::{GenAiClient, GenAiResult, StructuredRequest};
use tourclip_models::{TourContext, TourId};
use tourclip_synth::{SpeechSynthClient, SynthResult, VideoRequest, VideoSynthClient};

/// Source of tour metadata.
#[async_trait]
pub trait TourCatalog: Send + Sync {
    async fn fetch_tour(&self, tour_id: &TourId) -> CatalogResult<TourContext>;
}

/// Generative model answering with JSON that follows a schema.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send a request and return the raw JSON text of the answer.
    async fn complete(
        &self,
        request: &StructuredRequest,
        schema: serde_json::Value,
    ) -> GenAiResult<String>;
}

/// Image-to-video synthesis backend.
#[async_trait]
pub trait VideoSynthesizer: Send + Sync {
    async fn generate(&self, request: &VideoRequest) -> SynthResult<Vec<u8>>;

    /// Model identifier recorded in the video plan.
    fn model(&self) -> &str;
}

/// Text-to-speech backend.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text`, optionally overriding the configured language.
    async fn synthesize(&self, text: &str, language: Option<&str>) -> SynthResult<Vec<u8>>;
}

/// Ask `model` for an answer shaped like `T`.
pub async fn ask<T>(model: &dyn LanguageModel, request: &StructuredRequest) -> GenAiResult<T>
where
    T: DeserializeOwned + JsonSchema,
{
    let text = model.complete(request, schema_value::<T>()?).await?;
    parse_structured(&text)
}

#[async_trait]
impl TourCatalog for CatalogClient {
    async fn fetch_tour(&self, tour_id: &TourId) -> CatalogResult<TourContext> {
        CatalogClient::fetch_tour(self, tour_id).await
    }
}

#[async_trait]
impl LanguageModel for GenAiClient {
    async fn complete(
        &self,
        request: &StructuredRequest,
        schema: serde_json::Value,
    ) -> GenAiResult<String> {
        self.generate_raw(request, schema).await
    }
}

#[async_trait]
impl VideoSynthesizer for VideoSynthClient {
    async fn generate(&self, request: &VideoRequest) -> SynthResult<Vec<u8>> {
        VideoSynthClient::generate(self, request).await
    }

    fn model(&self) -> &str {
        VideoSynthClient::model(self)
    }
}

#[async_trait]
impl SpeechSynthesizer for SpeechSynthClient {
    async fn synthesize(&self, text: &str, language: Option<&str>) -> SynthResult<Vec<u8>> {
        let request = self.request(text, language);
        SpeechSynthClient::synthesize(self, &request).await
    }
}
