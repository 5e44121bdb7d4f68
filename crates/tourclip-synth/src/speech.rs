//! Text-to-speech synthesis.

use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::error::{SynthError, SynthResult};

/// Configuration for the speech synthesis client.
#[derive(Debug, Clone)]
pub struct SpeechSynthConfig {
    pub api_key: String,
    pub base_url: String,
    /// Default voice identifier
    pub voice_id: String,
    /// Default synthesis model identifier
    pub model_id: String,
    /// Default language code
    pub language_code: String,
    /// Audio container/bitrate requested from the service
    pub output_format: String,
}

impl SpeechSynthConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.elevenlabs.io".to_string(),
            voice_id: "TX3LPaxmHKxFdv7VOQHJ".to_string(),
            model_id: "eleven_flash_v2_5".to_string(),
            language_code: "en".to_string(),
            output_format: "mp3_44100_128".to_string(),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> SynthResult<Self> {
        let api_key = std::env::var("ELEVENLABS_API_KEY")
            .map_err(|_| SynthError::config("ELEVENLABS_API_KEY not set"))?;

        let mut config = Self::new(api_key);
        if let Ok(v) = std::env::var("ELEVENLABS_BASE_URL") {
            config.base_url = v;
        }
        if let Ok(v) = std::env::var("TTS_VOICE_ID") {
            config.voice_id = v;
        }
        if let Ok(v) = std::env::var("TTS_MODEL_ID") {
            config.model_id = v;
        }
        if let Ok(v) = std::env::var("TTS_LANGUAGE") {
            config.language_code = v;
        }
        if let Ok(v) = std::env::var("TTS_OUTPUT_FORMAT") {
            config.output_format = v;
        }
        Ok(config)
    }
}

/// One text-to-speech job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    pub text: String,
    pub voice_id: String,
    pub model_id: String,
    pub language_code: String,
}

#[derive(Debug, Serialize)]
struct SpeechBody<'a> {
    text: &'a str,
    model_id: &'a str,
    language_code: &'a str,
}

/// Client for the text-to-speech API.
pub struct SpeechSynthClient {
    http: Client,
    config: SpeechSynthConfig,
}

impl SpeechSynthClient {
    pub fn new(config: SpeechSynthConfig) -> SynthResult<Self> {
        let http = Client::builder().build()?;
        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> SynthResult<Self> {
        Self::new(SpeechSynthConfig::from_env()?)
    }

    pub fn config(&self) -> &SpeechSynthConfig {
        &self.config
    }

    /// Build a request with the configured voice and model.
    pub fn request(&self, text: impl Into<String>, language_code: Option<&str>) -> SpeechRequest {
        SpeechRequest {
            text: text.into(),
            voice_id: self.config.voice_id.clone(),
            model_id: self.config.model_id.clone(),
            language_code: language_code
                .unwrap_or(&self.config.language_code)
                .to_string(),
        }
    }

    /// Synthesize speech and return the audio bytes.
    pub async fn synthesize(&self, request: &SpeechRequest) -> SynthResult<Vec<u8>> {
        let url = format!(
            "{}/v1/text-to-speech/{}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(&request.voice_id)
        );

        info!(
            voice_id = %request.voice_id,
            model_id = %request.model_id,
            language = %request.language_code,
            chars = request.text.len(),
            "Requesting speech synthesis"
        );

        let response = self
            .http
            .post(&url)
            .query(&[("output_format", self.config.output_format.as_str())])
            .header("xi-api-key", &self.config.api_key)
            .json(&SpeechBody {
                text: &request.text,
                model_id: &request.model_id,
                language_code: &request.language_code,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SynthError::Api { status, body });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(SynthError::EmptyPayload(url));
        }
        Ok(bytes.to_vec())
    }
}
