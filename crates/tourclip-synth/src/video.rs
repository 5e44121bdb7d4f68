//! Image-to-video synthesis via a prediction API.
//!
//! A prediction is created with `Prefer: wait`, polled until it reaches a
//! terminal status, and the output file is then downloaded.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{SynthError, SynthResult};

/// Configuration for the video synthesis client.
#[derive(Debug, Clone)]
pub struct VideoSynthConfig {
    pub api_token: String,
    /// Base URL of the prediction API
    pub base_url: String,
    /// Model in `owner/name` form
    pub model: String,
    /// Delay between status polls
    pub poll_interval: Duration,
}

impl VideoSynthConfig {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            base_url: "https://api.replicate.com".to_string(),
            model: "luma/ray".to_string(),
            poll_interval: Duration::from_millis(2000),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> SynthResult<Self> {
        let token = std::env::var("REPLICATE_API_TOKEN")
            .map_err(|_| SynthError::config("REPLICATE_API_TOKEN not set"))?;

        let mut config = Self::new(token);
        if let Ok(base_url) = std::env::var("REPLICATE_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(model) = std::env::var("VIDEO_MODEL") {
            config.model = model;
        }
        if let Some(ms) = std::env::var("VIDEO_POLL_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.poll_interval = Duration::from_millis(ms);
        }
        Ok(config)
    }
}

/// One image-to-video job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoRequest {
    pub prompt: String,
    pub start_image_url: String,
}

#[derive(Debug, Serialize)]
struct CreatePrediction<'a> {
    input: &'a VideoRequest,
}

/// Prediction lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    Aborted,
}

impl PredictionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PredictionStatus::Starting | PredictionStatus::Processing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionStatus::Starting => "starting",
            PredictionStatus::Processing => "processing",
            PredictionStatus::Succeeded => "succeeded",
            PredictionStatus::Failed => "failed",
            PredictionStatus::Canceled => "canceled",
            PredictionStatus::Aborted => "aborted",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictionUrls {
    pub get: Option<String>,
}

/// Prediction resource.
#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub urls: Option<PredictionUrls>,
}

impl Prediction {
    /// URL of the produced file; a list output yields its first entry.
    pub fn output_url(&self) -> Option<&str> {
        match self.output.as_ref()? {
            serde_json::Value::String(s) => Some(s.as_str()),
            serde_json::Value::Array(items) => items.first().and_then(|v| v.as_str()),
            _ => None,
        }
    }
}

/// Client for the image-to-video prediction API.
pub struct VideoSynthClient {
    http: Client,
    config: VideoSynthConfig,
}

impl VideoSynthClient {
    pub fn new(config: VideoSynthConfig) -> SynthResult<Self> {
        if config.model.split('/').count() != 2 {
            return Err(SynthError::config(format!(
                "VIDEO_MODEL must be owner/name, got '{}'",
                config.model
            )));
        }
        let http = Client::builder().build()?;
        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> SynthResult<Self> {
        Self::new(VideoSynthConfig::from_env()?)
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Run one prediction to completion and return the video bytes.
    pub async fn generate(&self, request: &VideoRequest) -> SynthResult<Vec<u8>> {
        let mut prediction = self.create_prediction(request).await?;
        info!(
            prediction_id = %prediction.id,
            status = prediction.status.as_str(),
            "Created video prediction"
        );

        while !prediction.status.is_terminal() {
            tokio::time::sleep(self.config.poll_interval).await;
            prediction = self.poll(&prediction).await?;
            debug!(
                prediction_id = %prediction.id,
                status = prediction.status.as_str(),
                "Polled video prediction"
            );
        }

        if prediction.status != PredictionStatus::Succeeded {
            let message = prediction
                .error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_default();
            return Err(SynthError::PredictionFailed {
                id: prediction.id,
                status: prediction.status.as_str().to_string(),
                message,
            });
        }

        let output_url = prediction.output_url().ok_or_else(|| {
            SynthError::invalid_response(format!("prediction {} has no output URL", prediction.id))
        })?;

        self.download(output_url).await
    }

    async fn create_prediction(&self, request: &VideoRequest) -> SynthResult<Prediction> {
        let url = format!(
            "{}/v1/models/{}/predictions",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_token)
            .header("Prefer", "wait")
            .json(&CreatePrediction { input: request })
            .send()
            .await?;

        Self::parse_prediction(response).await
    }

    async fn poll(&self, prediction: &Prediction) -> SynthResult<Prediction> {
        let url = match prediction.urls.as_ref().and_then(|u| u.get.clone()) {
            Some(url) => url,
            None => format!(
                "{}/v1/predictions/{}",
                self.config.base_url.trim_end_matches('/'),
                urlencoding::encode(&prediction.id)
            ),
        };

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;

        Self::parse_prediction(response).await
    }

    async fn parse_prediction(response: reqwest::Response) -> SynthResult<Prediction> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SynthError::Api { status, body });
        }
        Ok(response.json().await?)
    }

    async fn download(&self, url: &str) -> SynthResult<Vec<u8>> {
        let response = self.http.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SynthError::Api { status, body });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(SynthError::EmptyPayload(url.to_string()));
        }
        Ok(bytes.to_vec())
    }
}
