//! Responses-endpoint client with JSON-schema structured output.

use reqwest::Client;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{GenAiError, GenAiResult};
use crate::types::{
    InputContent, InputMessage, ResponsesRequest, ResponsesResponse, StructuredRequest,
    TextConfig, TextFormat,
};

/// Configuration for the generative model client.
#[derive(Debug, Clone)]
pub struct GenAiConfig {
    pub api_key: String,
    /// Base URL, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    /// Model name
    pub model: String,
}

impl GenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> GenAiResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| GenAiError::config("OPENAI_API_KEY not set"))?;

        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            config.model = model;
        }
        Ok(config)
    }
}

/// Generative model client.
pub struct GenAiClient {
    http: Client,
    config: GenAiConfig,
}

impl GenAiClient {
    /// Create a new client.
    pub fn new(config: GenAiConfig) -> GenAiResult<Self> {
        let http = Client::builder().build()?;
        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> GenAiResult<Self> {
        Self::new(GenAiConfig::from_env()?)
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send a request and parse the answer as `T`.
    ///
    /// The JSON schema of `T` is sent along with the request so the model
    /// answers in that shape.
    pub async fn generate_structured<T>(&self, request: &StructuredRequest) -> GenAiResult<T>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let text = self.generate_raw(request, schema_value::<T>()?).await?;
        parse_structured(&text)
    }

    /// Send a request and return the raw output text.
    pub async fn generate_raw(
        &self,
        request: &StructuredRequest,
        schema: serde_json::Value,
    ) -> GenAiResult<String> {
        let url = format!("{}/responses", self.config.base_url.trim_end_matches('/'));

        let mut content = vec![InputContent::InputText {
            text: request.prompt.clone(),
        }];
        content.extend(request.images.iter().map(|image| InputContent::InputImage {
            image_url: image.url.clone(),
            detail: image.detail,
        }));

        let body = ResponsesRequest {
            model: self.config.model.clone(),
            input: vec![InputMessage {
                role: request.role,
                content,
            }],
            text: TextConfig {
                format: TextFormat {
                    format_type: "json_schema",
                    name: request.schema_name.clone(),
                    schema,
                    strict: false,
                },
            },
        };

        info!(
            model = %self.config.model,
            schema = %request.schema_name,
            images = request.images.len(),
            "Calling generative model"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenAiError::Api { status, body });
        }

        let parsed: ResponsesResponse = response.json().await?;
        let text = output_text(&parsed)?;
        debug!("Model output: {}", text);
        Ok(text)
    }
}

/// JSON schema for `T`, without the meta keys the endpoint does not accept.
pub fn schema_value<T: JsonSchema>() -> GenAiResult<serde_json::Value> {
    let mut schema = serde_json::to_value(schemars::schema_for!(T))?;
    if let Some(obj) = schema.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
    }
    Ok(schema)
}

/// Concatenate all `output_text` parts of message items.
fn output_text(response: &ResponsesResponse) -> GenAiResult<String> {
    let mut text = String::new();

    for item in response.output.iter().filter(|i| i.item_type == "message") {
        for part in &item.content {
            match part.content_type.as_str() {
                "output_text" => {
                    if let Some(t) = &part.text {
                        text.push_str(t);
                    }
                }
                "refusal" => {
                    return Err(GenAiError::Refusal(part.refusal.clone().unwrap_or_default()));
                }
                _ => {}
            }
        }
    }

    if text.trim().is_empty() {
        return Err(GenAiError::EmptyResponse);
    }
    Ok(text)
}

/// Parse structured output, tolerating a surrounding markdown code block.
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> GenAiResult<T> {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);

    serde_json::from_str(text.trim()).map_err(|e| GenAiError::parse(e.to_string()))
}
