//! Request/response types for the responses endpoint.

use serde::{Deserialize, Serialize};

/// Role of the single input message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    System,
}

/// Resolution hint for image inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    Low,
    High,
    #[default]
    Auto,
}

/// An image attached to a request by URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub url: String,
    pub detail: ImageDetail,
}

impl ImageInput {
    pub fn new(url: impl Into<String>, detail: ImageDetail) -> Self {
        Self {
            url: url.into(),
            detail,
        }
    }
}

/// One structured-output call: a prompt, optional images, and the name of
/// the schema the answer must follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredRequest {
    pub role: Role,
    pub prompt: String,
    pub images: Vec<ImageInput>,
    pub schema_name: String,
}

impl StructuredRequest {
    pub fn new(prompt: impl Into<String>, schema_name: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            prompt: prompt.into(),
            images: Vec::new(),
            schema_name: schema_name.into(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_image(mut self, image: ImageInput) -> Self {
        self.images.push(image);
        self
    }

    pub fn with_images(mut self, images: impl IntoIterator<Item = ImageInput>) -> Self {
        self.images.extend(images);
        self
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct ResponsesRequest {
    pub model: String,
    pub input: Vec<InputMessage>,
    pub text: TextConfig,
}

#[derive(Debug, Serialize)]
pub(crate) struct InputMessage {
    pub role: Role,
    pub content: Vec<InputContent>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum InputContent {
    InputText { text: String },
    InputImage { image_url: String, detail: ImageDetail },
}

#[derive(Debug, Serialize)]
pub(crate) struct TextConfig {
    pub format: TextFormat,
}

#[derive(Debug, Serialize)]
pub(crate) struct TextFormat {
    #[serde(rename = "type")]
    pub format_type: &'static str,
    pub name: String,
    pub schema: serde_json::Value,
    pub strict: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponsesResponse {
    #[serde(default)]
    pub output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OutputItem {
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OutputContent {
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub refusal: Option<String>,
}
