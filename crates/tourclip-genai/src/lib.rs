//! Generative model client.
//!
//! Sends text and image inputs to a responses-style model endpoint and asks
//! for a JSON answer matching a schema derived from a Rust type.

pub mod client;
pub mod error;
pub mod types;

pub use client::{GenAiClient, GenAiConfig};
pub use error::{GenAiError, GenAiResult};
pub use types::{ImageDetail, ImageInput, Role, StructuredRequest};
