//! Tour metadata models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised when constructing a [`TourId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TourIdError {
    #[error("tour identifier is empty")]
    Empty,
}

/// Opaque catalog key identifying one bookable experience (TGID).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct TourId(String);

impl TourId {
    /// Create a tour ID, rejecting blank input.
    pub fn parse(s: impl AsRef<str>) -> Result<Self, TourIdError> {
        let trimmed = s.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TourIdError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TourId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reviewer-submitted image with its reported byte size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReviewImage {
    pub url: String,
    pub file_size: u64,
}

/// Everything the pipeline knows about a tour after the fetch step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TourContext {
    pub id: TourId,
    /// Display name
    pub name: String,
    /// Promotional images in catalog order
    pub images: Vec<String>,
    /// Reviewer images that passed the size filter, in catalog order
    pub review_images: Vec<ReviewImage>,
}

impl TourContext {
    /// Reviewer image URLs as a flat list.
    pub fn review_image_urls(&self) -> Vec<&str> {
        self.review_images.iter().map(|r| r.url.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tour_id_trims() {
        let id = TourId::parse("  12345 ").unwrap();
        assert_eq!(id.as_str(), "12345");
        assert_eq!(id.to_string(), "12345");
    }

    #[test]
    fn test_tour_id_rejects_blank() {
        assert_eq!(TourId::parse(""), Err(TourIdError::Empty));
        assert_eq!(TourId::parse("   "), Err(TourIdError::Empty));
    }

    #[test]
    fn test_tour_id_serializes_transparently() {
        let id = TourId::parse("42").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");
    }
}
