//! Catalog wire types.
//!
//! Only the fields the pipeline reads are modelled; everything else in the
//! catalog payloads is ignored.

use serde::{Deserialize, Serialize};

/// Tour details payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourDetails {
    pub name: String,
    #[serde(default)]
    pub image_uploads: Vec<ImageUpload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUpload {
    pub url: String,
}

/// Reviewer media page payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewMediaPage {
    #[serde(default)]
    pub items: Vec<ReviewItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    #[serde(default)]
    pub review_medias: Vec<ReviewMedia>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewMedia {
    pub url: String,
    /// Absent when the catalog does not report a size.
    #[serde(default)]
    pub file_size: Option<u64>,
}

impl ReviewItem {
    /// The first attached media, which is the only one the pipeline considers.
    pub fn primary_media(&self) -> Option<&ReviewMedia> {
        self.review_medias.first()
    }
}
