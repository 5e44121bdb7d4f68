//! Catalog HTTP client.

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use tourclip_models::{ReviewImage, TourContext, TourId};

use crate::error::{CatalogError, CatalogResult};
use crate::types::{ReviewMediaPage, TourDetails};

/// Configuration for the catalog client.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL of the catalog API
    pub base_url: String,
    /// Content language query parameter
    pub language: String,
    /// Price currency query parameter
    pub currency: String,
    /// Page size for reviewer media
    pub review_limit: u32,
    /// Reviewer media at or above this size (bytes) are dropped
    pub max_review_media_bytes: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.headout.com".to_string(),
            language: "en".to_string(),
            currency: "EUR".to_string(),
            review_limit: 20,
            max_review_media_bytes: 1_000_000,
        }
    }
}

impl CatalogConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("CATALOG_BASE_URL").unwrap_or(defaults.base_url),
            language: std::env::var("CATALOG_LANGUAGE").unwrap_or(defaults.language),
            currency: std::env::var("CATALOG_CURRENCY").unwrap_or(defaults.currency),
            review_limit: std::env::var("CATALOG_REVIEW_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.review_limit),
            max_review_media_bytes: std::env::var("CATALOG_MAX_REVIEW_MEDIA_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_review_media_bytes),
        }
    }
}

/// Client for the tour catalog.
pub struct CatalogClient {
    http: Client,
    config: CatalogConfig,
}

impl CatalogClient {
    /// Create a new catalog client.
    pub fn new(config: CatalogConfig) -> CatalogResult<Self> {
        let http = Client::builder().build().map_err(CatalogError::Network)?;
        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> CatalogResult<Self> {
        Self::new(CatalogConfig::from_env())
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Fetch tour details and reviewer media and flatten them into a context.
    pub async fn fetch_tour(&self, tour_id: &TourId) -> CatalogResult<TourContext> {
        let details = self.tour_details(tour_id).await?;
        let reviews = self.review_media(tour_id).await?;

        let review_images = filter_review_images(&reviews, self.config.max_review_media_bytes);
        let images: Vec<String> = details
            .image_uploads
            .into_iter()
            .map(|upload| upload.url)
            .collect();

        info!(
            tgid = %tour_id,
            images = images.len(),
            review_images = review_images.len(),
            "Fetched tour metadata for '{}'",
            details.name
        );

        Ok(TourContext {
            id: tour_id.clone(),
            name: details.name,
            images,
            review_images,
        })
    }

    /// Fetch raw tour details.
    pub async fn tour_details(&self, tour_id: &TourId) -> CatalogResult<TourDetails> {
        let url = format!(
            "{}/api/v6/tour-groups/{}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(tour_id.as_str())
        );
        self.get_json(
            &url,
            &[
                ("language", self.config.language.clone()),
                ("currency", self.config.currency.clone()),
            ],
        )
        .await
    }

    /// Fetch one page of reviewer media.
    pub async fn review_media(&self, tour_id: &TourId) -> CatalogResult<ReviewMediaPage> {
        let url = format!(
            "{}/api/v6/tour-groups/{}/review-medias",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(tour_id.as_str())
        );
        self.get_json(
            &url,
            &[
                ("language", self.config.language.clone()),
                ("currency", self.config.currency.clone()),
                ("limit", self.config.review_limit.to_string()),
            ],
        )
        .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> CatalogResult<T> {
        debug!("GET {}", url);

        let response = self.http.get(url).query(query).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::from_http_status(status, body));
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| CatalogError::invalid_response(format!("{}: {}", url, e)))
    }
}

/// Keep reviewer items whose first media is smaller than `max_bytes`.
/// Media without a reported size are dropped.
pub fn filter_review_images(page: &ReviewMediaPage, max_bytes: u64) -> Vec<ReviewImage> {
    page.items
        .iter()
        .filter_map(|item| item.primary_media())
        .filter_map(|media| {
            let size = media.file_size.filter(|size| *size < max_bytes)?;
            Some(ReviewImage {
                url: media.url.clone(),
                file_size: size,
            })
        })
        .collect()
}
