//! Tour catalog client.
//!
//! Fetches tour details and reviewer-submitted media for a tour identifier
//! and flattens them into a [`tourclip_models::TourContext`].

pub mod client;
pub mod error;
pub mod types;

pub use client::{CatalogClient, CatalogConfig};
pub use error::{CatalogError, CatalogResult};
pub use types::{ImageUpload, ReviewItem, ReviewMedia, ReviewMediaPage, TourDetails};
