//! Axum HTTP server for tour video runs.
//!
//! This crate provides:
//! - `GET /api/generate-video` triggering one pipeline run
//! - Liveness and readiness checks
//! - Per-IP rate limiting and security headers
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
