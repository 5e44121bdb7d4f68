//! Router tests against in-memory upstream fakes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use tourclip_api::{create_router, ApiConfig, AppState};
use tourclip_catalog::{CatalogError, CatalogResult};
use tourclip_genai::{GenAiError, GenAiResult, StructuredRequest};
use tourclip_models::{TourContext, TourId};
use tourclip_pipeline::{
    LanguageModel, Orchestrator, PipelineConfig, Services, SpeechSynthesizer, TourCatalog,
    VideoSynthesizer,
};
use tourclip_storage::LocalStore;
use tourclip_synth::{SynthResult, VideoRequest};

#[derive(Default)]
struct StubCatalog {
    down: bool,
    no_images: bool,
    calls: AtomicUsize,
}

#[async_trait]
impl TourCatalog for StubCatalog {
    async fn fetch_tour(&self, tour_id: &TourId) -> CatalogResult<TourContext> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down {
            return Err(CatalogError::from_http_status(503, "upstream exploded at 10.1.2.3"));
        }
        Ok(TourContext {
            id: tour_id.clone(),
            name: "Harbour Night Cruise".to_string(),
            images: if self.no_images {
                Vec::new()
            } else {
                (1..=3)
                    .map(|i| format!("https://cdn.test/cruise/{}.jpg", i))
                    .collect()
            },
            review_images: vec![],
        })
    }
}

struct StubModel;

#[async_trait]
impl LanguageModel for StubModel {
    async fn complete(
        &self,
        request: &StructuredRequest,
        _schema: Value,
    ) -> GenAiResult<String> {
        let answer = match request.schema_name.as_str() {
            "videoPrompt" => json!({
                "videoPrompt": "Gentle pan across the deck",
                "sceneDescription": "Lights along the harbour"
            }),
            "script" => json!({ "script": "Lights shimmer over calm water" }),
            _ => return Err(GenAiError::EmptyResponse),
        };
        Ok(answer.to_string())
    }
}

struct StubVideo;

#[async_trait]
impl VideoSynthesizer for StubVideo {
    async fn generate(&self, request: &VideoRequest) -> SynthResult<Vec<u8>> {
        Ok(request.start_image_url.as_bytes().to_vec())
    }

    fn model(&self) -> &str {
        "luma/ray"
    }
}

struct StubSpeech;

#[async_trait]
impl SpeechSynthesizer for StubSpeech {
    async fn synthesize(&self, text: &str, _language: Option<&str>) -> SynthResult<Vec<u8>> {
        Ok(text.as_bytes().to_vec())
    }
}

struct TestApp {
    router: Router,
    catalog: Arc<StubCatalog>,
    dir: TempDir,
}

fn test_app(catalog: StubCatalog, config: ApiConfig) -> TestApp {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(LocalStore::new(dir.path()));
    let catalog = Arc::new(catalog);

    let services = Services {
        catalog: catalog.clone(),
        model: Arc::new(StubModel),
        video: Arc::new(StubVideo),
        speech: Arc::new(StubSpeech),
        store: store.clone(),
    };
    let pipeline = PipelineConfig {
        work_dir: dir.path().to_path_buf(),
        ..Default::default()
    };

    let state = AppState::new(config, Orchestrator::new(services, pipeline), store);
    TestApp {
        router: create_router(state, None),
        catalog,
        dir,
    }
}

async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app(StubCatalog::default(), ApiConfig::default());
    let (status, body) = get(app.router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_ready_reports_work_dir() {
    let app = test_app(StubCatalog::default(), ApiConfig::default());
    let (status, body) = get(app.router, "/ready").await;

    // Assembly is off, so a missing ffmpeg does not degrade readiness.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["work_dir"]["status"], "ok");
    assert!(body["checks"]["ffmpeg"]["status"].is_string());
}

#[tokio::test]
async fn test_missing_tgid_is_rejected_before_any_call() {
    let app = test_app(StubCatalog::default(), ApiConfig::default());

    for uri in ["/api/generate-video", "/api/generate-video?tgid=%20%20"] {
        let (status, body) = get(app.router.clone(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "detail": "tgid is required" }));
    }
    assert_eq!(app.catalog.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_generate_video_success() {
    let app = test_app(StubCatalog::default(), ApiConfig::default());
    let (status, body) = get(app.router, "/api/generate-video?tgid=777").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "success");
    let run_id = body["run_id"].as_str().unwrap();
    assert!(!run_id.is_empty());

    let run_dir = app.dir.path().join(run_id);
    for file in ["run.json", "video_plan.json", "audio.mp3", "output_0.mp4", "output_2.mp4"] {
        assert!(run_dir.join(file).exists(), "missing {}", file);
    }
    assert_eq!(app.catalog.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_pipeline_failure_returns_generic_body() {
    let app = test_app(
        StubCatalog {
            down: true,
            ..Default::default()
        },
        ApiConfig::default(),
    );
    let (status, body) = get(app.router, "/api/generate-video?tgid=777").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "result": "failure", "detail": "Video generation failed" })
    );
}

#[tokio::test]
async fn test_tour_without_images_returns_generic_body() {
    let app = test_app(
        StubCatalog {
            no_images: true,
            ..Default::default()
        },
        ApiConfig::default(),
    );
    let (status, body) = get(app.router, "/api/generate-video?tgid=777").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "result": "failure", "detail": "Video generation failed" })
    );
    assert!(!body.to_string().contains("images_selected"));
}

#[tokio::test]
async fn test_unknown_skip_stage_is_bad_request() {
    let app = test_app(StubCatalog::default(), ApiConfig::default());
    let (status, body) = get(app.router, "/api/generate-video?tgid=777&skip=music").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("music"));
    assert_eq!(app.catalog.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_response_carries_request_id_and_security_headers() {
    let app = test_app(StubCatalog::default(), ApiConfig::default());
    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers["x-request-id"], "req-abc");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
}

#[tokio::test]
async fn test_rate_limit_per_client_ip() {
    let config = ApiConfig {
        rate_limit_rps: 1,
        ..Default::default()
    };
    let app = test_app(StubCatalog::default(), config);

    let request = || {
        Request::builder()
            .uri("/api/generate-video")
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::empty())
            .unwrap()
    };

    let first = app.router.clone().oneshot(request()).await.unwrap();
    assert_eq!(first.status(), StatusCode::BAD_REQUEST);

    let second = app.router.clone().oneshot(request()).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

    // Health routes are not limited.
    let (status, _) = get(app.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
}
