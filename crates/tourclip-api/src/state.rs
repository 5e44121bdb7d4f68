//! Application state.

use std::sync::Arc;

use tracing::info;

use tourclip_catalog::CatalogClient;
use tourclip_genai::GenAiClient;
use tourclip_pipeline::{Orchestrator, PipelineConfig, Services};
use tourclip_storage::LocalStore;
use tourclip_synth::{SpeechSynthClient, VideoSynthClient};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<LocalStore>,
}

impl AppState {
    pub fn new(config: ApiConfig, orchestrator: Orchestrator, store: Arc<LocalStore>) -> Self {
        Self {
            config,
            orchestrator: Arc::new(orchestrator),
            store,
        }
    }

    /// Build every upstream client once from the environment.
    pub fn from_env(config: ApiConfig) -> anyhow::Result<Self> {
        let pipeline = PipelineConfig::from_env()?;
        let store = Arc::new(LocalStore::new(&pipeline.work_dir));

        let services = Services {
            catalog: Arc::new(CatalogClient::from_env()?),
            model: Arc::new(GenAiClient::from_env()?),
            video: Arc::new(VideoSynthClient::from_env()?),
            speech: Arc::new(SpeechSynthClient::from_env()?),
            store: store.clone(),
        };

        info!(
            work_dir = %pipeline.work_dir.display(),
            max_images = pipeline.max_images,
            assemble = pipeline.assemble,
            "Pipeline configured"
        );

        Ok(Self::new(config, Orchestrator::new(services, pipeline), store))
    }
}
