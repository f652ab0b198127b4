//! Application state.

use std::sync::Arc;

use lvid_pipeline::{PipelineConfig, ProviderSet, StageOrchestrator};
use lvid_providers::{
    HttpAvatarRenderer, HttpContentGenerator, HttpSpeechSynthesizer, HttpVideoCompositor,
    HttpWebSearch, ResearchGatherer, WebSearch,
};
use lvid_store::{MemoryStore, ProjectStore};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn ProjectStore>,
    pub orchestrator: Arc<StageOrchestrator>,
}

impl AppState {
    /// Create new application state with HTTP providers from the environment.
    pub fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let store: Arc<dyn ProjectStore> = Arc::new(MemoryStore::new());
        let pipeline_config = PipelineConfig::from_env();

        // Web search is optional; without a key the content stage simply
        // runs unenriched.
        let search: Option<Arc<dyn WebSearch>> = if std::env::var("SEARCH_API_KEY").is_ok() {
            Some(Arc::new(HttpWebSearch::from_env()?))
        } else {
            None
        };
        let research = Arc::new(ResearchGatherer::new(
            search,
            pipeline_config.research_chars_per_source,
        ));

        let providers = ProviderSet {
            content: Arc::new(HttpContentGenerator::from_env()?),
            speech: Arc::new(HttpSpeechSynthesizer::from_env()?),
            avatar: Arc::new(HttpAvatarRenderer::from_env()?),
            compositor: Arc::new(HttpVideoCompositor::from_env()?),
            research: Some(research),
        };

        let orchestrator = Arc::new(StageOrchestrator::new(
            Arc::clone(&store),
            providers,
            pipeline_config,
        ));

        Ok(Self {
            config,
            store,
            orchestrator,
        })
    }
}
