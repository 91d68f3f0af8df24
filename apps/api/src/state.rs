use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::recommendation::engine::ProductRecommendationEngine;
use crate::taxonomy::classifier::ProductClassifier;
use crate::taxonomy::tree::Taxonomy;

/// Shared application state injected into all route handlers via Axum extractors.
/// Catalog and taxonomy are loaded once at startup and never mutated.
#[derive(Clone)]
pub struct AppState {
    /// `None` when ANTHROPIC_API_KEY is unset; the quiz then uses fallback advice.
    pub llm: Option<LlmClient>,
    pub config: Config,
    pub engine: Arc<ProductRecommendationEngine>,
    pub taxonomy: Arc<Taxonomy>,
    /// Pluggable classifier. Default: LlmProductClassifier when an LLM is configured.
    pub classifier: Option<Arc<dyn ProductClassifier>>,
}
