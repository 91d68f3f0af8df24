mod config;
mod errors;
mod llm_client;
mod models;
mod recommendation;
mod routes;
mod state;
mod taxonomy;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::recommendation::catalog::load_catalog;
use crate::recommendation::engine::ProductRecommendationEngine;
use crate::recommendation::matcher::{CategoryMatcher, MatcherTables};
use crate::routes::build_router;
use crate::state::AppState;
use crate::taxonomy::classifier::{LlmProductClassifier, ProductClassifier};
use crate::taxonomy::tree::load_taxonomy;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Herbal API v{}", env!("CARGO_PKG_VERSION"));

    // Lookup tables: built-in unless MATCHER_TABLES_PATH points elsewhere
    let tables = match &config.matcher_tables_path {
        Some(path) => MatcherTables::from_json_file(path)?,
        None => MatcherTables::default(),
    };
    let matcher = Arc::new(CategoryMatcher::new(tables));

    // Catalog (missing file → empty catalog)
    let catalog = load_catalog(&config.catalog_path, matcher.tables())
        .with_context(|| format!("Failed to load catalog '{}'", config.catalog_path.display()))?;
    let engine = ProductRecommendationEngine::new(
        catalog,
        matcher.clone(),
        config.recommendation.clone(),
    );
    info!(
        "Recommendation engine ready: {} products, max {} per request, threshold {}",
        engine.catalog().len(),
        config.recommendation.max_recommendations,
        config.recommendation.min_relevance_score
    );

    // Taxonomy (missing file → empty taxonomy)
    let taxonomy = load_taxonomy(&config.taxonomy_path).with_context(|| {
        format!("Failed to load taxonomy '{}'", config.taxonomy_path.display())
    })?;

    // Initialize LLM client (optional)
    let llm = config
        .anthropic_api_key
        .clone()
        .map(|key| LlmClient::new(key, config.model.clone()));
    match &llm {
        Some(client) => info!("LLM client initialized (model: {})", client.model().model),
        None => warn!(
            "ANTHROPIC_API_KEY not set; quiz uses fallback advice and classification is disabled"
        ),
    }

    let classifier = llm
        .clone()
        .map(|client| Arc::new(LlmProductClassifier(client)) as Arc<dyn ProductClassifier>);

    // Build app state
    let state = AppState {
        llm,
        config: config.clone(),
        engine: Arc::new(engine),
        taxonomy: Arc::new(taxonomy),
        classifier,
    };

    // Build router
    // TODO: restrict CORS origins once the storefront domain is fixed
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
