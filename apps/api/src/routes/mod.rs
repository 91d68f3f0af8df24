pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::recommendation::handlers as recommendation;
use crate::state::AppState;
use crate::taxonomy::handlers as taxonomy;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Recommendation API
        .route(
            "/api/v1/health-quiz",
            post(recommendation::handle_health_quiz),
        )
        .route(
            "/api/v1/recommendations",
            post(recommendation::handle_recommendations),
        )
        .route(
            "/api/v1/catalog/stats",
            get(recommendation::handle_catalog_stats),
        )
        // Taxonomy API
        .route("/api/v1/taxonomy", get(taxonomy::handle_get_taxonomy))
        .route(
            "/api/v1/taxonomy/validate",
            post(taxonomy::handle_validate),
        )
        .route(
            "/api/v1/product-classification",
            post(taxonomy::handle_product_classification),
        )
        .with_state(state)
}
