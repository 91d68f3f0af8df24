//! Axum route handlers for the Recommendation API.

use std::time::Instant;

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::Usage;
use crate::models::catalog::{CatalogStats, ProductRecommendation};
use crate::models::quiz::{HealthQuizInput, LlmContext};
use crate::recommendation::quiz::{
    fetch_advice, process_health_quiz, AdviceSource, HealthQuizOutput,
};
use crate::state::AppState;

const MAX_RECOMMENDATIONS_LIMIT: usize = 50;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct QuizMetadata {
    pub advice_source: AdviceSource,
    pub model: Option<String>,
    pub usage: Usage,
    pub processing_ms: u128,
}

#[derive(Debug, Serialize)]
pub struct HealthQuizResponse {
    pub request_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub data: HealthQuizOutput,
    pub metadata: QuizMetadata,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationsRequest {
    pub quiz: HealthQuizInput,
    #[serde(default)]
    pub llm_context: Option<LlmContext>,
    #[serde(default)]
    pub max_recommendations: Option<usize>,
    #[serde(default)]
    pub min_score_threshold: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<ProductRecommendation>,
    pub count: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/health-quiz
///
/// Full quiz flow: LLM advice (or fallback) → ranked products → education.
pub async fn handle_health_quiz(
    State(state): State<AppState>,
    Json(quiz): Json<HealthQuizInput>,
) -> Result<Json<HealthQuizResponse>, AppError> {
    quiz.validate()?;
    let started = Instant::now();

    let (advice, advice_source, usage) = fetch_advice(state.llm.as_ref(), &quiz).await;
    let data = process_health_quiz(
        &quiz,
        &advice,
        &state.engine,
        &state.config.recommendation,
    )?;

    Ok(Json(HealthQuizResponse {
        request_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        data,
        metadata: QuizMetadata {
            advice_source,
            model: state.llm.as_ref().map(|llm| llm.model().model.clone()),
            usage,
            processing_ms: started.elapsed().as_millis(),
        },
    }))
}

/// POST /api/v1/recommendations
///
/// Deterministic ranking only; no LLM call. Limit and threshold default to
/// the configured values.
pub async fn handle_recommendations(
    State(state): State<AppState>,
    Json(request): Json<RecommendationsRequest>,
) -> Result<Json<RecommendationsResponse>, AppError> {
    request.quiz.validate()?;

    let settings = &state.config.recommendation;
    let max = request
        .max_recommendations
        .unwrap_or(settings.max_recommendations);
    if max == 0 || max > MAX_RECOMMENDATIONS_LIMIT {
        return Err(AppError::Validation(format!(
            "max_recommendations must be between 1 and {MAX_RECOMMENDATIONS_LIMIT}"
        )));
    }

    let threshold = request
        .min_score_threshold
        .unwrap_or(settings.min_relevance_score);
    if !(0.0..=1.0).contains(&threshold) {
        return Err(AppError::Validation(
            "min_score_threshold must be between 0 and 1".to_string(),
        ));
    }

    let recommendations = state.engine.recommend_products(
        &request.quiz,
        request.llm_context.as_ref(),
        max,
        threshold,
    )?;

    Ok(Json(RecommendationsResponse {
        count: recommendations.len(),
        recommendations,
    }))
}

/// GET /api/v1/catalog/stats
pub async fn handle_catalog_stats(State(state): State<AppState>) -> Json<CatalogStats> {
    Json(state.engine.catalog_stats())
}
