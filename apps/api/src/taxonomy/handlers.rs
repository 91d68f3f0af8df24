//! Axum route handlers for the Taxonomy API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::classification::{
    ClassificationProduct, RawClassification, ValidatedClassification,
};
use crate::state::AppState;
use crate::taxonomy::classifier::{classify_batch, ClassificationRun};
use crate::taxonomy::distribution::{category_distribution, CategoryDistribution};
use crate::taxonomy::tree::PrimaryCategory;
use crate::taxonomy::validator::{SlugValidator, ValidationReport};

const MAX_BATCH_SIZE: usize = 100;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TaxonomyResponse {
    pub categories: Vec<PrimaryCategory>,
    pub total_slugs: usize,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub classifications: Vec<RawClassification>,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub assigned: Vec<ValidatedClassification>,
    pub unassigned: Vec<ValidatedClassification>,
    pub report: ValidationReport,
    pub distribution: CategoryDistribution,
}

#[derive(Debug, Deserialize)]
pub struct ClassificationRequest {
    pub products: Vec<ClassificationProduct>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/taxonomy
pub async fn handle_get_taxonomy(State(state): State<AppState>) -> Json<TaxonomyResponse> {
    Json(TaxonomyResponse {
        categories: state.taxonomy.primaries().to_vec(),
        total_slugs: state.taxonomy.all_slugs().len(),
    })
}

/// POST /api/v1/taxonomy/validate
///
/// Runs slug validation over caller-supplied guesses. No LLM involved.
pub async fn handle_validate(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> Result<Json<ValidateResponse>, AppError> {
    if request.classifications.is_empty() {
        return Err(AppError::Validation(
            "classifications cannot be empty".to_string(),
        ));
    }
    if request.classifications.iter().any(|c| c.product_id.trim().is_empty()) {
        return Err(AppError::Validation(
            "every classification needs a product_id".to_string(),
        ));
    }

    let batch = SlugValidator::new(&state.taxonomy).validate_batch(&request.classifications);
    let distribution = category_distribution(&batch.assigned);

    Ok(Json(ValidateResponse {
        assigned: batch.assigned,
        unassigned: batch.unassigned,
        report: batch.report,
        distribution,
    }))
}

/// POST /api/v1/product-classification
///
/// LLM classification of 1–100 products, validated against the taxonomy.
pub async fn handle_product_classification(
    State(state): State<AppState>,
    Json(request): Json<ClassificationRequest>,
) -> Result<Json<ClassificationRun>, AppError> {
    let count = request.products.len();
    if count == 0 || count > MAX_BATCH_SIZE {
        return Err(AppError::Validation(format!(
            "products must contain between 1 and {MAX_BATCH_SIZE} items"
        )));
    }
    if let Some(product) = request
        .products
        .iter()
        .find(|p| p.product_id.trim().is_empty() || p.title.trim().is_empty())
    {
        return Err(AppError::Validation(format!(
            "product '{}' needs both product_id and title",
            product.product_id
        )));
    }
    if state.taxonomy.is_empty() {
        return Err(AppError::NotFound("No taxonomy is loaded".to_string()));
    }

    let classifier = state.classifier.as_ref().ok_or(AppError::LlmUnavailable)?;
    let run = classify_batch(classifier.as_ref(), &state.taxonomy, &request.products).await;

    Ok(Json(run))
}
