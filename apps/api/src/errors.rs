use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::recommendation::engine::RecommendationError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("LLM not configured")]
    LlmUnavailable,

    #[error("Recommendation error: {0}")]
    Recommendation(#[from] RecommendationError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::LlmUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "LLM_ERROR",
                "No LLM is configured; set ANTHROPIC_API_KEY".to_string(),
            ),
            AppError::Recommendation(e) => {
                tracing::error!("Recommendation error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RECOMMENDATION_ERROR",
                    e.to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::Validation("bad".to_string()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("gone".to_string()), StatusCode::NOT_FOUND),
            (AppError::LlmUnavailable, StatusCode::SERVICE_UNAVAILABLE),
            (
                AppError::Recommendation(RecommendationError::MissingSlug {
                    product_id: "1".to_string(),
                    title: "Tea".to_string(),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
