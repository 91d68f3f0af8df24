//! Product Classifier — pluggable, trait-based LLM classification pass.
//!
//! `AppState` holds an `Option<Arc<dyn ProductClassifier>>`; it is `None`
//! when no API key is configured. Every guess goes through `SlugValidator`
//! before it is returned, so a classifier may emit anything.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::llm_client::prompts::json_system;
use crate::llm_client::{LlmClient, LlmError, Usage};
use crate::models::classification::{
    ClassificationProduct, RawClassification, ValidatedClassification,
};
use crate::taxonomy::distribution::{category_distribution, CategoryDistribution};
use crate::taxonomy::prompts::{build_classify_prompt, render_taxonomy, CLASSIFY_ROLE};
use crate::taxonomy::tree::Taxonomy;
use crate::taxonomy::validator::{SlugValidator, ValidationReport};

// ────────────────────────────────────────────────────────────────────────────
// Output data models
// ────────────────────────────────────────────────────────────────────────────

/// A product the classifier could not handle. The batch continues without it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationFailure {
    pub product_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationRun {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u128,
    pub products_submitted: usize,
    pub assigned: Vec<ValidatedClassification>,
    pub unassigned: Vec<ValidatedClassification>,
    pub errors: Vec<ClassificationFailure>,
    pub report: ValidationReport,
    pub distribution: CategoryDistribution,
    pub usage: Usage,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait ProductClassifier: Send + Sync {
    /// One raw guess for one product. `taxonomy_listing` is the rendered
    /// slug list shared by every product in the batch.
    async fn classify(
        &self,
        product: &ClassificationProduct,
        taxonomy_listing: &str,
    ) -> Result<(RawClassification, Usage), LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// LlmProductClassifier
// ────────────────────────────────────────────────────────────────────────────

/// Shape of the model's reply; product identity is filled in locally.
#[derive(Debug, Deserialize)]
struct ClassifierReply {
    #[serde(default)]
    best_slug: Option<String>,
    #[serde(default)]
    category_slug: Option<String>,
    #[serde(default)]
    sub_category_slug: Option<String>,
}

pub struct LlmProductClassifier(pub LlmClient);

#[async_trait]
impl ProductClassifier for LlmProductClassifier {
    async fn classify(
        &self,
        product: &ClassificationProduct,
        taxonomy_listing: &str,
    ) -> Result<(RawClassification, Usage), LlmError> {
        let prompt = build_classify_prompt(product, taxonomy_listing);
        let (reply, usage) = self
            .0
            .call_json_with_usage::<ClassifierReply>(&prompt, &json_system(CLASSIFY_ROLE))
            .await?;

        Ok((
            RawClassification {
                product_id: product.product_id.clone(),
                title: Some(product.title.clone()),
                best_slug: reply.best_slug,
                category_slug: reply.category_slug,
                sub_category_slug: reply.sub_category_slug,
            },
            usage,
        ))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Batch pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Classify → validate → partition → distribution.
///
/// Products are classified one at a time; a failed call is recorded in
/// `errors` and the remaining products still run.
pub async fn classify_batch(
    classifier: &dyn ProductClassifier,
    taxonomy: &Taxonomy,
    products: &[ClassificationProduct],
) -> ClassificationRun {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let started = std::time::Instant::now();
    let listing = render_taxonomy(taxonomy);

    let mut guesses = Vec::with_capacity(products.len());
    let mut errors = Vec::new();
    let mut usage = Usage::default();

    for product in products {
        match classifier.classify(product, &listing).await {
            Ok((guess, call_usage)) => {
                usage.add(call_usage);
                guesses.push(guess);
            }
            Err(e) => {
                warn!(%run_id, product_id = %product.product_id, "Classification failed: {e}");
                errors.push(ClassificationFailure {
                    product_id: product.product_id.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    let batch = SlugValidator::new(taxonomy).validate_batch(&guesses);
    let distribution = category_distribution(&batch.assigned);

    info!(
        %run_id,
        products = products.len(),
        assigned = batch.assigned.len(),
        unassigned = batch.unassigned.len(),
        errors = errors.len(),
        corrections = batch.report.corrections.len(),
        input_tokens = usage.input_tokens,
        output_tokens = usage.output_tokens,
        "Classification batch finished"
    );

    ClassificationRun {
        run_id,
        started_at,
        duration_ms: started.elapsed().as_millis(),
        products_submitted: products.len(),
        assigned: batch.assigned,
        unassigned: batch.unassigned,
        errors,
        report: batch.report,
        distribution,
        usage,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::taxonomy::tree::tests::sample;

    /// Answers from a fixed table; unknown products fail.
    struct StubClassifier {
        answers: HashMap<&'static str, &'static str>,
    }

    #[async_trait]
    impl ProductClassifier for StubClassifier {
        async fn classify(
            &self,
            product: &ClassificationProduct,
            taxonomy_listing: &str,
        ) -> Result<(RawClassification, Usage), LlmError> {
            assert!(taxonomy_listing.contains("immune-support"));
            let Some(slug) = self.answers.get(product.product_id.as_str()) else {
                return Err(LlmError::EmptyContent);
            };
            Ok((
                RawClassification {
                    product_id: product.product_id.clone(),
                    title: Some(product.title.clone()),
                    best_slug: Some(slug.to_string()),
                    ..Default::default()
                },
                Usage {
                    input_tokens: 100,
                    output_tokens: 10,
                },
            ))
        }
    }

    fn product(id: &str) -> ClassificationProduct {
        ClassificationProduct {
            product_id: id.to_string(),
            title: format!("Product {id}"),
            description: String::new(),
            ingredients: vec![],
        }
    }

    #[tokio::test]
    async fn test_classify_batch_validates_and_partitions() {
        let classifier = StubClassifier {
            answers: HashMap::from([
                ("1", "mood-balance"),
                ("2", "immune-suport"),
                ("3", "totally-unknown-xyz"),
            ]),
        };
        let products = vec![product("1"), product("2"), product("3"), product("4")];

        let run = classify_batch(&classifier, &sample(), &products).await;

        assert_eq!(run.products_submitted, 4);
        assert_eq!(run.assigned.len(), 2);
        assert_eq!(run.unassigned.len(), 1);
        assert_eq!(run.unassigned[0].product_id, "3");
        assert_eq!(run.errors.len(), 1);
        assert_eq!(run.errors[0].product_id, "4");

        assert_eq!(run.report.valid_category, 1);
        assert_eq!(run.report.corrected_category, 1);
        assert_eq!(run.report.invalid_category, 1);

        assert_eq!(run.distribution.total_assignments, 2);
        assert_eq!(run.usage.input_tokens, 300);
        assert_eq!(run.usage.output_tokens, 30);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let classifier = StubClassifier {
            answers: HashMap::new(),
        };
        let run = classify_batch(&classifier, &sample(), &[]).await;
        assert!(run.assigned.is_empty());
        assert_eq!(run.report.total_records, 0);
    }
}
