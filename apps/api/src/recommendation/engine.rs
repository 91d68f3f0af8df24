//! Product Recommendation Engine — ranks the in-memory catalog against a quiz.
//!
//! Pipeline per call:
//! 1. Skip out-of-stock items.
//! 2. Score each remaining item; drop anything under the threshold.
//! 3. Build a recommendation per survivor (purchase link, rationale, highlights).
//! 4. Stable sort by score, descending; truncate.
//!
//! A missing slug is the one hard failure: a dead purchase link is worse than
//! no recommendation, so it aborts the call with `RecommendationError`.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::config::RecommendationSettings;
use crate::models::catalog::{CatalogStats, ProductCatalogItem, ProductRecommendation};
use crate::models::quiz::{HealthQuizInput, LlmContext};
use crate::recommendation::matcher::CategoryMatcher;
use crate::recommendation::scoring::{ProductScoringEngine, RelevanceScorer};

const MAX_HIGHLIGHTS: usize = 3;
const MAX_RATIONALE_INGREDIENTS: usize = 3;
const HIGH_RATING: f64 = 4.0;
const FALLBACK_CATEGORY: &str = "general";
const FALLBACK_RATIONALE: &str = "Selected based on ingredient profile and category matching";

#[derive(Debug, Error, PartialEq)]
pub enum RecommendationError {
    #[error(
        "Product {product_id} ({title}) has no slug; the catalog export must include a slug column"
    )]
    MissingSlug { product_id: String, title: String },
}

// ────────────────────────────────────────────────────────────────────────────
// Purchase links
// ────────────────────────────────────────────────────────────────────────────

/// A product URL template, classified by the placeholder it carries.
/// Checked in order: slug, name, id. Anything else is a static URL.
#[derive(Debug, Clone, PartialEq)]
pub enum PurchaseLinkTemplate {
    Slug(String),
    Name(String),
    Id(String),
    Static(String),
}

impl PurchaseLinkTemplate {
    pub fn parse(template: &str) -> Self {
        let template = template.to_string();
        if template.contains("{product_slug}") {
            Self::Slug(template)
        } else if template.contains("{product_name}") {
            Self::Name(template)
        } else if template.contains("{product_id}") {
            Self::Id(template)
        } else {
            Self::Static(template)
        }
    }

    pub fn render(&self, product: &ProductCatalogItem) -> Result<String, RecommendationError> {
        match self {
            Self::Slug(t) => {
                if product.slug.trim().is_empty() {
                    return Err(RecommendationError::MissingSlug {
                        product_id: product.id.clone(),
                        title: product.title.clone(),
                    });
                }
                Ok(t.replace("{product_slug}", &product.slug))
            }
            Self::Name(t) => Ok(t.replace("{product_name}", &product.title)),
            Self::Id(t) => Ok(t.replace("{product_id}", &product.id)),
            Self::Static(t) => Ok(t.clone()),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

pub struct ProductRecommendationEngine {
    catalog: Vec<ProductCatalogItem>,
    matcher: Arc<CategoryMatcher>,
    scorer: Arc<dyn RelevanceScorer>,
    link_template: PurchaseLinkTemplate,
}

impl ProductRecommendationEngine {
    /// Engine with the default weighted scorer.
    pub fn new(
        catalog: Vec<ProductCatalogItem>,
        matcher: Arc<CategoryMatcher>,
        settings: RecommendationSettings,
    ) -> Self {
        let scorer = Arc::new(ProductScoringEngine::new(matcher.clone()));
        Self::with_scorer(catalog, matcher, scorer, settings)
    }

    pub fn with_scorer(
        catalog: Vec<ProductCatalogItem>,
        matcher: Arc<CategoryMatcher>,
        scorer: Arc<dyn RelevanceScorer>,
        settings: RecommendationSettings,
    ) -> Self {
        let link_template = PurchaseLinkTemplate::parse(&settings.product_url_template);
        Self {
            catalog,
            matcher,
            scorer,
            link_template,
        }
    }

    pub fn catalog(&self) -> &[ProductCatalogItem] {
        &self.catalog
    }

    /// Ranked recommendations for a quiz. Deterministic for a fixed catalog.
    pub fn recommend_products(
        &self,
        quiz: &HealthQuizInput,
        llm_context: Option<&LlmContext>,
        max_recommendations: usize,
        min_score_threshold: f64,
    ) -> Result<Vec<ProductRecommendation>, RecommendationError> {
        let mut recommendations = Vec::new();

        for product in self.catalog.iter().filter(|p| p.in_stock) {
            let score = self.scorer.score(product, quiz, llm_context);
            if score < min_score_threshold {
                continue;
            }
            recommendations.push(ProductRecommendation {
                product_id: product.id.clone(),
                title: product.title.clone(),
                description: product.description.clone(),
                category: product
                    .categories
                    .first()
                    .cloned()
                    .unwrap_or_else(|| FALLBACK_CATEGORY.to_string()),
                relevance_score: score,
                purchase_link: self.generate_purchase_link(product)?,
                rationale: self.generate_rationale(product, quiz),
                ingredient_highlights: self.key_ingredients(product, quiz),
            });
        }

        // sort_by is stable: ties keep catalog order.
        recommendations.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(Ordering::Equal)
        });
        recommendations.truncate(max_recommendations);

        debug!(
            catalog = self.catalog.len(),
            returned = recommendations.len(),
            threshold = min_score_threshold,
            "Recommendations ranked"
        );
        Ok(recommendations)
    }

    pub fn generate_purchase_link(
        &self,
        product: &ProductCatalogItem,
    ) -> Result<String, RecommendationError> {
        self.link_template.render(product)
    }

    pub fn generate_rationale(
        &self,
        product: &ProductCatalogItem,
        quiz: &HealthQuizInput,
    ) -> String {
        let mut parts = Vec::new();

        if let Some(area) = quiz.main_area() {
            let title = product.title.to_lowercase();
            let description = product.description.to_lowercase();
            let mentions_area = self
                .matcher
                .get_category_keywords(area)
                .iter()
                .any(|kw| title.contains(kw.as_str()) || description.contains(kw.as_str()));
            if mentions_area {
                parts.push(format!("Specifically formulated for {area}"));
            }
        }

        let beneficial: Vec<&str> = product
            .ingredients
            .iter()
            .filter(|i| !self.matcher.get_ingredient_benefits(i).is_empty())
            .take(MAX_RATIONALE_INGREDIENTS)
            .map(String::as_str)
            .collect();
        if !beneficial.is_empty() {
            parts.push(format!(
                "Contains beneficial ingredients: {}",
                beneficial.join(", ")
            ));
        }

        if let Some(rating) = product.rating.filter(|r| *r >= HIGH_RATING) {
            parts.push(format!("Highly rated product ({rating:.1}/5.0)"));
        }

        if parts.is_empty() {
            return FALLBACK_RATIONALE.to_string();
        }
        parts.join(". ")
    }

    /// Ingredients whose benefits cover any of the quiz's areas, first three.
    pub fn key_ingredients(
        &self,
        product: &ProductCatalogItem,
        quiz: &HealthQuizInput,
    ) -> Vec<String> {
        product
            .ingredients
            .iter()
            .filter(|ingredient| {
                let benefits = self.matcher.get_ingredient_benefits(ingredient);
                quiz.primary_health_areas
                    .iter()
                    .any(|area| benefits.contains(area))
            })
            .take(MAX_HIGHLIGHTS)
            .cloned()
            .collect()
    }

    pub fn catalog_stats(&self) -> CatalogStats {
        let total = self.catalog.len();
        let categories: BTreeSet<&String> =
            self.catalog.iter().flat_map(|p| p.categories.iter()).collect();
        let ingredient_total: usize = self.catalog.iter().map(|p| p.ingredients.len()).sum();

        CatalogStats {
            total_products: total,
            in_stock_products: self.catalog.iter().filter(|p| p.in_stock).count(),
            categories: categories.into_iter().cloned().collect(),
            avg_ingredients_per_product: if total == 0 {
                0.0
            } else {
                ingredient_total as f64 / total as f64
            },
        }
    }
}
