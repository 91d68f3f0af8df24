//! Relevance scoring — how well one catalog item fits one quiz.
//!
//! The score is a heuristic relevance signal in [0, 1], not a probability.
//! The only guarantee beyond the range is monotonicity: adding matching
//! evidence to a product never lowers its score.
//!
//! `RecommendationEngine` holds an `Arc<dyn RelevanceScorer>` so a different
//! scorer can be swapped in without touching the engine.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::models::catalog::ProductCatalogItem;
use crate::models::quiz::{HealthQuizInput, LlmContext};
use crate::recommendation::matcher::CategoryMatcher;

const CATEGORY_WEIGHT: f64 = 0.4;
const INGREDIENT_WEIGHT: f64 = 0.3;
const TEXT_WEIGHT: f64 = 0.2;
const QUALITY_WEIGHT: f64 = 0.1;

/// Every sub-score is computed against this maximum.
const SUB_SCORE_MAX: f64 = 10.0;

/// Weight of the first (main) health area and of every further area.
const MAIN_AREA_WEIGHT: f64 = 1.0;
const EXTRA_AREA_WEIGHT: f64 = 0.7;

const STOP_WORDS: &[&str] = &[
    "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "a", "an",
];

/// Scores a product against a quiz. Implementations must return a value in [0, 1].
pub trait RelevanceScorer: Send + Sync {
    fn score(
        &self,
        product: &ProductCatalogItem,
        quiz: &HealthQuizInput,
        llm_context: Option<&LlmContext>,
    ) -> f64;
}

/// One normalized factor: raw points earned against the factor's maximum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubScore {
    pub raw: f64,
    pub max: f64,
}

impl SubScore {
    fn capped(raw: f64) -> Self {
        Self {
            raw: raw.clamp(0.0, SUB_SCORE_MAX),
            max: SUB_SCORE_MAX,
        }
    }
}

/// Weighted four-factor scorer.
///
/// | factor     | weight |
/// |------------|--------|
/// | category   | 0.4    |
/// | ingredient | 0.3    |
/// | text       | 0.2    |
/// | quality    | 0.1    |
pub struct ProductScoringEngine {
    matcher: Arc<CategoryMatcher>,
}

impl RelevanceScorer for ProductScoringEngine {
    fn score(
        &self,
        product: &ProductCatalogItem,
        quiz: &HealthQuizInput,
        llm_context: Option<&LlmContext>,
    ) -> f64 {
        self.calculate_relevance_score(product, quiz, llm_context)
    }
}

impl ProductScoringEngine {
    pub fn new(matcher: Arc<CategoryMatcher>) -> Self {
        Self { matcher }
    }

    pub fn calculate_relevance_score(
        &self,
        product: &ProductCatalogItem,
        quiz: &HealthQuizInput,
        llm_context: Option<&LlmContext>,
    ) -> f64 {
        let factors = [
            (self.score_category_match(product, quiz), CATEGORY_WEIGHT),
            (
                self.score_ingredient_match(product, quiz, llm_context),
                INGREDIENT_WEIGHT,
            ),
            (score_text_similarity(product, quiz), TEXT_WEIGHT),
            (score_quality_factors(product), QUALITY_WEIGHT),
        ];

        let (score, max_score) = factors
            .iter()
            .fold((0.0, 0.0), |(score, max), (sub, weight)| {
                (score + sub.raw * weight, max + sub.max * weight)
            });

        if max_score > 0.0 {
            (score / max_score).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Areas paired with their weight: the first area is the main one.
    fn weighted_areas<'q>(quiz: &'q HealthQuizInput) -> impl Iterator<Item = (&'q str, f64)> {
        quiz.primary_health_areas
            .iter()
            .enumerate()
            .map(|(i, area)| {
                let weight = if i == 0 {
                    MAIN_AREA_WEIGHT
                } else {
                    EXTRA_AREA_WEIGHT
                };
                (area.as_str(), weight)
            })
    }

    /// +5×weight per product tag containing an area keyword, plus up to
    /// 3×weight for keyword hits in title and description.
    pub fn score_category_match(
        &self,
        product: &ProductCatalogItem,
        quiz: &HealthQuizInput,
    ) -> SubScore {
        let combined_text = format!("{} {}", product.title, product.description).to_lowercase();
        let mut score = 0.0;

        for (area, weight) in Self::weighted_areas(quiz) {
            let keywords = self.matcher.get_category_keywords(area);

            for category in &product.categories {
                let category = category.to_lowercase();
                if keywords.iter().any(|kw| category.contains(kw.as_str())) {
                    score += 5.0 * weight;
                }
            }

            let keyword_matches = keywords
                .iter()
                .filter(|kw| combined_text.contains(kw.as_str()))
                .count();
            if keyword_matches > 0 {
                score += (keyword_matches as f64).min(3.0) * weight;
            }
        }

        SubScore::capped(score)
    }

    /// +3 when an ingredient benefits the main area, +2 per further area it
    /// benefits, +2 per LLM-suggested herb category found in the ingredient.
    pub fn score_ingredient_match(
        &self,
        product: &ProductCatalogItem,
        quiz: &HealthQuizInput,
        llm_context: Option<&LlmContext>,
    ) -> SubScore {
        let llm_herbs: Vec<String> = llm_context
            .map(|ctx| {
                ctx.herbal_categories
                    .iter()
                    .map(|h| h.trim().to_lowercase())
                    .filter(|h| !h.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let mut score = 0.0;
        for ingredient in &product.ingredients {
            let benefits = self.matcher.get_ingredient_benefits(ingredient);

            for (i, area) in quiz.primary_health_areas.iter().enumerate() {
                if benefits.iter().any(|b| b == area) {
                    score += if i == 0 { 3.0 } else { 2.0 };
                }
            }

            let ingredient_lower = ingredient.to_lowercase();
            for herb in &llm_herbs {
                if ingredient_lower.contains(herb.as_str()) {
                    score += 2.0;
                }
            }
        }

        SubScore::capped(score)
    }
}

/// Fraction of the description's key terms that appear in the product text.
pub fn score_text_similarity(product: &ProductCatalogItem, quiz: &HealthQuizInput) -> SubScore {
    let terms = extract_key_terms(&quiz.health_issue_description);
    if terms.is_empty() {
        return SubScore::capped(0.0);
    }

    let product_text = format!(
        "{} {} {}",
        product.title,
        product.description,
        product.tags.join(" ")
    )
    .to_lowercase();

    let matches = terms
        .iter()
        .filter(|term| product_text.contains(term.as_str()))
        .count();

    SubScore::capped(matches as f64 / terms.len() as f64 * SUB_SCORE_MAX)
}

/// +3 in stock, up to +4 from rating, up to +3 from log10(review count).
pub fn score_quality_factors(product: &ProductCatalogItem) -> SubScore {
    let mut score = 0.0;

    if product.in_stock {
        score += 3.0;
    }

    if let Some(rating) = product.rating.filter(|r| *r > 0.0) {
        score += (rating.min(5.0) / 5.0) * 4.0;
    }

    if product.review_count > 0 {
        score += (product.review_count as f64).log10().min(3.0);
    }

    SubScore::capped(score)
}

fn word_pattern() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"\b\w+\b").expect("static regex is valid"))
}

/// Lowercased words longer than three characters, minus stop words.
pub fn extract_key_terms(text: &str) -> Vec<String> {
    let stop_words: HashSet<&str> = STOP_WORDS.iter().copied().collect();
    word_pattern()
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .filter(|w| w.chars().count() > 3 && !stop_words.contains(w.as_str()))
        .collect()
}
