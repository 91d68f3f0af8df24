//! Health quiz use case: LLM advice + ranked products + educational content.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::RecommendationSettings;
use crate::llm_client::prompts::json_system;
use crate::llm_client::{LlmClient, Usage};
use crate::models::catalog::ProductRecommendation;
use crate::models::quiz::{HealthQuizInput, LlmContext};
use crate::recommendation::engine::{ProductRecommendationEngine, RecommendationError};
use crate::recommendation::prompts::{build_quiz_advice_prompt, QUIZ_ADVICE_ROLE};

const BASE_CONFIDENCE: f64 = 0.5;
const DETAILED_DESCRIPTION_CHARS: usize = 50;
const CONSULTATION_SEVERITY: u8 = 8;
const CONSULTATION_TERMS: &[&str] = &["pain", "severe", "chronic", "medication", "doctor"];

const GENERAL_EDUCATION: &[&str] = &[
    "The importance of a balanced diet rich in antioxidants",
    "How stress affects your overall health and immunity",
    "The role of sleep in healing and recovery",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthQuizOutput {
    pub general_recommendations: Vec<String>,
    pub specific_products: Vec<ProductRecommendation>,
    pub educational_content: Vec<String>,
    pub lifestyle_suggestions: Vec<String>,
    pub follow_up_questions: Vec<String>,
    pub primary_categories_addressed: Vec<String>,
    pub confidence_score: f64,
    pub consultation_recommended: bool,
}

/// Where the advice in a quiz response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceSource {
    Llm,
    Fallback,
    ErrorFallback,
}

impl LlmContext {
    /// Advice used when no LLM is configured.
    pub fn fallback() -> Self {
        Self {
            general_advice: vec![
                "Consider consulting with a healthcare professional".to_string(),
                "Focus on a balanced diet with plenty of vegetables".to_string(),
                "Ensure adequate sleep and stress management".to_string(),
            ],
            herbal_categories: vec!["adaptogenic herbs".to_string(), "digestive herbs".to_string()],
            lifestyle_suggestions: vec![
                "Stay hydrated".to_string(),
                "Regular exercise".to_string(),
            ],
            follow_up_questions: vec!["How long have you experienced this issue?".to_string()],
            consultation_needed: false,
            reasoning: "General wellness approach recommended".to_string(),
        }
    }

    /// Advice used when the LLM call fails. Always recommends a consultation.
    pub fn error_fallback(error: &impl std::fmt::Display) -> Self {
        Self {
            general_advice: vec!["Consider consulting with a healthcare professional".to_string()],
            consultation_needed: true,
            reasoning: format!("Error generating recommendations: {error}"),
            ..Default::default()
        }
    }
}

/// Asks the LLM for advice. Never fails: a missing client or a failed call
/// degrades to fixed fallback advice.
pub async fn fetch_advice(
    llm: Option<&LlmClient>,
    quiz: &HealthQuizInput,
) -> (LlmContext, AdviceSource, Usage) {
    let Some(llm) = llm else {
        return (LlmContext::fallback(), AdviceSource::Fallback, Usage::default());
    };

    let prompt = build_quiz_advice_prompt(quiz);
    match llm
        .call_json_with_usage::<LlmContext>(&prompt, &json_system(QUIZ_ADVICE_ROLE))
        .await
    {
        Ok((advice, usage)) => (advice, AdviceSource::Llm, usage),
        Err(e) => {
            warn!("Health quiz advice call failed, using error fallback: {e}");
            (
                LlmContext::error_fallback(&e),
                AdviceSource::ErrorFallback,
                Usage::default(),
            )
        }
    }
}

/// Assembles the quiz response from advice already obtained.
pub fn process_health_quiz(
    quiz: &HealthQuizInput,
    advice: &LlmContext,
    engine: &ProductRecommendationEngine,
    settings: &RecommendationSettings,
) -> Result<HealthQuizOutput, RecommendationError> {
    let specific_products = engine.recommend_products(
        quiz,
        Some(advice),
        settings.max_recommendations,
        settings.min_relevance_score,
    )?;

    let output = HealthQuizOutput {
        general_recommendations: advice.general_advice.clone(),
        specific_products,
        educational_content: educational_content(quiz),
        lifestyle_suggestions: advice.lifestyle_suggestions.clone(),
        follow_up_questions: advice.follow_up_questions.clone(),
        primary_categories_addressed: quiz.primary_health_areas.clone(),
        confidence_score: confidence_score(quiz),
        consultation_recommended: should_recommend_consultation(quiz, advice),
    };

    info!(
        areas = ?quiz.primary_health_areas,
        products = output.specific_products.len(),
        consultation = output.consultation_recommended,
        "Health quiz processed"
    );
    Ok(output)
}

/// More detail in the quiz gives more confidence, capped at 1.0.
pub fn confidence_score(quiz: &HealthQuizInput) -> f64 {
    let mut score = BASE_CONFIDENCE;
    if !quiz.primary_health_areas.is_empty() {
        score += 0.2;
    }
    if quiz.tried_already.is_some() {
        score += 0.1;
    }
    if quiz.severity_level.is_some() {
        score += 0.1;
    }
    if quiz.health_issue_description.trim().chars().count() > DETAILED_DESCRIPTION_CHARS {
        score += 0.1;
    }
    score.min(1.0)
}

pub fn should_recommend_consultation(quiz: &HealthQuizInput, advice: &LlmContext) -> bool {
    if advice.consultation_needed {
        return true;
    }
    if quiz.severity_level.is_some_and(|s| s >= CONSULTATION_SEVERITY) {
        return true;
    }
    let description = quiz.health_issue_description.to_lowercase();
    CONSULTATION_TERMS.iter().any(|term| description.contains(term))
}

pub fn educational_content(quiz: &HealthQuizInput) -> Vec<String> {
    quiz.primary_health_areas
        .iter()
        .map(|area| format!("Learn more about {area} and natural approaches"))
        .chain(GENERAL_EDUCATION.iter().map(|line| line.to_string()))
        .collect()
}
