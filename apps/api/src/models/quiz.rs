use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// The fixed health-area vocabulary a quiz may reference.
pub const HEALTH_AREAS: &[&str] = &[
    "immune_support",
    "digestive_health",
    "stress_relief",
    "sleep_support",
    "joint_health",
    "cardiovascular_health",
    "respiratory_health",
    "skin_health",
    "cognitive_support",
    "energy_vitality",
    "women_health",
    "men_health",
    "detox_cleanse",
    "weight_management",
    "anti_aging",
    "inflammation",
    "mood_emotional",
    "liver_support",
    "kidney_health",
    "hormonal_balance",
];

const MIN_DESCRIPTION_CHARS: usize = 10;
const MAX_DESCRIPTION_CHARS: usize = 2000;
const MAX_TRIED_ALREADY_CHARS: usize = 1000;
const MAX_LIFESTYLE_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPreference {
    Low,
    Medium,
    High,
}

/// A user's health quiz submission.
///
/// `primary_health_areas` is the only area field read anywhere; the legacy
/// `primary_health_area` / `secondary_health_area` keys are accepted on input
/// and folded into it during deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawHealthQuizInput")]
pub struct HealthQuizInput {
    pub health_issue_description: String,
    pub tried_already: Option<String>,
    pub primary_health_areas: Vec<String>,
    pub age_range: Option<String>,
    pub severity_level: Option<u8>,
    pub budget_preference: Option<BudgetPreference>,
    pub lifestyle_factors: Option<String>,
}

/// Wire shape, including the legacy singular fields.
#[derive(Debug, Default, Deserialize)]
struct RawHealthQuizInput {
    health_issue_description: String,
    #[serde(default)]
    tried_already: Option<String>,
    #[serde(default)]
    primary_health_areas: Option<Vec<String>>,
    #[serde(default)]
    primary_health_area: Option<String>,
    #[serde(default)]
    secondary_health_area: Option<String>,
    #[serde(default)]
    age_range: Option<String>,
    #[serde(default)]
    severity_level: Option<u8>,
    #[serde(default)]
    budget_preference: Option<BudgetPreference>,
    #[serde(default)]
    lifestyle_factors: Option<String>,
}

impl From<RawHealthQuizInput> for HealthQuizInput {
    fn from(raw: RawHealthQuizInput) -> Self {
        let primary_health_areas = fold_health_areas(
            raw.primary_health_areas.unwrap_or_default(),
            raw.primary_health_area,
            raw.secondary_health_area,
        );

        HealthQuizInput {
            health_issue_description: raw.health_issue_description,
            tried_already: non_blank(raw.tried_already),
            primary_health_areas,
            age_range: non_blank(raw.age_range),
            severity_level: raw.severity_level,
            budget_preference: raw.budget_preference,
            lifestyle_factors: non_blank(raw.lifestyle_factors),
        }
    }
}

/// Legacy primary goes first, then the list, then the legacy secondary.
/// Entries are trimmed, lowercased, and deduplicated in order.
fn fold_health_areas(
    areas: Vec<String>,
    legacy_primary: Option<String>,
    legacy_secondary: Option<String>,
) -> Vec<String> {
    let mut folded: Vec<String> = Vec::new();
    let candidates = legacy_primary
        .into_iter()
        .chain(areas)
        .chain(legacy_secondary);

    for area in candidates {
        let area = area.trim().to_lowercase();
        if !area.is_empty() && !folded.contains(&area) {
            folded.push(area);
        }
    }
    folded
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl HealthQuizInput {
    #[cfg(test)]
    pub fn new(description: impl Into<String>, areas: &[&str]) -> Self {
        HealthQuizInput::from(RawHealthQuizInput {
            health_issue_description: description.into(),
            primary_health_areas: Some(areas.iter().map(|a| a.to_string()).collect()),
            ..Default::default()
        })
    }

    /// The area scored at full weight, if any.
    pub fn main_area(&self) -> Option<&str> {
        self.primary_health_areas.first().map(String::as_str)
    }

    /// Checks the submission against the request limits and the fixed area
    /// vocabulary.
    pub fn validate(&self) -> Result<(), AppError> {
        let description = self.health_issue_description.trim();
        if description.is_empty() {
            return Err(AppError::Validation(
                "health_issue_description is required".to_string(),
            ));
        }
        let description_len = description.chars().count();
        if description_len < MIN_DESCRIPTION_CHARS {
            return Err(AppError::Validation(format!(
                "health_issue_description must be at least {MIN_DESCRIPTION_CHARS} characters"
            )));
        }
        if description_len > MAX_DESCRIPTION_CHARS {
            return Err(AppError::Validation(format!(
                "health_issue_description must be at most {MAX_DESCRIPTION_CHARS} characters"
            )));
        }

        check_max_len("tried_already", &self.tried_already, MAX_TRIED_ALREADY_CHARS)?;
        check_max_len("lifestyle_factors", &self.lifestyle_factors, MAX_LIFESTYLE_CHARS)?;

        if let Some(unknown) = self
            .primary_health_areas
            .iter()
            .find(|area| !HEALTH_AREAS.contains(&area.as_str()))
        {
            return Err(AppError::Validation(format!(
                "Invalid health area: {unknown}"
            )));
        }

        if let Some(severity) = self.severity_level {
            if !(1..=10).contains(&severity) {
                return Err(AppError::Validation(
                    "severity_level must be between 1 and 10".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Structured advice returned by the LLM for a quiz. Scoring only reads
/// `herbal_categories`; the rest is passed through to the quiz output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmContext {
    pub general_advice: Vec<String>,
    pub herbal_categories: Vec<String>,
    pub lifestyle_suggestions: Vec<String>,
    pub follow_up_questions: Vec<String>,
    pub consultation_needed: bool,
    pub reasoning: String,
}

fn check_max_len(field: &str, value: &Option<String>, max: usize) -> Result<(), AppError> {
    match value {
        Some(v) if v.chars().count() > max => Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        ))),
        _ => Ok(()),
    }
}
