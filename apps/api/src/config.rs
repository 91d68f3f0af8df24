use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::llm_client::ModelConfig;

const DEFAULT_CATALOG_PATH: &str = "data/rogue-herbalist/minimal-product-catalog.csv";
const DEFAULT_TAXONOMY_PATH: &str = "data/rogue-herbalist/taxonomy_trimmed.xml";
pub const DEFAULT_PRODUCT_URL_TEMPLATE: &str = "https://rogueherbalist.com/product/{product_slug}/";

/// Application configuration loaded from environment variables.
/// Built once in `main` and handed to whatever needs it; nothing reads the
/// environment after startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Absent key means the service runs without an LLM.
    pub anthropic_api_key: Option<String>,
    pub model: ModelConfig,
    pub catalog_path: PathBuf,
    pub taxonomy_path: PathBuf,
    pub matcher_tables_path: Option<PathBuf>,
    pub recommendation: RecommendationSettings,
}

/// Knobs for the recommendation engine, injected rather than read globally.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationSettings {
    pub product_url_template: String,
    pub max_recommendations: usize,
    pub min_relevance_score: f64,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            product_url_template: DEFAULT_PRODUCT_URL_TEMPLATE.to_string(),
            max_recommendations: 5,
            min_relevance_score: 0.3,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = RecommendationSettings::default();
        let model_defaults = ModelConfig::default();

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            model: ModelConfig {
                model: optional_env("LLM_MODEL").unwrap_or(model_defaults.model),
                max_tokens: parse_env("LLM_MAX_TOKENS", model_defaults.max_tokens)?,
                temperature: parse_env("LLM_TEMPERATURE", model_defaults.temperature)?,
            },
            catalog_path: optional_env("CATALOG_PATH")
                .unwrap_or_else(|| DEFAULT_CATALOG_PATH.to_string())
                .into(),
            taxonomy_path: optional_env("TAXONOMY_PATH")
                .unwrap_or_else(|| DEFAULT_TAXONOMY_PATH.to_string())
                .into(),
            matcher_tables_path: optional_env("MATCHER_TABLES_PATH").map(PathBuf::from),
            recommendation: RecommendationSettings {
                product_url_template: optional_env("PRODUCT_URL_TEMPLATE")
                    .unwrap_or(defaults.product_url_template),
                max_recommendations: parse_env(
                    "MAX_RECOMMENDATIONS",
                    defaults.max_recommendations,
                )?,
                min_relevance_score: parse_env(
                    "MIN_RELEVANCE_SCORE",
                    defaults.min_relevance_score,
                )?,
            },
        })
    }
}

/// Returns the variable's value, treating unset and blank the same way.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has invalid value '{raw}'")),
        None => Ok(default),
    }
}
