//! Category Matcher — lookup tables that connect health areas, keywords and herbs.
//!
//! The tables are data, not code: `MatcherTables::default()` carries the
//! built-in set and `MatcherTables::from_json_file` swaps in an external one.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Health benefits associated with one herb.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientBenefits {
    pub ingredient: String,
    pub benefits: Vec<String>,
}

/// Keywords that earn a catalog item a category tag at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTagRule {
    pub tag: String,
    pub keywords: Vec<String>,
}

/// All lookup data used by matching, scoring and catalog loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherTables {
    /// Health area → product keywords.
    pub category_keywords: BTreeMap<String, Vec<String>>,
    /// Checked in order; first containment match wins.
    pub ingredient_benefits: Vec<IngredientBenefits>,
    /// Herbs recognised in catalog descriptions.
    pub herb_vocabulary: Vec<String>,
    /// Rules for deriving catalog category tags.
    pub category_tags: Vec<CategoryTagRule>,
}

impl MatcherTables {
    /// Loads tables from a JSON file. Missing sections fall back to the
    /// built-in defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read matcher tables '{}'", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid matcher tables JSON in '{}'", path.display()))
    }
}

const DEFAULT_CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("immune_support", &["immune", "immunity", "defense", "elderberry", "echinacea"]),
    ("digestive_health", &["digestive", "stomach", "gut", "digestion", "probiotics"]),
    ("stress_relief", &["stress", "anxiety", "calm", "relaxation", "adaptogen"]),
    ("sleep_support", &["sleep", "insomnia", "rest", "melatonin", "chamomile"]),
    ("joint_health", &["joint", "arthritis", "inflammation", "mobility", "turmeric"]),
    ("cardiovascular_health", &["heart", "cardiovascular", "circulation", "blood_pressure"]),
    ("respiratory_health", &["respiratory", "lungs", "breathing", "cough", "throat"]),
    ("skin_health", &["skin", "beauty", "complexion", "acne", "dermatology"]),
    ("cognitive_support", &["brain", "memory", "focus", "concentration", "cognitive"]),
    ("energy_vitality", &["energy", "vitality", "fatigue", "endurance", "stamina"]),
    ("women_health", &["women", "female", "menstrual", "hormonal", "menopause"]),
    ("men_health", &["men", "male", "prostate", "testosterone", "masculine"]),
    ("detox_cleanse", &["detox", "cleanse", "liver", "kidney", "purify"]),
    ("weight_management", &["weight", "metabolism", "diet", "fat", "slimming"]),
    ("anti_aging", &["anti-aging", "longevity", "antioxidant", "youth", "aging"]),
    ("inflammation", &["inflammation", "anti-inflammatory", "swelling", "pain"]),
    ("mood_emotional", &["mood", "emotional", "depression", "happiness", "well-being"]),
    ("liver_support", &["liver", "hepatic", "detox", "cleanse"]),
    ("kidney_health", &["kidney", "renal", "urinary", "bladder"]),
    ("hormonal_balance", &["hormonal", "hormone", "endocrine", "balance"]),
];

const DEFAULT_INGREDIENT_BENEFITS: &[(&str, &[&str])] = &[
    ("turmeric", &["inflammation", "joint_health", "antioxidant"]),
    ("ginger", &["digestive_health", "nausea", "inflammation"]),
    ("echinacea", &["immune_support", "respiratory_health"]),
    ("elderberry", &["immune_support", "antioxidant"]),
    ("ashwagandha", &["stress_relief", "energy_vitality", "adaptogen"]),
    ("chamomile", &["sleep_support", "stress_relief", "digestive_health"]),
    ("ginseng", &["energy_vitality", "cognitive_support", "stress_relief"]),
    ("milk_thistle", &["liver_support", "detox_cleanse"]),
    ("valerian", &["sleep_support", "anxiety", "stress_relief"]),
    ("garlic", &["cardiovascular_health", "immune_support"]),
    ("ginkgo", &["cognitive_support", "circulation"]),
    ("rhodiola", &["stress_relief", "energy_vitality", "mood_emotional"]),
];

const DEFAULT_HERB_VOCABULARY: &[&str] = &[
    "ginger",
    "turmeric",
    "ashwagandha",
    "echinacea",
    "elderberry",
    "ginseng",
    "chamomile",
    "valerian",
    "rhodiola",
    "milk thistle",
    "garlic",
    "ginkgo",
    "chaga",
    "turkey tail",
    "reishi",
    "lobelia",
    "mint",
    "fern",
];

const DEFAULT_CATEGORY_TAGS: &[(&str, &[&str])] = &[
    ("immune_support", &["immune", "immunity", "defense"]),
    ("digestive_health", &["digestive", "stomach", "gut", "cough", "syrup"]),
    ("stress_relief", &["stress", "calm", "adaptogen"]),
];

fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for MatcherTables {
    fn default() -> Self {
        Self {
            category_keywords: DEFAULT_CATEGORY_KEYWORDS
                .iter()
                .map(|(area, keywords)| (area.to_string(), words(keywords)))
                .collect(),
            ingredient_benefits: DEFAULT_INGREDIENT_BENEFITS
                .iter()
                .map(|(ingredient, benefits)| IngredientBenefits {
                    ingredient: ingredient.to_string(),
                    benefits: words(benefits),
                })
                .collect(),
            herb_vocabulary: words(DEFAULT_HERB_VOCABULARY),
            category_tags: DEFAULT_CATEGORY_TAGS
                .iter()
                .map(|(tag, keywords)| CategoryTagRule {
                    tag: tag.to_string(),
                    keywords: words(keywords),
                })
                .collect(),
        }
    }
}

/// Read-only view over `MatcherTables`.
#[derive(Debug, Clone, Default)]
pub struct CategoryMatcher {
    tables: MatcherTables,
}

impl CategoryMatcher {
    pub fn new(tables: MatcherTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &MatcherTables {
        &self.tables
    }

    /// Product keywords for a health area (case-insensitive). Unknown areas
    /// yield an empty slice.
    pub fn get_category_keywords(&self, health_area: &str) -> &[String] {
        self.tables
            .category_keywords
            .get(&health_area.trim().to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Health benefits for an ingredient. Underscores and spaces are treated
    /// alike and the match is containment in either direction.
    pub fn get_ingredient_benefits(&self, ingredient: &str) -> &[String] {
        let needle = normalize_ingredient(ingredient);
        if needle.is_empty() {
            return &[];
        }
        self.tables
            .ingredient_benefits
            .iter()
            .find(|entry| {
                let key = normalize_ingredient(&entry.ingredient);
                key.contains(&needle) || needle.contains(&key)
            })
            .map(|entry| entry.benefits.as_slice())
            .unwrap_or(&[])
    }
}

fn normalize_ingredient(raw: &str) -> String {
    raw.trim().to_lowercase().replace('_', " ")
}
