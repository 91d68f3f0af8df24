use serde::{Deserialize, Serialize};

/// A product submitted for classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationProduct {
    pub product_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
}

/// Raw per-product output of the LLM classification pass.
///
/// `best_slug` is the model's single most specific guess. The two legacy
/// fields are only consulted when `best_slug` is absent or blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawClassification {
    pub product_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub best_slug: Option<String>,
    #[serde(default)]
    pub category_slug: Option<String>,
    #[serde(default)]
    pub sub_category_slug: Option<String>,
}

/// A classification after slug validation. `None` means the field was
/// cleared; a record without a category is unassigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedClassification {
    pub product_id: String,
    pub title: Option<String>,
    pub category_slug: Option<String>,
    pub sub_category_slug: Option<String>,
}

impl ValidatedClassification {
    pub fn is_assigned(&self) -> bool {
        self.category_slug.is_some()
    }
}
