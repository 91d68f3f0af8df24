use serde::{Deserialize, Serialize};

/// One denormalized catalog row. Built once when the catalog is loaded and
/// never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductCatalogItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub short_description: String,
    /// Herbs found in the description text.
    pub ingredients: Vec<String>,
    /// Health-category tags derived from the description text.
    pub categories: Vec<String>,
    pub price: Option<f64>,
    pub in_stock: bool,
    pub rating: Option<f64>,
    pub review_count: u32,
    pub tags: Vec<String>,
    /// Required to build a purchase link.
    pub slug: String,
    pub contraindications: Vec<String>,
    pub benefits: Vec<String>,
}

/// A single scored recommendation. Created fresh per scoring pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecommendation {
    pub product_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    /// Heuristic relevance in [0, 1]; ordering signal only, not a probability.
    pub relevance_score: f64,
    pub purchase_link: String,
    pub rationale: String,
    /// At most three.
    pub ingredient_highlights: Vec<String>,
}

/// Aggregate numbers about the loaded catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_products: usize,
    pub in_stock_products: usize,
    pub categories: Vec<String>,
    pub avg_ingredients_per_product: f64,
}
