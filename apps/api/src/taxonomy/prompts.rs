// Prompt text for the product classification pass.

use crate::models::classification::ClassificationProduct;
use crate::taxonomy::tree::Taxonomy;

/// Role line for the classification system prompt.
pub const CLASSIFY_ROLE: &str =
    "You are a herbal product classifier. You assign each product to the single \
    most specific category of a fixed health taxonomy.";

/// Classification prompt template. Replace `{taxonomy}`, `{title}`,
/// `{description}` and `{ingredients}` before sending.
pub const CLASSIFY_PROMPT_TEMPLATE: &str = r#"Classify this product into the taxonomy below.

Title: {title}
Description: {description}
Ingredients: {ingredients}

Taxonomy (slug: title; subcategories are indented under their primary category):
{taxonomy}

Return a JSON object with this EXACT schema (no extra fields):
{
  "best_slug": "the single most specific slug that fits, preferably a subcategory",
  "category_slug": "the primary category slug",
  "sub_category_slug": "the subcategory slug, or null"
}

Rules:
- Use slugs exactly as listed; never invent new ones
- Prefer a subcategory over its primary when one clearly fits
- Never put a primary category slug in sub_category_slug
"#;

/// Renders the taxonomy as an indented slug list for the prompt.
pub fn render_taxonomy(taxonomy: &Taxonomy) -> String {
    let mut out = String::new();
    for primary in taxonomy.primaries() {
        out.push_str(&format!("- {}: {}\n", primary.slug, primary.title));
        for sub in &primary.subcategories {
            out.push_str(&format!("  - {}: {}\n", sub.slug, sub.title));
        }
    }
    out
}

pub fn build_classify_prompt(product: &ClassificationProduct, taxonomy_listing: &str) -> String {
    let ingredients = if product.ingredients.is_empty() {
        "unknown".to_string()
    } else {
        product.ingredients.join(", ")
    };
    CLASSIFY_PROMPT_TEMPLATE
        .replace("{taxonomy}", taxonomy_listing)
        .replace("{title}", &product.title)
        .replace("{description}", &product.description)
        .replace("{ingredients}", &ingredients)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::tree::tests::sample;

    #[test]
    fn test_render_taxonomy_indents_subcategories() {
        let listing = render_taxonomy(&sample());
        assert!(listing.contains("- immune-support: Immune Support\n  - cold-flu: Cold & Flu\n"));
        assert!(!listing.contains("orphan-sub"));
    }

    #[test]
    fn test_build_classify_prompt_fills_placeholders() {
        let product = ClassificationProduct {
            product_id: "1".to_string(),
            title: "Elderberry Syrup".to_string(),
            description: "Winter immune syrup".to_string(),
            ingredients: vec![],
        };
        let prompt = build_classify_prompt(&product, "- immune-support: Immune Support\n");
        assert!(prompt.contains("Title: Elderberry Syrup"));
        assert!(prompt.contains("Ingredients: unknown"));
        assert!(prompt.contains("- immune-support: Immune Support"));
        assert!(!prompt.contains("{title}"));
    }
}
