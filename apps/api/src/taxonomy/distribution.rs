//! Category distribution over validated assignments.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::classification::ValidatedClassification;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubcategoryShare {
    pub slug: String,
    pub count: usize,
    /// Share of the parent category, one decimal.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub slug: String,
    pub count: usize,
    /// Share of all assignments, one decimal.
    pub percentage: f64,
    pub subcategories: Vec<SubcategoryShare>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionSummary {
    pub total_categories: usize,
    pub total_subcategories: usize,
    pub top_category: Option<String>,
    pub top_category_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDistribution {
    pub total_assignments: usize,
    /// Count descending, ties by slug.
    pub categories: Vec<CategoryShare>,
    pub summary: DistributionSummary,
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 1000.0).round() / 10.0
}

fn by_count_then_slug(counts: BTreeMap<&str, usize>) -> Vec<(&str, usize)> {
    let mut sorted: Vec<(&str, usize)> = counts.into_iter().collect();
    // BTreeMap order is by slug; the stable sort keeps it within equal counts.
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    sorted
}

/// Unassigned records are ignored.
pub fn category_distribution(records: &[ValidatedClassification]) -> CategoryDistribution {
    let mut category_counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut subcategory_counts: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();

    for record in records {
        let Some(category) = record.category_slug.as_deref() else {
            continue;
        };
        *category_counts.entry(category).or_default() += 1;
        if let Some(sub) = record.sub_category_slug.as_deref() {
            *subcategory_counts
                .entry(category)
                .or_default()
                .entry(sub)
                .or_default() += 1;
        }
    }

    let total_assignments: usize = category_counts.values().sum();
    let total_subcategories = subcategory_counts.values().map(BTreeMap::len).sum();

    let categories: Vec<CategoryShare> = by_count_then_slug(category_counts)
        .into_iter()
        .map(|(slug, count)| {
            let subcategories = subcategory_counts
                .remove(slug)
                .map(by_count_then_slug)
                .unwrap_or_default()
                .into_iter()
                .map(|(sub, sub_count)| SubcategoryShare {
                    slug: sub.to_string(),
                    count: sub_count,
                    percentage: percentage(sub_count, count),
                })
                .collect();

            CategoryShare {
                slug: slug.to_string(),
                count,
                percentage: percentage(count, total_assignments),
                subcategories,
            }
        })
        .collect();

    let summary = DistributionSummary {
        total_categories: categories.len(),
        total_subcategories,
        top_category: categories.first().map(|c| c.slug.clone()),
        top_category_count: categories.first().map_or(0, |c| c.count),
    };

    CategoryDistribution {
        total_assignments,
        categories,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assigned(category: Option<&str>, sub: Option<&str>) -> ValidatedClassification {
        ValidatedClassification {
            product_id: "p".to_string(),
            title: None,
            category_slug: category.map(str::to_string),
            sub_category_slug: sub.map(str::to_string),
        }
    }

    #[test]
    fn test_distribution_counts_and_percentages() {
        let records = vec![
            assigned(Some("immune-support"), Some("cold-flu")),
            assigned(Some("immune-support"), Some("cold-flu")),
            assigned(Some("immune-support"), None),
            assigned(Some("gut-health"), Some("bloating")),
            assigned(Some("sleep-relaxation"), None),
            assigned(None, None),
        ];
        let dist = category_distribution(&records);

        assert_eq!(dist.total_assignments, 5);
        assert_eq!(dist.categories[0].slug, "immune-support");
        assert_eq!(dist.categories[0].count, 3);
        assert_eq!(dist.categories[0].percentage, 60.0);
        assert_eq!(dist.categories[0].subcategories[0].slug, "cold-flu");
        assert_eq!(dist.categories[0].subcategories[0].percentage, 66.7);

        // Equal counts fall back to slug order.
        assert_eq!(dist.categories[1].slug, "gut-health");
        assert_eq!(dist.categories[2].slug, "sleep-relaxation");
        assert_eq!(dist.categories[2].percentage, 20.0);

        assert_eq!(dist.summary.total_categories, 3);
        assert_eq!(dist.summary.total_subcategories, 2);
        assert_eq!(dist.summary.top_category.as_deref(), Some("immune-support"));
        assert_eq!(dist.summary.top_category_count, 3);
    }

    #[test]
    fn test_empty_distribution() {
        let dist = category_distribution(&[]);
        assert_eq!(dist.total_assignments, 0);
        assert!(dist.categories.is_empty());
        assert_eq!(dist.summary.top_category, None);
    }
}
