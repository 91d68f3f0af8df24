//! Slug Validator — checks LLM category guesses against the taxonomy and
//! repairs the usual mistakes.
//!
//! Resolution of a single guess, first match wins:
//! 1. exact slug (trimmed, lowercased)
//! 2. title-as-slug (`"Mood Balance"` → `mood-balance`'s owner)
//! 3. fuzzy match, normalized Levenshtein ≥ 0.8, best of 1
//! 4. no match
//!
//! `best_slug` is preferred. The legacy `category_slug` / `sub_category_slug`
//! pair is only read when `best_slug` is blank, and gets an extra hierarchy
//! check: subcategories in the category field are promoted, primaries in the
//! subcategory field are dropped.
//!
//! Ambiguity never errors. Every guess ends up valid, corrected, or cleared,
//! and each change is written to the report.

use serde::{Deserialize, Serialize};

use crate::models::classification::{RawClassification, ValidatedClassification};
use crate::taxonomy::tree::{SlugKind, Taxonomy};

const FUZZY_CUTOFF: f64 = 0.8;

const FIELD_BEST: &str = "best_slug";
const FIELD_CATEGORY: &str = "category_slug";
const FIELD_SUBCATEGORY: &str = "sub_category_slug";

// ────────────────────────────────────────────────────────────────────────────
// Report types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionReason {
    SubcategoryWithoutParent,
    TitleToSlugMapping,
    FuzzyMatch,
    NoMatchFound,
    SubcategoryInCategoryPosition,
    CategoryInSubcategoryPosition,
    ParentCategoryFilled,
    SubcategoryParentMismatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRecord {
    pub product_id: String,
    pub field: String,
    pub old: Option<String>,
    pub new: Option<String>,
    pub reason: CorrectionReason,
}

/// Counters and correction log for one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub total_records: usize,
    pub valid_category: usize,
    pub corrected_category: usize,
    pub invalid_category: usize,
    pub valid_subcategory: usize,
    pub corrected_subcategory: usize,
    pub invalid_subcategory: usize,
    pub hierarchy_corrections: usize,
    pub corrections: Vec<CorrectionRecord>,
}

impl ValidationReport {
    fn record(
        &mut self,
        product_id: &str,
        field: &str,
        old: Option<&str>,
        new: Option<&str>,
        reason: CorrectionReason,
    ) {
        self.corrections.push(CorrectionRecord {
            product_id: product_id.to_string(),
            field: field.to_string(),
            old: old.map(str::to_string),
            new: new.map(str::to_string),
            reason,
        });
    }

    fn tally_category(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Valid => self.valid_category += 1,
            Outcome::Corrected => self.corrected_category += 1,
            Outcome::Invalid => self.invalid_category += 1,
        }
    }

    fn tally_subcategory(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Valid => self.valid_subcategory += 1,
            Outcome::Corrected => self.corrected_subcategory += 1,
            Outcome::Invalid => self.invalid_subcategory += 1,
        }
    }
}

/// Validated records split by whether a category survived.
#[derive(Debug, Clone, Serialize)]
pub struct ValidatedBatch {
    pub assigned: Vec<ValidatedClassification>,
    pub unassigned: Vec<ValidatedClassification>,
    pub report: ValidationReport,
}

// ────────────────────────────────────────────────────────────────────────────
// Resolution
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Title,
    Fuzzy,
}

impl MatchKind {
    fn reason(self) -> Option<CorrectionReason> {
        match self {
            MatchKind::Exact => None,
            MatchKind::Title => Some(CorrectionReason::TitleToSlugMapping),
            MatchKind::Fuzzy => Some(CorrectionReason::FuzzyMatch),
        }
    }

    fn outcome(self) -> Outcome {
        match self {
            MatchKind::Exact => Outcome::Valid,
            MatchKind::Title | MatchKind::Fuzzy => Outcome::Corrected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub slug: String,
    pub via: MatchKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Valid,
    Corrected,
    Invalid,
}

pub struct SlugValidator<'a> {
    taxonomy: &'a Taxonomy,
}

impl<'a> SlugValidator<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        Self { taxonomy }
    }

    /// Maps a raw guess to a known slug, or `None`.
    pub fn resolve(&self, raw: &str) -> Option<Resolved> {
        let candidate = raw.trim().to_lowercase();
        if candidate.is_empty() {
            return None;
        }

        if self.taxonomy.contains(&candidate) {
            return Some(Resolved {
                slug: candidate,
                via: MatchKind::Exact,
            });
        }

        if let Some(slug) = self.taxonomy.slug_for_title(&candidate) {
            return Some(Resolved {
                slug: slug.to_string(),
                via: MatchKind::Title,
            });
        }

        self.fuzzy_match(&candidate).map(|slug| Resolved {
            slug: slug.to_string(),
            via: MatchKind::Fuzzy,
        })
    }

    /// Closest slug at or above the cutoff; the earliest slug wins ties.
    fn fuzzy_match(&self, candidate: &str) -> Option<&'a str> {
        let mut best: Option<(&'a str, f64)> = None;
        for slug in self.taxonomy.all_slugs() {
            let similarity = strsim::normalized_levenshtein(candidate, slug);
            if similarity >= FUZZY_CUTOFF && best.map_or(true, |(_, b)| similarity > b) {
                best = Some((slug.as_str(), similarity));
            }
        }
        best.map(|(slug, _)| slug)
    }

    /// Validates one record, updating `report`.
    pub fn validate(
        &self,
        raw: &RawClassification,
        report: &mut ValidationReport,
    ) -> ValidatedClassification {
        report.total_records += 1;

        let best_slug = raw.best_slug.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let (category_slug, sub_category_slug) = match best_slug {
            Some(guess) => self.validate_best_slug(&raw.product_id, guess, report),
            None => self.validate_legacy(
                &raw.product_id,
                raw.category_slug.as_deref(),
                raw.sub_category_slug.as_deref(),
                report,
            ),
        };

        ValidatedClassification {
            product_id: raw.product_id.clone(),
            title: raw.title.clone(),
            category_slug,
            sub_category_slug,
        }
    }

    pub fn validate_batch(&self, raws: &[RawClassification]) -> ValidatedBatch {
        let mut report = ValidationReport::default();
        let (assigned, unassigned) = raws
            .iter()
            .map(|raw| self.validate(raw, &mut report))
            .partition(ValidatedClassification::is_assigned);

        ValidatedBatch {
            assigned,
            unassigned,
            report,
        }
    }

    fn validate_best_slug(
        &self,
        product_id: &str,
        guess: &str,
        report: &mut ValidationReport,
    ) -> (Option<String>, Option<String>) {
        let Some(resolved) = self.resolve(guess) else {
            report.invalid_category += 1;
            report.record(
                product_id,
                FIELD_BEST,
                Some(guess),
                None,
                CorrectionReason::NoMatchFound,
            );
            return (None, None);
        };

        if let Some(reason) = resolved.via.reason() {
            report.record(product_id, FIELD_BEST, Some(guess), Some(&resolved.slug), reason);
        }

        match self.taxonomy.kind(&resolved.slug) {
            Some(SlugKind::Primary) => {
                report.tally_category(resolved.via.outcome());
                (Some(resolved.slug), None)
            }
            Some(SlugKind::Subcategory {
                parent: Some(parent),
            }) => {
                report.tally_category(resolved.via.outcome());
                report.tally_subcategory(resolved.via.outcome());
                (Some(parent.to_string()), Some(resolved.slug))
            }
            Some(SlugKind::Subcategory { parent: None }) | None => {
                report.invalid_category += 1;
                report.record(
                    product_id,
                    FIELD_BEST,
                    Some(&resolved.slug),
                    None,
                    CorrectionReason::SubcategoryWithoutParent,
                );
                (None, None)
            }
        }
    }

    fn validate_legacy(
        &self,
        product_id: &str,
        category: Option<&str>,
        subcategory: Option<&str>,
        report: &mut ValidationReport,
    ) -> (Option<String>, Option<String>) {
        let category = category.map(str::trim).filter(|s| !s.is_empty());
        let subcategory = subcategory.map(str::trim).filter(|s| !s.is_empty());

        let mut category_slug: Option<String> = None;
        let mut category_outcome = Outcome::Invalid;
        let mut promoted: Option<String> = None;

        if let Some(raw) = category {
            match self.resolve(raw) {
                None => {
                    report.record(
                        product_id,
                        FIELD_CATEGORY,
                        Some(raw),
                        None,
                        CorrectionReason::NoMatchFound,
                    );
                }
                Some(resolved) => {
                    if let Some(reason) = resolved.via.reason() {
                        report.record(
                            product_id,
                            FIELD_CATEGORY,
                            Some(raw),
                            Some(&resolved.slug),
                            reason,
                        );
                    }
                    match self.taxonomy.kind(&resolved.slug) {
                        Some(SlugKind::Primary) => {
                            category_outcome = resolved.via.outcome();
                            category_slug = Some(resolved.slug);
                        }
                        Some(SlugKind::Subcategory {
                            parent: Some(parent),
                        }) => {
                            report.hierarchy_corrections += 1;
                            report.record(
                                product_id,
                                FIELD_CATEGORY,
                                Some(&resolved.slug),
                                Some(parent),
                                CorrectionReason::SubcategoryInCategoryPosition,
                            );
                            category_outcome = Outcome::Corrected;
                            category_slug = Some(parent.to_string());
                            promoted = Some(resolved.slug);
                        }
                        Some(SlugKind::Subcategory { parent: None }) | None => {
                            report.record(
                                product_id,
                                FIELD_CATEGORY,
                                Some(&resolved.slug),
                                None,
                                CorrectionReason::SubcategoryWithoutParent,
                            );
                        }
                    }
                }
            }
        }

        let mut sub_slug: Option<String> = None;
        let mut sub_outcome: Option<Outcome> = None;

        if let Some(raw) = subcategory {
            sub_outcome = Some(Outcome::Invalid);
            match self.resolve(raw) {
                None => {
                    report.record(
                        product_id,
                        FIELD_SUBCATEGORY,
                        Some(raw),
                        None,
                        CorrectionReason::NoMatchFound,
                    );
                }
                Some(resolved) => {
                    if let Some(reason) = resolved.via.reason() {
                        report.record(
                            product_id,
                            FIELD_SUBCATEGORY,
                            Some(raw),
                            Some(&resolved.slug),
                            reason,
                        );
                    }
                    match self.taxonomy.kind(&resolved.slug) {
                        Some(SlugKind::Primary) => {
                            report.hierarchy_corrections += 1;
                            report.record(
                                product_id,
                                FIELD_SUBCATEGORY,
                                Some(&resolved.slug),
                                None,
                                CorrectionReason::CategoryInSubcategoryPosition,
                            );
                        }
                        Some(SlugKind::Subcategory {
                            parent: Some(parent),
                        }) => match category_slug.as_deref() {
                            None => {
                                report.record(
                                    product_id,
                                    FIELD_CATEGORY,
                                    None,
                                    Some(parent),
                                    CorrectionReason::ParentCategoryFilled,
                                );
                                category_outcome = Outcome::Corrected;
                                category_slug = Some(parent.to_string());
                                sub_outcome = Some(resolved.via.outcome());
                                sub_slug = Some(resolved.slug);
                            }
                            Some(current) if current == parent => {
                                sub_outcome = Some(resolved.via.outcome());
                                sub_slug = Some(resolved.slug);
                            }
                            Some(_) => {
                                report.record(
                                    product_id,
                                    FIELD_SUBCATEGORY,
                                    Some(&resolved.slug),
                                    None,
                                    CorrectionReason::SubcategoryParentMismatch,
                                );
                            }
                        },
                        Some(SlugKind::Subcategory { parent: None }) | None => {
                            report.record(
                                product_id,
                                FIELD_SUBCATEGORY,
                                Some(&resolved.slug),
                                None,
                                CorrectionReason::SubcategoryWithoutParent,
                            );
                        }
                    }
                }
            }
        }

        // A subcategory promoted out of the category field fills the gap.
        if sub_slug.is_none() && promoted.is_some() {
            sub_slug = promoted;
            sub_outcome = Some(Outcome::Corrected);
        }

        report.tally_category(category_outcome);
        if let Some(outcome) = sub_outcome {
            report.tally_subcategory(outcome);
        }

        (category_slug, sub_slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::tree::tests::sample;

    fn best(product_id: &str, slug: &str) -> RawClassification {
        RawClassification {
            product_id: product_id.to_string(),
            best_slug: Some(slug.to_string()),
            ..Default::default()
        }
    }

    fn legacy(category: Option<&str>, subcategory: Option<&str>) -> RawClassification {
        RawClassification {
            product_id: "p1".to_string(),
            category_slug: category.map(str::to_string),
            sub_category_slug: subcategory.map(str::to_string),
            ..Default::default()
        }
    }

    fn run(raw: RawClassification) -> (ValidatedClassification, ValidationReport) {
        run_with(&sample(), raw)
    }

    fn run_with(
        taxonomy: &Taxonomy,
        raw: RawClassification,
    ) -> (ValidatedClassification, ValidationReport) {
        let validator = SlugValidator::new(taxonomy);
        let mut report = ValidationReport::default();
        let validated = validator.validate(&raw, &mut report);
        (validated, report)
    }

    fn primaries(slugs: &[&str]) -> Taxonomy {
        let taxons: String = slugs
            .iter()
            .map(|slug| {
                format!(r#"<taxon slug="{slug}" type="primary"><title>{slug}</title></taxon>"#)
            })
            .collect();
        Taxonomy::parse(&format!("<taxonomy>{taxons}</taxonomy>")).unwrap()
    }

    #[test]
    fn test_valid_primary_is_idempotent() {
        let (validated, report) = run(best("p1", "immune-support"));
        assert_eq!(validated.category_slug.as_deref(), Some("immune-support"));
        assert_eq!(validated.sub_category_slug, None);
        assert_eq!(report.valid_category, 1);
        assert!(report.corrections.is_empty());

        let (again, report) = run(best("p1", validated.category_slug.as_deref().unwrap()));
        assert_eq!(again, validated);
        assert_eq!(report.valid_category, 1);
        assert!(report.corrections.is_empty());
    }

    #[test]
    fn test_subcategory_resolves_parent() {
        let (validated, report) = run(best("p1", "mood-balance"));
        assert_eq!(validated.category_slug.as_deref(), Some("stress-mood-anxiety"));
        assert_eq!(validated.sub_category_slug.as_deref(), Some("mood-balance"));
        assert_eq!(report.valid_category, 1);
        assert_eq!(report.valid_subcategory, 1);
        assert!(report.corrections.is_empty());
    }

    #[test]
    fn test_unknown_slug_is_cleared_and_logged() {
        let (validated, report) = run(best("p1", "totally-unknown-xyz"));
        assert_eq!(validated.category_slug, None);
        assert_eq!(validated.sub_category_slug, None);
        assert!(!validated.is_assigned());
        assert_eq!(report.invalid_category, 1);
        assert_eq!(report.corrections.len(), 1);
        assert_eq!(report.corrections[0].reason, CorrectionReason::NoMatchFound);
        assert_eq!(report.corrections[0].old.as_deref(), Some("totally-unknown-xyz"));
    }

    #[test]
    fn test_title_maps_to_slug() {
        let (validated, report) = run(best("p1", "Digestive Wellness"));
        assert_eq!(validated.category_slug.as_deref(), Some("gut-health"));
        assert_eq!(report.corrected_category, 1);
        assert_eq!(report.corrections[0].reason, CorrectionReason::TitleToSlugMapping);
        assert_eq!(report.corrections[0].new.as_deref(), Some("gut-health"));
    }

    #[test]
    fn test_title_of_subcategory_fills_parent() {
        let (validated, report) = run(best("p1", "Women's Digestion"));
        assert_eq!(validated.category_slug.as_deref(), Some("gut-health"));
        assert_eq!(validated.sub_category_slug.as_deref(), Some("womens-digestion"));
        assert_eq!(report.corrected_category, 1);
        assert_eq!(report.corrected_subcategory, 1);
    }

    #[test]
    fn test_fuzzy_match_corrects_typo() {
        let (validated, report) = run(best("p1", "immune-suport"));
        assert_eq!(validated.category_slug.as_deref(), Some("immune-support"));
        assert_eq!(report.corrected_category, 1);
        assert_eq!(report.corrections[0].reason, CorrectionReason::FuzzyMatch);
    }

    #[test]
    fn test_mixed_case_slug_matches_itself() {
        let taxonomy = primaries(&["Sleep-Aid", "CBD"]);
        for slug in ["Sleep-Aid", "CBD"] {
            let (validated, report) = run_with(&taxonomy, best("p1", slug));
            assert_eq!(
                validated.category_slug.as_deref(),
                Some(slug.to_lowercase().as_str())
            );
            assert_eq!(report.valid_category, 1);
            assert!(report.corrections.is_empty());
        }
    }

    #[test]
    fn test_fuzzy_tie_goes_to_earliest_slug() {
        let taxonomy = primaries(&["herb-a", "herb-b"]);
        let (validated, report) = run_with(&taxonomy, best("p1", "herb-c"));
        assert_eq!(validated.category_slug.as_deref(), Some("herb-a"));
        assert_eq!(report.corrections[0].reason, CorrectionReason::FuzzyMatch);
    }

    #[test]
    fn test_fuzzy_picks_closest_above_cutoff() {
        let taxonomy = primaries(&["calming-teas", "calming-tea"]);
        let (validated, _) = run_with(&taxonomy, best("p1", "calming-tex"));
        assert_eq!(validated.category_slug.as_deref(), Some("calming-tea"));
    }

    #[test]
    fn test_orphan_subcategory_is_cleared() {
        let (validated, report) = run(best("p1", "orphan-sub"));
        assert!(!validated.is_assigned());
        assert_eq!(report.invalid_category, 1);
        assert_eq!(
            report.corrections[0].reason,
            CorrectionReason::SubcategoryWithoutParent
        );
    }

    #[test]
    fn test_best_slug_overrides_legacy_fields() {
        let mut raw = best("p1", "cold-flu");
        raw.category_slug = Some("sleep-relaxation".to_string());
        let (validated, _) = run(raw);
        assert_eq!(validated.category_slug.as_deref(), Some("immune-support"));
        assert_eq!(validated.sub_category_slug.as_deref(), Some("cold-flu"));
    }

    #[test]
    fn test_legacy_valid_pair() {
        let (validated, report) = run(legacy(Some("immune-support"), Some("cold-flu")));
        assert_eq!(validated.category_slug.as_deref(), Some("immune-support"));
        assert_eq!(validated.sub_category_slug.as_deref(), Some("cold-flu"));
        assert_eq!(report.valid_category, 1);
        assert_eq!(report.valid_subcategory, 1);
        assert!(report.corrections.is_empty());
    }

    #[test]
    fn test_legacy_fields_resolve_by_title() {
        let raw = legacy(Some("Digestive Wellness"), Some("Women's Digestion"));
        let (validated, report) = run(raw);
        assert_eq!(validated.category_slug.as_deref(), Some("gut-health"));
        assert_eq!(validated.sub_category_slug.as_deref(), Some("womens-digestion"));
        assert_eq!(report.corrected_category, 1);
        assert_eq!(report.corrected_subcategory, 1);
        assert_eq!(report.corrections.len(), 2);
        assert!(report
            .corrections
            .iter()
            .all(|c| c.reason == CorrectionReason::TitleToSlugMapping));
    }

    #[test]
    fn test_legacy_fields_resolve_by_fuzzy_match() {
        let (validated, report) = run(legacy(Some("immune-suport"), Some("cold-flux")));
        assert_eq!(validated.category_slug.as_deref(), Some("immune-support"));
        assert_eq!(validated.sub_category_slug.as_deref(), Some("cold-flu"));
        assert_eq!(report.corrected_category, 1);
        assert_eq!(report.corrected_subcategory, 1);
        assert_eq!(report.corrections[0].field, FIELD_CATEGORY);
        assert_eq!(report.corrections[1].field, FIELD_SUBCATEGORY);
        assert!(report
            .corrections
            .iter()
            .all(|c| c.reason == CorrectionReason::FuzzyMatch));
    }

    #[test]
    fn test_legacy_subcategory_in_category_field_is_promoted() {
        let (validated, report) = run(legacy(Some("mood-balance"), None));
        assert_eq!(validated.category_slug.as_deref(), Some("stress-mood-anxiety"));
        assert_eq!(validated.sub_category_slug.as_deref(), Some("mood-balance"));
        assert_eq!(report.hierarchy_corrections, 1);
        assert_eq!(report.corrected_category, 1);
        assert_eq!(report.corrected_subcategory, 1);
        assert_eq!(
            report.corrections[0].reason,
            CorrectionReason::SubcategoryInCategoryPosition
        );
    }

    #[test]
    fn test_legacy_primary_in_subcategory_field_is_cleared() {
        let (validated, report) = run(legacy(Some("immune-support"), Some("sleep-relaxation")));
        assert_eq!(validated.category_slug.as_deref(), Some("immune-support"));
        assert_eq!(validated.sub_category_slug, None);
        assert_eq!(report.hierarchy_corrections, 1);
        assert_eq!(report.invalid_subcategory, 1);
        assert_eq!(
            report.corrections[0].reason,
            CorrectionReason::CategoryInSubcategoryPosition
        );
    }

    #[test]
    fn test_legacy_missing_category_filled_from_subcategory() {
        let (validated, report) = run(legacy(None, Some("cold-flu")));
        assert_eq!(validated.category_slug.as_deref(), Some("immune-support"));
        assert_eq!(validated.sub_category_slug.as_deref(), Some("cold-flu"));
        assert_eq!(report.corrected_category, 1);
        assert_eq!(report.invalid_category, 0);
        assert_eq!(report.corrections[0].reason, CorrectionReason::ParentCategoryFilled);
    }

    #[test]
    fn test_legacy_parent_mismatch_clears_subcategory() {
        let (validated, report) = run(legacy(Some("immune-support"), Some("mood-balance")));
        assert_eq!(validated.category_slug.as_deref(), Some("immune-support"));
        assert_eq!(validated.sub_category_slug, None);
        assert_eq!(report.invalid_subcategory, 1);
        assert_eq!(
            report.corrections[0].reason,
            CorrectionReason::SubcategoryParentMismatch
        );
    }

    #[test]
    fn test_legacy_empty_record_is_unassigned() {
        let (validated, report) = run(legacy(None, None));
        assert!(!validated.is_assigned());
        assert_eq!(report.invalid_category, 1);
        assert!(report.corrections.is_empty());
    }

    #[test]
    fn test_batch_partitions_and_counts() {
        let taxonomy = sample();
        let validator = SlugValidator::new(&taxonomy);
        let raws = vec![
            best("a", "immune-support"),
            best("b", "totally-unknown-xyz"),
            best("c", "mood-balance"),
        ];
        let batch = validator.validate_batch(&raws);
        assert_eq!(batch.report.total_records, 3);
        assert_eq!(batch.assigned.len(), 2);
        assert_eq!(batch.unassigned.len(), 1);
        assert_eq!(batch.unassigned[0].product_id, "b");
        assert_eq!(batch.report.valid_category, 2);
        assert_eq!(batch.report.invalid_category, 1);
    }

    #[test]
    fn test_reason_serializes_snake_case() {
        let json = serde_json::to_string(&CorrectionReason::NoMatchFound).unwrap();
        assert_eq!(json, "\"no_match_found\"");
    }
}
