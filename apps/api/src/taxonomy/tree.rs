//! Taxonomy tree — the two-level category hierarchy loaded from XML.
//!
//! ```xml
//! <taxonomy>
//!   <taxon slug="stress-mood-anxiety" type="primary">
//!     <title>Stress, Mood &amp; Anxiety</title>
//!     <taxon slug="mood-balance" type="subcategory"><title>Mood Balance</title></taxon>
//!   </taxon>
//! </taxonomy>
//! ```
//!
//! Parent/child comes from element nesting. A `taxon` without a `type`
//! attribute is a primary at the top level and a subcategory when nested.
//! A subcategory outside any primary is kept as a known slug with no parent.
//! Slugs are stored lowercased.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("failed to read taxonomy: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid taxonomy XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("expected <taxonomy> root element, found <{0}>")]
    MissingRoot(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subcategory {
    pub slug: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrimaryCategory {
    pub slug: String,
    pub title: String,
    pub subcategories: Vec<Subcategory>,
}

/// What a known slug refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugKind<'a> {
    Primary,
    Subcategory { parent: Option<&'a str> },
}

/// Read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    primaries: Vec<PrimaryCategory>,
    primary_slugs: HashSet<String>,
    sub_parent: HashMap<String, String>,
    orphan_slugs: HashSet<String>,
    title_slugs: HashMap<String, String>,
    all_slugs: Vec<String>,
}

#[derive(Clone, Copy, PartialEq)]
enum TaxonType {
    Primary,
    Subcategory,
}

impl Taxonomy {
    pub fn parse(xml: &str) -> Result<Self, TaxonomyError> {
        let doc = roxmltree::Document::parse(xml)?;
        let root = doc.root_element();
        if root.tag_name().name() != "taxonomy" {
            return Err(TaxonomyError::MissingRoot(root.tag_name().name().to_string()));
        }

        let mut taxonomy = Taxonomy::default();
        taxonomy.walk(root, None);
        Ok(taxonomy)
    }

    fn walk(&mut self, node: roxmltree::Node<'_, '_>, parent: Option<usize>) {
        for child in node
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "taxon")
        {
            let slug = child
                .attribute("slug")
                .map(|s| s.trim().to_lowercase())
                .unwrap_or_default();
            let slug = slug.as_str();
            if slug.is_empty() {
                warn!("Skipping taxon without a slug");
                self.walk(child, parent);
                continue;
            }
            if self.contains(slug) {
                warn!(slug, "Duplicate taxon slug, keeping the first one");
                self.walk(child, parent);
                continue;
            }

            let title = child
                .children()
                .find(|n| n.is_element() && n.tag_name().name() == "title")
                .and_then(|n| n.text())
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(slug)
                .to_string();

            let taxon_type = match child.attribute("type") {
                Some("primary") => TaxonType::Primary,
                Some("subcategory") => TaxonType::Subcategory,
                _ if parent.is_none() => TaxonType::Primary,
                _ => TaxonType::Subcategory,
            };

            self.all_slugs.push(slug.to_string());
            self.title_slugs
                .entry(normalize_title(&title))
                .or_insert_with(|| slug.to_string());

            match (taxon_type, parent) {
                (TaxonType::Primary, _) => {
                    self.primary_slugs.insert(slug.to_string());
                    self.primaries.push(PrimaryCategory {
                        slug: slug.to_string(),
                        title,
                        subcategories: Vec::new(),
                    });
                    let index = self.primaries.len() - 1;
                    self.walk(child, Some(index));
                }
                (TaxonType::Subcategory, Some(index)) => {
                    let primary = &mut self.primaries[index];
                    self.sub_parent
                        .insert(slug.to_string(), primary.slug.clone());
                    primary.subcategories.push(Subcategory {
                        slug: slug.to_string(),
                        title,
                    });
                    self.walk(child, parent);
                }
                (TaxonType::Subcategory, None) => {
                    warn!(slug, "Subcategory outside any primary category");
                    self.orphan_slugs.insert(slug.to_string());
                    self.walk(child, None);
                }
            }
        }
    }

    pub fn primaries(&self) -> &[PrimaryCategory] {
        &self.primaries
    }

    /// Every known slug in document order.
    pub fn all_slugs(&self) -> &[String] {
        &self.all_slugs
    }

    pub fn is_empty(&self) -> bool {
        self.all_slugs.is_empty()
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.primary_slugs.contains(slug)
            || self.sub_parent.contains_key(slug)
            || self.orphan_slugs.contains(slug)
    }

    pub fn kind(&self, slug: &str) -> Option<SlugKind<'_>> {
        if self.primary_slugs.contains(slug) {
            Some(SlugKind::Primary)
        } else if let Some(parent) = self.sub_parent.get(slug) {
            Some(SlugKind::Subcategory {
                parent: Some(parent.as_str()),
            })
        } else if self.orphan_slugs.contains(slug) {
            Some(SlugKind::Subcategory { parent: None })
        } else {
            None
        }
    }

    /// Slug whose title normalizes to `candidate`.
    pub fn slug_for_title(&self, candidate: &str) -> Option<&str> {
        self.title_slugs
            .get(&normalize_title(candidate))
            .map(String::as_str)
    }
}

/// Title-as-slug: lowercase, drop apostrophes and ampersands, join words
/// with single hyphens.
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .replace(['\'', '\u{2019}', '&'], "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Loads the taxonomy at `path`. A missing file yields an empty taxonomy.
pub fn load_taxonomy(path: &Path) -> Result<Taxonomy, TaxonomyError> {
    if !path.exists() {
        warn!(path = %path.display(), "Taxonomy file not found, using empty taxonomy");
        return Ok(Taxonomy::default());
    }

    let xml = std::fs::read_to_string(path)?;
    let taxonomy = Taxonomy::parse(&xml)?;
    info!(
        path = %path.display(),
        primaries = taxonomy.primaries().len(),
        slugs = taxonomy.all_slugs().len(),
        "Taxonomy loaded"
    );
    Ok(taxonomy)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) const SAMPLE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<taxonomy>
  <taxon slug="stress-mood-anxiety" type="primary">
    <title>Stress, Mood &amp; Anxiety</title>
    <taxon slug="mood-balance" type="subcategory"><title>Mood Balance</title></taxon>
    <taxon slug="stress-relief" type="subcategory"><title>Stress Relief</title></taxon>
  </taxon>
  <taxon slug="immune-support" type="primary">
    <title>Immune Support</title>
    <taxon slug="cold-flu" type="subcategory"><title>Cold &amp; Flu</title></taxon>
  </taxon>
  <taxon slug="gut-health" type="primary">
    <title>Digestive Wellness</title>
    <taxon slug="womens-digestion"><title>Women's Digestion</title></taxon>
  </taxon>
  <taxon slug="sleep-relaxation" type="primary"><title>Sleep &amp; Relaxation</title></taxon>
  <taxon slug="orphan-sub" type="subcategory"><title>Orphan Sub</title></taxon>
</taxonomy>"#;

    pub(crate) fn sample() -> Taxonomy {
        Taxonomy::parse(SAMPLE_XML).unwrap()
    }

    #[test]
    fn test_parses_hierarchy_from_nesting() {
        let taxonomy = sample();
        let primaries: Vec<&str> = taxonomy.primaries().iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(
            primaries,
            vec!["stress-mood-anxiety", "immune-support", "gut-health", "sleep-relaxation"]
        );
        assert_eq!(taxonomy.primaries()[0].subcategories.len(), 2);
        assert_eq!(taxonomy.primaries()[0].title, "Stress, Mood & Anxiety");
    }

    #[test]
    fn test_slug_kinds() {
        let taxonomy = sample();
        assert_eq!(taxonomy.kind("immune-support"), Some(SlugKind::Primary));
        assert_eq!(
            taxonomy.kind("mood-balance"),
            Some(SlugKind::Subcategory {
                parent: Some("stress-mood-anxiety")
            })
        );
        assert_eq!(
            taxonomy.kind("womens-digestion"),
            Some(SlugKind::Subcategory {
                parent: Some("gut-health")
            })
        );
        assert_eq!(
            taxonomy.kind("orphan-sub"),
            Some(SlugKind::Subcategory { parent: None })
        );
        assert_eq!(taxonomy.kind("nope"), None);
    }

    #[test]
    fn test_all_slugs_in_document_order() {
        let taxonomy = sample();
        assert_eq!(taxonomy.all_slugs().len(), 9);
        assert_eq!(taxonomy.all_slugs()[1], "mood-balance");
        assert_eq!(taxonomy.all_slugs()[8], "orphan-sub");
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("Women's Digestion"), "womens-digestion");
        assert_eq!(normalize_title("Women\u{2019}s  Digestion"), "womens-digestion");
        assert_eq!(normalize_title("Cold & Flu"), "cold-flu");
        assert_eq!(normalize_title("  Sleep   Support "), "sleep-support");
    }

    #[test]
    fn test_slug_for_title() {
        let taxonomy = sample();
        assert_eq!(taxonomy.slug_for_title("Digestive Wellness"), Some("gut-health"));
        assert_eq!(taxonomy.slug_for_title("digestive-wellness"), Some("gut-health"));
        assert_eq!(taxonomy.slug_for_title("Unknown Title"), None);
    }

    #[test]
    fn test_slugs_are_lowercased() {
        let xml = r#"<taxonomy>
            <taxon slug="Sleep-Aid" type="primary">
                <title>Sleep Aid</title>
                <taxon slug="Deep-Rest"><title>Deep Rest</title></taxon>
            </taxon>
        </taxonomy>"#;
        let taxonomy = Taxonomy::parse(xml).unwrap();
        assert_eq!(taxonomy.primaries()[0].slug, "sleep-aid");
        assert_eq!(
            taxonomy.kind("deep-rest"),
            Some(SlugKind::Subcategory {
                parent: Some("sleep-aid")
            })
        );
        assert!(!taxonomy.contains("Sleep-Aid"));
        assert_eq!(taxonomy.slug_for_title("Deep Rest"), Some("deep-rest"));
    }

    #[test]
    fn test_rejects_wrong_root() {
        let err = Taxonomy::parse("<categories/>").unwrap_err();
        assert!(matches!(err, TaxonomyError::MissingRoot(name) if name == "categories"));
    }

    #[test]
    fn test_rejects_malformed_xml() {
        assert!(matches!(
            Taxonomy::parse("<taxonomy><taxon>"),
            Err(TaxonomyError::Xml(_))
        ));
    }

    #[test]
    fn test_skips_taxon_without_slug_and_duplicates() {
        let xml = r#"<taxonomy>
            <taxon type="primary"><title>No Slug</title></taxon>
            <taxon slug="a" type="primary"><title>First</title></taxon>
            <taxon slug="a" type="primary"><title>Second</title></taxon>
        </taxonomy>"#;
        let taxonomy = Taxonomy::parse(xml).unwrap();
        assert_eq!(taxonomy.primaries().len(), 1);
        assert_eq!(taxonomy.primaries()[0].title, "First");
    }

    #[test]
    fn test_load_taxonomy_missing_file_is_empty() {
        let taxonomy = load_taxonomy(Path::new("/nonexistent/taxonomy.xml")).unwrap();
        assert!(taxonomy.is_empty());
    }

    #[test]
    fn test_load_taxonomy_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_XML.as_bytes()).unwrap();
        let taxonomy = load_taxonomy(file.path()).unwrap();
        assert!(taxonomy.contains("cold-flu"));
    }
}
