//! Catalog CSV loading.
//!
//! Columns are matched by normalized header name, so WooCommerce exports and
//! hand-made sheets both load. Recognized columns (first alias present wins):
//!   id | product_id | sku, name | title | product_name,
//!   description | long_description, short_description | summary, slug,
//!   price | regular_price, in_stock | stock_status, rating | average_rating,
//!   review_count | rating_count, tags
//!
//! Ingredients and category tags are derived from the description text using
//! the herb vocabulary and tag rules in `MatcherTables`.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use crate::models::catalog::ProductCatalogItem;
use crate::recommendation::matcher::MatcherTables;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Why a single row was rejected. Never escapes the loader.
#[derive(Debug, Error, PartialEq)]
enum RowError {
    #[error("row has no product id")]
    MissingId,

    #[error("column '{column}' has unparseable value '{value}'")]
    BadValue { column: &'static str, value: String },
}

/// Loads the catalog at `path`.
///
/// A missing file yields an empty catalog so a not-yet-provisioned client
/// returns zero recommendations instead of failing.
pub fn load_catalog(
    path: &Path,
    tables: &MatcherTables,
) -> Result<Vec<ProductCatalogItem>, CatalogError> {
    if !path.exists() {
        warn!(path = %path.display(), "Catalog file not found, using empty catalog");
        return Ok(Vec::new());
    }

    let file = std::fs::File::open(path)?;
    let catalog = parse_catalog(file, tables)?;
    info!(path = %path.display(), products = catalog.len(), "Catalog loaded");
    Ok(catalog)
}

/// Parses catalog rows from any reader. Malformed rows are logged and skipped.
pub fn parse_catalog<R: Read>(
    reader: R,
    tables: &MatcherTables,
) -> Result<Vec<ProductCatalogItem>, CatalogError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns: HashMap<String, usize> = csv_reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (normalize_header(h), i))
        .collect();

    let mut catalog = Vec::new();
    for (row_num, result) in csv_reader.records().enumerate() {
        // Header is line 1.
        let line = row_num + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(line, error = %e, "Skipping unreadable catalog row");
                continue;
            }
        };

        let row = Row {
            columns: &columns,
            record: &record,
        };
        match item_from_row(&row, tables) {
            Ok(item) => catalog.push(item),
            Err(e) => warn!(line, reason = %e, "Skipping malformed catalog row"),
        }
    }

    Ok(catalog)
}

/// Strips a BOM, lowercases, and turns spaces into underscores.
fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .trim()
        .to_lowercase()
        .replace(' ', "_")
}

struct Row<'a> {
    columns: &'a HashMap<String, usize>,
    record: &'a csv::StringRecord,
}

impl Row<'_> {
    /// First non-empty value among the aliases.
    fn get(&self, aliases: &[&str]) -> Option<&str> {
        aliases.iter().find_map(|alias| {
            self.columns
                .get(*alias)
                .and_then(|&i| self.record.get(i))
                .filter(|v| !v.is_empty())
        })
    }

    fn text(&self, aliases: &[&str]) -> String {
        self.get(aliases).unwrap_or_default().to_string()
    }
}

fn item_from_row(row: &Row<'_>, tables: &MatcherTables) -> Result<ProductCatalogItem, RowError> {
    let id = row.text(&["id", "product_id", "sku"]);
    if id.is_empty() {
        return Err(RowError::MissingId);
    }

    let description = row.text(&["description", "long_description"]);
    let short_description = row.text(&["short_description", "summary"]);
    let combined_text = format!("{description} {short_description}").to_lowercase();

    let ingredients = tables
        .herb_vocabulary
        .iter()
        .filter(|herb| combined_text.contains(herb.to_lowercase().as_str()))
        .cloned()
        .collect();

    let categories = tables
        .category_tags
        .iter()
        .filter(|rule| rule.keywords.iter().any(|kw| combined_text.contains(kw.as_str())))
        .map(|rule| rule.tag.clone())
        .collect();

    let price = row
        .get(&["price", "regular_price"])
        .map(|v| parse_number("price", v))
        .transpose()?;

    let in_stock = row
        .get(&["in_stock", "stock_status"])
        .map(parse_stock)
        .transpose()?
        .unwrap_or(true);

    let rating = row
        .get(&["rating", "average_rating"])
        .map(|v| parse_number("rating", v))
        .transpose()?;

    let review_count = match row.get(&["review_count", "rating_count"]) {
        Some(v) => v.parse::<u32>().map_err(|_| RowError::BadValue {
            column: "review_count",
            value: v.to_string(),
        })?,
        None => 0,
    };

    let tags = row
        .get(&["tags"])
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(ProductCatalogItem {
        id,
        title: row.text(&["name", "title", "product_name"]),
        description,
        short_description,
        ingredients,
        categories,
        price,
        in_stock,
        rating,
        review_count,
        tags,
        slug: row.text(&["slug"]),
        contraindications: Vec::new(),
        benefits: Vec::new(),
    })
}

fn parse_number(column: &'static str, value: &str) -> Result<f64, RowError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| RowError::BadValue {
            column,
            value: value.to_string(),
        })
}

/// Accepts WooCommerce stock statuses and plain boolean words.
fn parse_stock(value: &str) -> Result<bool, RowError> {
    match value.to_lowercase().as_str() {
        "instock" | "in_stock" | "onbackorder" | "true" | "1" | "yes" | "y" => Ok(true),
        "outofstock" | "out_of_stock" | "false" | "0" | "no" | "n" => Ok(false),
        _ => Err(RowError::BadValue {
            column: "in_stock",
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(csv: &str) -> Vec<ProductCatalogItem> {
        parse_catalog(csv.as_bytes(), &MatcherTables::default()).unwrap()
    }

    #[test]
    fn test_parses_woocommerce_style_headers() {
        let csv = "\u{feff}ID,Name,Description,Short Description,Slug\n\
                   101,Immune Tonic,Elderberry and echinacea for immune defense,Daily tonic,immune-tonic\n";
        let items = parse(csv);
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.id, "101");
        assert_eq!(item.title, "Immune Tonic");
        assert_eq!(item.short_description, "Daily tonic");
        assert_eq!(item.slug, "immune-tonic");
        assert_eq!(item.ingredients, vec!["echinacea", "elderberry"]);
        assert_eq!(item.categories, vec!["immune_support"]);
        assert!(item.in_stock);
        assert!(item.price.is_none());
    }

    #[test]
    fn test_header_aliases() {
        let csv = "sku,product_name,long_description,summary\n\
                   A-1,Calm Drops,Adaptogen blend,with ashwagandha\n";
        let items = parse(csv);
        assert_eq!(items[0].id, "A-1");
        assert_eq!(items[0].title, "Calm Drops");
        assert_eq!(items[0].ingredients, vec!["ashwagandha"]);
        assert_eq!(items[0].categories, vec!["stress_relief"]);
    }

    #[test]
    fn test_optional_columns() {
        let csv = "id,title,description,regular_price,stock_status,average_rating,rating_count,tags\n\
                   1,Gut Tea,ginger tea,12.50,outofstock,4.6,17,\"tea, digestion\"\n";
        let item = &parse(csv)[0];
        assert_eq!(item.price, Some(12.5));
        assert!(!item.in_stock);
        assert_eq!(item.rating, Some(4.6));
        assert_eq!(item.review_count, 17);
        assert_eq!(item.tags, vec!["tea", "digestion"]);
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let csv = "id,title,description,price,in_stock\n\
                   1,Good,ginger,9.99,true\n\
                   ,No Id,turmeric,1.00,true\n\
                   3,Bad Price,turmeric,cheap,true\n\
                   4,Bad Stock,turmeric,2.00,maybe\n\
                   5,Also Good,turmeric,,\n";
        let items = parse(csv);
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "5"]);
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let csv = "id,title,description,slug\n7,Short Row\n";
        let items = parse(csv);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].slug, "");
    }

    #[test]
    fn test_missing_file_is_empty_catalog() {
        let path = Path::new("/nonexistent/catalog.csv");
        let catalog = load_catalog(path, &MatcherTables::default()).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_load_catalog_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,name,description,slug").unwrap();
        writeln!(file, "9,Reishi Calm,Reishi for stress,reishi-calm").unwrap();

        let catalog = load_catalog(file.path(), &MatcherTables::default()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].ingredients, vec!["reishi"]);
        assert_eq!(catalog[0].categories, vec!["stress_relief"]);
    }
}
