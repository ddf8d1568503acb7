pub mod fields;
pub mod record;

use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, info};

use fields::{Field, FieldLabels, FieldMatcher};
pub use record::ProductRecord;

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^####\s+(\d+)\.\s+(\S.*)$").unwrap());

/// Read the catalog document. The only fatal condition of a catalog pass.
pub fn read_catalog(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog {}", path.display()))
}

/// Read and parse in one step.
pub fn load_catalog(path: &Path, labels: &FieldLabels) -> Result<Vec<ProductRecord>> {
    let markdown = read_catalog(path)?;
    let products = parse_catalog(&markdown, labels);
    info!("Parsed {} products from {}", products.len(), path.display());
    Ok(products)
}

/// Single pass over the document: `#### N. Title` opens a record, labeled
/// field lines fill the open record, anything else is skipped.
pub fn parse_catalog(markdown: &str, labels: &FieldLabels) -> Vec<ProductRecord> {
    let matcher = FieldMatcher::new(labels);
    let mut products: Vec<ProductRecord> = Vec::new();
    let mut current: Option<ProductRecord> = None;

    for (idx, line) in markdown.lines().enumerate() {
        if let Some(caps) = HEADING_RE.captures(line.trim_end()) {
            if let Some(done) = current.take() {
                products.push(done);
            }
            let ordinal = caps[1].parse::<u32>().ok();
            current = Some(ProductRecord::new(
                products.len() + 1,
                ordinal,
                idx + 1,
                &caps[2],
            ));
            continue;
        }

        // Lines before the first heading belong to no product
        let Some(record) = current.as_mut() else {
            continue;
        };

        for (field, value) in matcher.fields(line) {
            apply_field(record, field, value);
        }
    }

    products.extend(current);
    products
}

fn apply_field(record: &mut ProductRecord, field: Field, value: &str) {
    match field {
        Field::Id => {
            if let Some(id) = fields::extract_id(value) {
                record.id = Some(id);
            }
        }
        Field::Price => match fields::extract_price(value) {
            Some(major) => {
                record.set_price(major);
            }
            None => debug!("No price on line for #{} {}", record.sequence, record.name),
        },
        Field::Quantity => {
            if let Some(qty) = fields::extract_quantity(value) {
                record.quantity = Some(qty);
            }
        }
        Field::Status => {
            if let Some(status) = fields::extract_status(value) {
                record.status = Some(status);
            }
        }
        Field::Location => {
            if let Some(loc) = fields::extract_location(value) {
                record.location = Some(loc);
            }
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Vec<ProductRecord> {
        let md = std::fs::read_to_string("tests/fixtures/catalog.md").unwrap();
        parse_catalog(&md, &FieldLabels::PORTUGUESE)
    }

    #[test]
    fn one_record_per_heading() {
        let products = fixture();
        assert_eq!(products.len(), 6);
        let seqs: Vec<usize> = products.iter().map(|p| p.sequence).collect();
        assert_eq!(seqs, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn studio_light_example() {
        let products = fixture();
        let p = &products[2];
        assert_eq!(p.sequence, 3);
        assert_eq!(p.name, "Studio Light");
        assert_eq!(p.price_major, Some(45.5));
        assert_eq!(p.price_minor, Some(4550));
    }

    #[test]
    fn missing_quantity_keeps_other_fields() {
        let p = &fixture()[2];
        assert_eq!(p.quantity, None);
        assert_eq!(p.id.as_deref(), Some("cmh-studio-light"));
        assert_eq!(p.status.as_deref(), Some("Disponível"));
        assert_eq!(p.location.as_deref(), Some("Armazém A"));
    }

    #[test]
    fn full_record() {
        let p = &fixture()[0];
        assert_eq!(p.name, "LED Panel 600");
        assert_eq!(p.id.as_deref(), Some("cmh-led-600"));
        assert_eq!(p.price_minor, Some(2500));
        assert_eq!(p.quantity, Some(4));
        assert_eq!(p.status.as_deref(), Some("Disponível"));
        assert_eq!(p.location.as_deref(), Some("Armazém A, Prateleira 2"));
        assert_eq!(p.line, 7);
    }

    #[test]
    fn unparseable_price_is_absent() {
        let p = &fixture()[4];
        assert_eq!(p.name, "Mixer 16ch");
        assert_eq!(p.price_major, None);
        assert_eq!(p.price_minor, None);
        assert_eq!(p.quantity, Some(1));
    }

    #[test]
    fn later_field_overwrites_earlier() {
        let md = "#### 1. Tripod\n- **Status:** Disponível\n- **Status:** Reservado\n";
        let products = parse_catalog(md, &FieldLabels::PORTUGUESE);
        assert_eq!(products[0].status.as_deref(), Some("Reservado"));
    }

    #[test]
    fn malformed_repeat_keeps_earlier_price() {
        let md = "#### 1. Tripod\n\
                  - **Taxa Diária:** €15.00\n\
                  - **Taxa Diária:** sob consulta\n\
                  #### 2. Stand\n\
                  - **Taxa Diária:** €99999999999999999999\n";
        let products = parse_catalog(md, &FieldLabels::PORTUGUESE);
        assert_eq!(products[0].price_minor, Some(1500));
        assert_eq!(products[0].price_major, Some(15.0));
        assert_eq!(products[1].price_major, None);
        assert_eq!(products[1].price_minor, None);
    }

    #[test]
    fn zero_price_is_present() {
        let p = &fixture()[5];
        assert_eq!(p.price_minor, Some(0));
        assert_eq!(p.price_major, Some(0.0));
    }

    #[test]
    fn ordinal_kept_separate_from_sequence() {
        let p = &fixture()[3];
        assert_eq!(p.sequence, 4);
        assert_eq!(p.ordinal, Some(5));
        assert_eq!(p.id, None);
        assert_eq!(p.location, None);
    }

    #[test]
    fn no_headings_yields_empty() {
        let md = "# Catálogo\n\n- **Taxa Diária:** €10\n- **Status:** Disponível\n";
        assert!(parse_catalog(md, &FieldLabels::PORTUGUESE).is_empty());
        assert!(parse_catalog("", &FieldLabels::PORTUGUESE).is_empty());
    }

    #[test]
    fn preamble_fields_do_not_leak() {
        let md = "**Status:** Rascunho\n#### 1. Tripod\n";
        let products = parse_catalog(md, &FieldLabels::PORTUGUESE);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].status, None);
    }

    #[test]
    fn other_heading_levels_are_not_products() {
        let md = "### 1. Section\n##### 2. Deep\n#### 3.Missing space\n#### 4. Real\n";
        let products = parse_catalog(md, &FieldLabels::PORTUGUESE);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Real");
        assert_eq!(products[0].sequence, 1);
    }

    #[test]
    fn heading_with_blank_title_is_ignored() {
        let md = "#### 1.    \n#### 2. Stand\n";
        let products = parse_catalog(md, &FieldLabels::PORTUGUESE);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Stand");
    }

    #[test]
    fn crlf_input() {
        let md = "#### 1. Tripod  \r\n- **Taxa Diária:** €9.99\r\n";
        let products = parse_catalog(md, &FieldLabels::PORTUGUESE);
        assert_eq!(products[0].name, "Tripod");
        assert_eq!(products[0].price_minor, Some(999));
    }

    #[test]
    fn price_minor_matches_major() {
        for p in fixture() {
            if let Some(major) = p.price_major {
                assert_eq!(p.price_minor, Some((major * 100.0).round() as i64));
            } else {
                assert_eq!(p.price_minor, None);
            }
        }
    }

    #[test]
    fn parsing_is_idempotent() {
        let md = std::fs::read_to_string("tests/fixtures/catalog.md").unwrap();
        let a = parse_catalog(&md, &FieldLabels::PORTUGUESE);
        let b = parse_catalog(&md, &FieldLabels::PORTUGUESE);
        assert_eq!(a, b);
    }

    #[test]
    fn unreadable_document_is_an_error() {
        let err = read_catalog(Path::new("tests/fixtures/does-not-exist.md")).unwrap_err();
        assert!(err.to_string().contains("does-not-exist.md"));
    }
}
