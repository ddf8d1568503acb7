use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::record::{format_eur, to_minor};
use crate::catalog::ProductRecord;

/// A product as exported from the application database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceProduct {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub daily_rate: Option<f64>,
    #[serde(default)]
    pub quantity: Option<u32>,
}

impl ReferenceProduct {
    fn price_minor(&self) -> Option<i64> {
        self.daily_rate.and_then(to_minor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum Discrepancy {
    Price { catalog: i64, reference: i64 },
    Quantity { catalog: u32, reference: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Matched {
        reference_name: String,
        discrepancies: Vec<Discrepancy>,
    },
    MissingInReference,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogComparison {
    pub sequence: usize,
    pub name: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone)]
pub struct Comparison {
    pub rows: Vec<CatalogComparison>,
    pub missing_in_catalog: Vec<ReferenceProduct>,
}

impl Comparison {
    pub fn mismatches(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(&r.outcome, Outcome::Matched { discrepancies, .. } if !discrepancies.is_empty()))
            .count()
    }

    pub fn missing_in_reference(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.outcome == Outcome::MissingInReference)
            .count()
    }
}

pub fn load_reference_json(path: &Path) -> Result<Vec<ReferenceProduct>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read reference {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid product export {}", path.display()))
}

/// Pair each catalog record with a reference product, by id first and by
/// normalized name otherwise. Each reference product is used at most once.
pub fn compare(products: &[ProductRecord], reference: &[ReferenceProduct]) -> Comparison {
    let mut used = vec![false; reference.len()];
    let mut rows = Vec::with_capacity(products.len());

    for p in products {
        let by_id = p.id.as_deref().and_then(|id| {
            (0..reference.len()).find(|&i| !used[i] && reference[i].id.as_deref() == Some(id))
        });
        let key = normalize_name(&p.name);
        let found = by_id.or_else(|| {
            (0..reference.len()).find(|&i| !used[i] && normalize_name(&reference[i].name) == key)
        });

        let outcome = match found {
            Some(idx) => {
                used[idx] = true;
                let r = &reference[idx];
                Outcome::Matched {
                    reference_name: r.name.clone(),
                    discrepancies: discrepancies(p, r),
                }
            }
            None => Outcome::MissingInReference,
        };
        rows.push(CatalogComparison {
            sequence: p.sequence,
            name: p.name.clone(),
            outcome,
        });
    }

    let missing_in_catalog = reference
        .iter()
        .zip(&used)
        .filter(|&(_, &u)| !u)
        .map(|(r, _)| r.clone())
        .collect();

    Comparison {
        rows,
        missing_in_catalog,
    }
}

/// Fields are only compared when both sides carry a value.
fn discrepancies(p: &ProductRecord, r: &ReferenceProduct) -> Vec<Discrepancy> {
    let mut out = Vec::new();
    if let (Some(catalog), Some(reference)) = (p.price_minor, r.price_minor()) {
        if catalog != reference {
            out.push(Discrepancy::Price { catalog, reference });
        }
    }
    if let (Some(catalog), Some(reference)) = (p.quantity, r.quantity) {
        if catalog != reference {
            out.push(Discrepancy::Quantity { catalog, reference });
        }
    }
    out
}

fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn print_report(c: &Comparison) {
    println!(
        "{:>3} | {:<40} | {:<18} | {}",
        "#", "Product", "Result", "Details"
    );
    println!("{}", "-".repeat(100));
    for row in &c.rows {
        let (result, details) = match &row.outcome {
            Outcome::MissingInReference => ("missing in ref", String::new()),
            Outcome::Matched { discrepancies, .. } if discrepancies.is_empty() => {
                ("ok", String::new())
            }
            Outcome::Matched { discrepancies, .. } => {
                let parts: Vec<String> = discrepancies
                    .iter()
                    .map(|d| match d {
                        Discrepancy::Price { catalog, reference } => format!(
                            "price {} vs {}",
                            format_eur(*catalog),
                            format_eur(*reference)
                        ),
                        Discrepancy::Quantity { catalog, reference } => {
                            format!("qty {} vs {}", catalog, reference)
                        }
                    })
                    .collect();
                ("MISMATCH", parts.join("; "))
            }
        };
        println!(
            "{:>3} | {:<40} | {:<18} | {}",
            row.sequence,
            crate::truncate(&row.name, 40),
            result,
            details
        );
    }

    if !c.missing_in_catalog.is_empty() {
        println!("\n--- Not in catalog ---");
        for r in &c.missing_in_catalog {
            println!("  {} ({})", r.name, r.id.as_deref().unwrap_or("-"));
        }
    }

    println!(
        "\n{} compared | {} mismatched | {} missing in reference | {} missing in catalog",
        c.rows.len(),
        c.mismatches(),
        c.missing_in_reference(),
        c.missing_in_catalog.len()
    );
}
