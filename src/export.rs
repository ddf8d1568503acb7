use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::analysis::{PriceAnalysis, PriceStats};
use crate::catalog::ProductRecord;
use crate::compare::{CatalogComparison, Comparison, ReferenceProduct};
use crate::verify::Verification;

pub const ANALYSIS_FILE: &str = "CATALOG_PRICES_ANALYSIS.json";
pub const VERIFICATION_FILE: &str = "PRODUCT_DATA_COMPLETE.json";
pub const COMPARISON_FILE: &str = "CATALOG_PRICES.json";

#[derive(Serialize)]
pub struct AnalysisExport<'a> {
    pub generated_at: DateTime<Utc>,
    pub total_products: usize,
    pub price_ranges: Vec<RangeCount>,
    pub statistics: &'a PriceStats,
    pub products: &'a [ProductRecord],
}

#[derive(Serialize)]
pub struct RangeCount {
    pub range: &'static str,
    pub count: usize,
}

impl<'a> AnalysisExport<'a> {
    pub fn new(products: &'a [ProductRecord], analysis: &'a PriceAnalysis) -> Self {
        Self {
            generated_at: Utc::now(),
            total_products: products.len(),
            price_ranges: analysis
                .ranges
                .iter()
                .map(|r| RangeCount {
                    range: r.label,
                    count: r.sequences.len(),
                })
                .collect(),
            statistics: &analysis.stats,
            products,
        }
    }
}

#[derive(Serialize)]
pub struct VerificationExport<'a> {
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub products: &'a [ProductRecord],
    pub issues_summary: BTreeMap<&'static str, usize>,
    pub issues_detail: BTreeMap<&'static str, &'a [usize]>,
}

impl<'a> VerificationExport<'a> {
    pub fn new(products: &'a [ProductRecord], v: &'a Verification) -> Self {
        Self {
            generated_at: Utc::now(),
            total: v.total,
            products,
            issues_summary: v
                .issues
                .iter()
                .map(|i| (i.kind.as_str(), i.sequences.len()))
                .collect(),
            issues_detail: v
                .issues
                .iter()
                .map(|i| (i.kind.as_str(), i.sequences.as_slice()))
                .collect(),
        }
    }
}

#[derive(Serialize)]
pub struct ComparisonExport<'a> {
    pub generated_at: DateTime<Utc>,
    pub compared: usize,
    pub mismatched: usize,
    pub missing_in_reference: usize,
    pub rows: &'a [CatalogComparison],
    pub missing_in_catalog: &'a [ReferenceProduct],
}

impl<'a> ComparisonExport<'a> {
    pub fn new(c: &'a Comparison) -> Self {
        Self {
            generated_at: Utc::now(),
            compared: c.rows.len(),
            mismatched: c.mismatches(),
            missing_in_reference: c.missing_in_reference(),
            rows: &c.rows,
            missing_in_catalog: &c.missing_in_catalog,
        }
    }
}

/// Pretty-printed JSON, UTF-8 kept as-is.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Exported {}", path.display());
    Ok(())
}
