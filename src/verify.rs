use serde::Serialize;

use crate::analysis::saturate;
use crate::catalog::record::format_eur;
use crate::catalog::ProductRecord;

/// Products listed inline per issue before the list is elided.
const MAX_LISTED: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    NoId,
    NoPrice,
    ZeroPrice,
    NoQuantity,
    NoStatus,
    NoLocation,
    NumberingMismatch,
}

impl IssueKind {
    pub const ALL: [IssueKind; 7] = [
        IssueKind::NoId,
        IssueKind::NoPrice,
        IssueKind::ZeroPrice,
        IssueKind::NoQuantity,
        IssueKind::NoStatus,
        IssueKind::NoLocation,
        IssueKind::NumberingMismatch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IssueKind::NoId => "no_id",
            IssueKind::NoPrice => "no_price",
            IssueKind::ZeroPrice => "zero_price",
            IssueKind::NoQuantity => "no_quantity",
            IssueKind::NoStatus => "no_status",
            IssueKind::NoLocation => "no_location",
            IssueKind::NumberingMismatch => "numbering_mismatch",
        }
    }

    fn applies(self, p: &ProductRecord) -> bool {
        match self {
            IssueKind::NoId => p.id.is_none(),
            IssueKind::NoPrice => p.price_minor.is_none(),
            IssueKind::ZeroPrice => p.price_minor == Some(0),
            IssueKind::NoQuantity => p.quantity.is_none(),
            IssueKind::NoStatus => p.status.is_none(),
            IssueKind::NoLocation => p.location.is_none(),
            IssueKind::NumberingMismatch => p.ordinal != u32::try_from(p.sequence).ok(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub sequences: Vec<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Verification {
    pub total: usize,
    pub issues: Vec<Issue>,
}

impl Verification {
    pub fn get(&self, kind: IssueKind) -> &[usize] {
        self.issues
            .iter()
            .find(|i| i.kind == kind)
            .map(|i| i.sequences.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_clean(&self) -> bool {
        self.issues.iter().all(|i| i.sequences.is_empty())
    }
}

pub fn verify(products: &[ProductRecord]) -> Verification {
    let issues = IssueKind::ALL
        .iter()
        .map(|&kind| Issue {
            kind,
            sequences: products
                .iter()
                .filter(|p| kind.applies(p))
                .map(|p| p.sequence)
                .collect(),
        })
        .collect();
    Verification {
        total: products.len(),
        issues,
    }
}

pub fn print_report(products: &[ProductRecord], v: &Verification) {
    println!("{}", "=".repeat(120));
    println!("DETAILED PRICE & DATA VERIFICATION");
    println!("{}", "=".repeat(120));

    println!("\nData completeness check:\n");
    if v.is_clean() {
        println!("  All {} products have every field.", v.total);
    }
    for issue in &v.issues {
        let name = issue.kind.as_str();
        if issue.sequences.is_empty() {
            println!("  OK   {}: all products ({}/{})", name, v.total, v.total);
            continue;
        }
        println!("  FAIL {}: {}/{} products", name, issue.sequences.len(), v.total);
        if issue.sequences.len() <= MAX_LISTED {
            let list: Vec<String> = issue.sequences.iter().map(|s| format!("#{}", s)).collect();
            println!("       Products: {}", list.join(", "));
        }
    }

    println!("\n{}", "-".repeat(120));
    println!("Complete product list:\n");
    for p in products {
        let price = p
            .price_minor
            .map(format_eur)
            .unwrap_or_else(|| "MISSING".into());
        let qty = p
            .quantity
            .map(|q| q.to_string())
            .unwrap_or_else(|| "MISSING".into());
        println!(
            "{:>3}. {:<50} | {:>10} | Q:{:>7} | {:<10} | {}",
            p.sequence,
            crate::truncate(&p.name, 50),
            price,
            qty,
            p.status.as_deref().unwrap_or("MISSING"),
            p.location.as_deref().unwrap_or("MISSING"),
        );
    }

    let valid: Vec<i64> = products
        .iter()
        .filter_map(|p| p.price_minor)
        .filter(|&m| m > 0)
        .collect();
    let total: i128 = valid.iter().map(|&m| i128::from(m)).sum();
    println!("\nPricing summary:");
    println!("  Total products:            {}", products.len());
    println!("  Products with valid price: {}", valid.len());
    if valid.is_empty() {
        println!("  No valid prices");
    } else {
        let avg = (total as f64 / valid.len() as f64).round() as i64;
        println!("  Average price:             {}", format_eur(avg));
    }
    println!("  Total daily revenue (1x):  {}", format_eur(saturate(total)));
}
