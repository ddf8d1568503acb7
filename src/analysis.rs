use serde::Serialize;

use crate::catalog::record::format_eur;
use crate::catalog::ProductRecord;

/// Price buckets in display order. Upper bounds are exclusive, in minor units.
const BUCKETS: &[(&str, Option<i64>)] = &[
    ("Under €20", Some(2_000)),
    ("€20-50", Some(5_000)),
    ("€50-100", Some(10_000)),
    ("€100-200", Some(20_000)),
    ("Over €200", None),
];
const NO_PRICE: &str = "No price";

#[derive(Debug, Clone, Serialize)]
pub struct PriceRange {
    pub label: &'static str,
    pub sequences: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceStats {
    pub priced: usize,
    pub total_minor: i64,
    pub average_minor: i64,
    pub min_minor: i64,
    pub max_minor: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceAnalysis {
    pub ranges: Vec<PriceRange>,
    pub stats: PriceStats,
}

pub fn analyze(products: &[ProductRecord]) -> PriceAnalysis {
    let mut ranges: Vec<PriceRange> = BUCKETS
        .iter()
        .map(|&(label, _)| PriceRange {
            label,
            sequences: Vec::new(),
        })
        .chain(std::iter::once(PriceRange {
            label: NO_PRICE,
            sequences: Vec::new(),
        }))
        .collect();

    for p in products {
        let idx = match p.price_minor {
            None => BUCKETS.len(),
            Some(minor) => BUCKETS
                .iter()
                .position(|(_, upper)| upper.map_or(true, |u| minor < u))
                .unwrap_or(BUCKETS.len() - 1),
        };
        ranges[idx].sequences.push(p.sequence);
    }

    PriceAnalysis {
        ranges,
        stats: price_stats(products),
    }
}

pub fn price_stats(products: &[ProductRecord]) -> PriceStats {
    let prices: Vec<i64> = products.iter().filter_map(|p| p.price_minor).collect();
    if prices.is_empty() {
        return PriceStats::default();
    }
    let total: i128 = prices.iter().map(|&p| i128::from(p)).sum();
    PriceStats {
        priced: prices.len(),
        total_minor: saturate(total),
        average_minor: (total as f64 / prices.len() as f64).round() as i64,
        min_minor: prices.iter().copied().min().unwrap_or(0),
        max_minor: prices.iter().copied().max().unwrap_or(0),
    }
}

/// Clamp a minor-unit sum back into `i64`.
pub fn saturate(total: i128) -> i64 {
    i64::try_from(total).unwrap_or(if total < 0 { i64::MIN } else { i64::MAX })
}

pub fn print_report(products: &[ProductRecord], analysis: &PriceAnalysis) {
    println!("{}", "=".repeat(100));
    println!("CATALOG PRICE ANALYSIS");
    println!("{}", "=".repeat(100));
    println!("\nTotal products found: {}\n", products.len());

    println!("Prices by range:");
    for range in analysis.ranges.iter().filter(|r| !r.sequences.is_empty()) {
        println!("  {}: {} products", range.label, range.sequences.len());
    }

    println!("\n{}", "-".repeat(100));
    println!("Detailed product list:\n");
    for p in products {
        let price = p
            .price_minor
            .map(format_eur)
            .unwrap_or_else(|| "NO PRICE".into());
        let cents = p
            .price_minor
            .map(|c| format!("{}¢", c))
            .unwrap_or_else(|| "-".into());
        let qty = p
            .quantity
            .map(|q| format!("Qty: {}", q))
            .unwrap_or_else(|| "NO QTY".into());
        let status = p.status.as_deref().unwrap_or("NO STATUS");
        println!(
            "{:>3}. {:<50} | {:>10} ({:>7}) | {:>8} | {:<10}",
            p.sequence,
            crate::truncate(&p.name, 50),
            price,
            cents,
            qty,
            status
        );
    }

    let s = &analysis.stats;
    println!("\nPrice statistics ({} priced):", s.priced);
    println!("  Total value (all rented 1x): {}", format_eur(s.total_minor));
    println!("  Average price:               {}", format_eur(s.average_minor));
    println!("  Min price:                   {}", format_eur(s.min_minor));
    println!("  Max price:                   {}", format_eur(s.max_minor));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fields::FieldLabels;
    use crate::catalog::parse_catalog;

    fn priced(seq: usize, major: Option<f64>) -> ProductRecord {
        let mut p = ProductRecord::new(seq, Some(seq as u32), seq, "Item");
        if let Some(m) = major {
            p.set_price(m);
        }
        p
    }

    fn bucket<'a>(a: &'a PriceAnalysis, label: &str) -> &'a [usize] {
        &a.ranges.iter().find(|r| r.label == label).unwrap().sequences
    }

    #[test]
    fn bucket_boundaries() {
        let products = vec![
            priced(1, Some(19.99)),
            priced(2, Some(20.0)),
            priced(3, Some(49.99)),
            priced(4, Some(50.0)),
            priced(5, Some(100.0)),
            priced(6, Some(200.0)),
            priced(7, None),
        ];
        let a = analyze(&products);
        assert_eq!(bucket(&a, "Under €20"), &[1]);
        assert_eq!(bucket(&a, "€20-50"), &[2, 3]);
        assert_eq!(bucket(&a, "€50-100"), &[4]);
        assert_eq!(bucket(&a, "€100-200"), &[5]);
        assert_eq!(bucket(&a, "Over €200"), &[6]);
        assert_eq!(bucket(&a, "No price"), &[7]);
    }

    #[test]
    fn all_buckets_present_even_when_empty() {
        let a = analyze(&[]);
        assert_eq!(a.ranges.len(), 6);
        assert!(a.ranges.iter().all(|r| r.sequences.is_empty()));
        assert_eq!(a.stats, PriceStats::default());
    }

    #[test]
    fn large_prices_do_not_overflow_the_total() {
        let products = vec![priced(1, Some(9e16)), priced(2, Some(9e16))];
        let s = price_stats(&products);
        assert_eq!(s.priced, 2);
        assert_eq!(s.total_minor, i64::MAX);
        assert_eq!(s.average_minor, 9_000_000_000_000_000_000);
        assert_eq!(s.max_minor, 9_000_000_000_000_000_000);
    }

    #[test]
    fn fixture_statistics() {
        let md = std::fs::read_to_string("tests/fixtures/catalog.md").unwrap();
        let products = parse_catalog(&md, &FieldLabels::PORTUGUESE);
        let a = analyze(&products);
        assert_eq!(bucket(&a, "Under €20"), &[2, 6]);
        assert_eq!(bucket(&a, "€20-50"), &[1, 3]);
        assert_eq!(bucket(&a, "€100-200"), &[4]);
        assert_eq!(bucket(&a, "No price"), &[5]);
        assert_eq!(a.stats.priced, 5);
        assert_eq!(a.stats.total_minor, 19_079);
        assert_eq!(a.stats.average_minor, 3_816);
        assert_eq!(a.stats.min_minor, 0);
        assert_eq!(a.stats.max_minor, 12_000);
    }
}
