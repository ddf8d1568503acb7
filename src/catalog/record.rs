use serde::Serialize;

/// One product entry of the catalog.
///
/// Optional fields stay `None` when their line is missing or malformed, so
/// "absent" never collapses into zero or an empty string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    /// 1-based position among parsed products.
    pub sequence: usize,
    /// Number written in the heading itself (`#### 7. ...`).
    pub ordinal: Option<u32>,
    /// 1-based source line of the heading.
    pub line: usize,
    pub name: String,
    pub id: Option<String>,
    pub price_major: Option<f64>,
    pub price_minor: Option<i64>,
    pub quantity: Option<u32>,
    pub status: Option<String>,
    pub location: Option<String>,
}

impl ProductRecord {
    pub fn new(sequence: usize, ordinal: Option<u32>, line: usize, name: &str) -> Self {
        Self {
            sequence,
            ordinal,
            line,
            name: name.trim().to_string(),
            id: None,
            price_major: None,
            price_minor: None,
            quantity: None,
            status: None,
            location: None,
        }
    }

    /// Sets both price representations; minor units are rounded to the nearest cent.
    ///
    /// An amount with no `i64` minor-unit value leaves the record unchanged.
    pub fn set_price(&mut self, major: f64) -> bool {
        match to_minor(major) {
            Some(minor) => {
                self.price_major = Some(major);
                self.price_minor = Some(minor);
                true
            }
            None => false,
        }
    }
}

/// `round(major * 100)`, or `None` when that is not finite or overflows `i64`.
pub fn to_minor(major: f64) -> Option<i64> {
    let minor = (major * 100.0).round();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if minor.is_finite() && minor >= i64::MIN as f64 && minor < i64::MAX as f64 {
        Some(minor as i64)
    } else {
        None
    }
}

/// Formats minor units as `€12.34`.
pub fn format_eur(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{}€{}.{:02}", sign, abs / 100, abs % 100)
}
