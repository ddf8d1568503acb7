use std::sync::LazyLock;

use clap::ValueEnum;
use regex::Regex;

use super::record::to_minor;

static BACKTICK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());
static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"€\s*(\d+(?:\.\d+)?)").unwrap());
static INT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    Price,
    Quantity,
    Status,
    Location,
}

const ALL_FIELDS: [Field; 5] = [
    Field::Id,
    Field::Price,
    Field::Quantity,
    Field::Status,
    Field::Location,
];

/// Label text of each labeled field, as written inside `**...:**`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLabels {
    pub id: &'static str,
    pub price: &'static str,
    pub quantity: &'static str,
    pub status: &'static str,
    pub location: &'static str,
}

impl FieldLabels {
    pub const PORTUGUESE: FieldLabels = FieldLabels {
        id: "ID",
        price: "Taxa Diária",
        quantity: "Quantidade Disponível",
        status: "Status",
        location: "Localização",
    };

    pub const ENGLISH: FieldLabels = FieldLabels {
        id: "ID",
        price: "Daily Rate",
        quantity: "Available Quantity",
        status: "Status",
        location: "Location",
    };

    fn label(&self, field: Field) -> &'static str {
        match field {
            Field::Id => self.id,
            Field::Price => self.price,
            Field::Quantity => self.quantity,
            Field::Status => self.status,
            Field::Location => self.location,
        }
    }
}

impl Default for FieldLabels {
    fn default() -> Self {
        FieldLabels::PORTUGUESE
    }
}

/// Label preset selectable from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LabelSet {
    #[default]
    Pt,
    En,
}

impl LabelSet {
    pub fn labels(self) -> FieldLabels {
        match self {
            LabelSet::Pt => FieldLabels::PORTUGUESE,
            LabelSet::En => FieldLabels::ENGLISH,
        }
    }
}

/// Precomputed field markers for one label set.
///
/// Each field accepts both `**Label:**` and `**Label**:`.
pub struct FieldMatcher {
    markers: Vec<(Field, [String; 2])>,
}

impl FieldMatcher {
    pub fn new(labels: &FieldLabels) -> Self {
        let markers = ALL_FIELDS
            .iter()
            .map(|&field| {
                let label = labels.label(field);
                (field, [format!("**{}:**", label), format!("**{}**:", label)])
            })
            .collect();
        Self { markers }
    }

    /// Every labeled field present on `line`, paired with the text after its marker.
    pub fn fields<'a>(&'a self, line: &'a str) -> impl Iterator<Item = (Field, &'a str)> + 'a {
        self.markers.iter().filter_map(move |(field, variants)| {
            variants.iter().find_map(|marker| {
                line.find(marker.as_str())
                    .map(|pos| (*field, &line[pos + marker.len()..]))
            })
        })
    }
}

pub fn extract_id(value: &str) -> Option<String> {
    BACKTICK_RE.captures(value).map(|c| c[1].to_string())
}

/// Decimal amount after the `€` marker. Amounts too large to count in
/// cents are treated as malformed.
pub fn extract_price(value: &str) -> Option<f64> {
    PRICE_RE
        .captures(value)
        .and_then(|c| c[1].parse::<f64>().ok())
        .filter(|&major| to_minor(major).is_some())
}

pub fn extract_quantity(value: &str) -> Option<u32> {
    INT_RE
        .find(value)
        .and_then(|m| m.as_str().parse::<u32>().ok())
}

pub fn extract_status(value: &str) -> Option<String> {
    WORD_RE.find(value).map(|m| m.as_str().to_string())
}

pub fn extract_location(value: &str) -> Option<String> {
    let loc = value.trim();
    if loc.is_empty() {
        None
    } else {
        Some(loc.to_string())
    }
}
