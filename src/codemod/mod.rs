pub mod walk;

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use tracing::warn;

/// Prisma models whose `create` calls must carry an explicit `id` and `updatedAt`.
pub const MODELS_NEEDING_ID: &[&str] = &[
    "category",
    "client",
    "subcategory",
    "catalogShare",
    "event",
    "fee",
    "partner",
    "jobReference",
    "service",
    "subrental",
    "cloudFolder",
    "cloudFile",
    "fileActivity",
    "fileShare",
    "fileTag",
    "tagDefinition",
    "batchOperation",
    "activityLog",
    "storageQuota",
    "notification",
    "notificationPreference",
    "dataSyncEvent",
    "translationJob",
    "translationHistory",
    "productTranslation",
    "categoryTranslation",
    "translationCache",
    "customization_settings",
];

const ID_LINE: &str = "\n        id: crypto.randomUUID(),";
const UPDATED_AT_LINE: &str = "\n        updatedAt: new Date(),";

static ID_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[\s{,])id\s*:").unwrap());
static UPDATED_AT_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[\s{,])updatedAt\s*:").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedField {
    Id,
    UpdatedAt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injection {
    pub model: String,
    pub field: InjectedField,
}

/// Compiled `prisma.<model>.create({ data: {` patterns.
pub struct CreateCallRewriter {
    patterns: Vec<(String, Regex)>,
}

impl CreateCallRewriter {
    pub fn new<S: AsRef<str>>(models: &[S]) -> Result<Self, regex::Error> {
        let patterns = models
            .iter()
            .map(|m| {
                let model = m.as_ref();
                let re = RegexBuilder::new(&format!(
                    r"prisma\.{}\.create\(\{{\s*data:\s*\{{",
                    regex::escape(model)
                ))
                .case_insensitive(true)
                .build()?;
                Ok((model.to_string(), re))
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { patterns })
    }

    /// Rewrite `source`, returning the new text and the injections made.
    ///
    /// Data objects that already declare a key are left alone; objects whose
    /// closing brace cannot be found are skipped.
    pub fn rewrite(&self, source: &str) -> (String, Vec<Injection>) {
        // (offset, text) pairs against the original source
        let mut edits: Vec<(usize, &'static str)> = Vec::new();
        let mut injections = Vec::new();

        for (model, re) in &self.patterns {
            for m in re.find_iter(source) {
                let open = m.end();
                let Some(close) = matching_brace(source, open) else {
                    warn!("Unbalanced data object for {}.create at byte {}", model, m.start());
                    continue;
                };
                let body = top_level(&source[open..close]);
                let needs_id = !ID_KEY_RE.is_match(&body);
                let needs_updated_at = !UPDATED_AT_KEY_RE.is_match(&body);

                // Same-offset edits land in reverse order, so push updatedAt first
                if needs_updated_at {
                    edits.push((close, UPDATED_AT_LINE));
                }
                if needs_id {
                    edits.push((open, ID_LINE));
                    injections.push(Injection {
                        model: model.clone(),
                        field: InjectedField::Id,
                    });
                }
                if needs_updated_at {
                    injections.push(Injection {
                        model: model.clone(),
                        field: InjectedField::UpdatedAt,
                    });
                }
            }
        }

        if edits.is_empty() {
            return (source.to_string(), injections);
        }

        // Apply back to front so earlier offsets stay valid
        edits.sort_by(|a, b| b.0.cmp(&a.0));
        let mut out = source.to_string();
        for (offset, text) in edits {
            out.insert_str(offset, text);
        }
        (out, injections)
    }
}

/// The object body with every nested `{...}` span blanked out, so only
/// its own keys remain visible.
fn top_level(body: &str) -> String {
    let mut depth = 0usize;
    body.chars()
        .map(|c| match c {
            '{' => {
                depth += 1;
                ' '
            }
            '}' => {
                depth = depth.saturating_sub(1);
                ' '
            }
            _ if depth > 0 => ' ',
            _ => c,
        })
        .collect()
}

/// Byte offset of the `}` closing the object whose body starts at `start`.
fn matching_brace(source: &str, start: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (i, b) in source.as_bytes()[start..].iter().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + i);
                }
            }
            _ => {}
        }
    }
    None
}
