use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{NormalizedRow, RawRow};

/// Substrings marking instrument-generated summary rows.
pub const DEFAULT_NOISE_MARKERS: [&str; 3] = ["Comp", "SD", "Mean"];

/// How the trailing file extension is removed from the condition part of a key.
///
/// Instrument exports name samples after their `.fcs` files, so the default strips
/// exactly four characters. Keys with any other extension length come out wrong
/// under `FixedWidth(4)`; `Suffix` only strips an extension that is actually present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ExtensionRule {
    FixedWidth { width: usize },
    Suffix { suffix: String },
}

impl Default for ExtensionRule {
    fn default() -> Self {
        ExtensionRule::FixedWidth { width: 4 }
    }
}

impl ExtensionRule {
    pub fn strip<'a>(&self, value: &'a str) -> &'a str {
        match self {
            ExtensionRule::FixedWidth { width } => {
                let keep = value.chars().count().saturating_sub(*width);
                match value.char_indices().nth(keep) {
                    Some((byte_idx, _)) => &value[..byte_idx],
                    None => value,
                }
            }
            ExtensionRule::Suffix { suffix } => value.strip_suffix(suffix.as_str()).unwrap_or(value),
        }
    }
}

/// Filtering and key-splitting rules applied to every raw row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowNormalizer {
    noise_markers: Vec<String>,
    extension: ExtensionRule,
}

impl Default for RowNormalizer {
    fn default() -> Self {
        Self::new(
            DEFAULT_NOISE_MARKERS.iter().map(|m| m.to_string()).collect(),
            ExtensionRule::default(),
        )
    }
}

impl RowNormalizer {
    pub fn new(noise_markers: Vec<String>, extension: ExtensionRule) -> Self {
        Self {
            noise_markers,
            extension,
        }
    }

    pub fn is_noise(&self, key: &str) -> bool {
        self.noise_markers
            .iter()
            .any(|marker| key.contains(marker.as_str()))
    }

    /// Splits `<donor>_<condition><ext>` on the first underscore. Returns `None` when
    /// the key has no underscore or either part comes out empty.
    pub fn split_key<'a>(&self, key: &'a str) -> Option<(&'a str, &'a str)> {
        let (donor, rest) = key.split_once('_')?;
        let condition = self.extension.strip(rest);
        if donor.is_empty() || condition.is_empty() {
            return None;
        }
        Some((donor, condition))
    }

    pub fn normalize_row(&self, row: &RawRow) -> Option<NormalizedRow> {
        let key = row.key();
        if key.is_empty() || self.is_noise(key) {
            return None;
        }
        let (donor, condition) = self.split_key(key)?;
        Some(NormalizedRow {
            donor: donor.to_string(),
            condition: condition.to_string(),
            row: row.clone(),
        })
    }

    pub fn normalize(&self, rows: &[RawRow]) -> Vec<NormalizedRow> {
        let mut normalized = Vec::with_capacity(rows.len());
        for row in rows {
            match self.normalize_row(row) {
                Some(row) => normalized.push(row),
                None => debug!(key = row.key(), "dropped row"),
            }
        }
        normalized
    }
}

/// Distinct donors in first-seen order.
pub fn donors(rows: &[NormalizedRow]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for row in rows {
        if !seen.iter().any(|donor| *donor == row.donor) {
            seen.push(row.donor.clone());
        }
    }
    seen
}
