use std::collections::HashMap;

use immunoflux_parser::{decode_utf8, tokenize_records, HeaderRecord, ParserError, RowNormalizer};
use tracing::debug;

use crate::rows::FieldValue;

/// Cytokine measurements for one donor.
#[derive(Debug, Clone, PartialEq)]
pub struct CytokineFrequencyRow {
    pub donor: String,
    pub fields: Vec<(String, FieldValue)>,
}

impl CytokineFrequencyRow {
    fn new(donor: &str) -> Self {
        Self {
            donor: donor.to_string(),
            fields: Vec::new(),
        }
    }

    fn set(&mut self, name: &str, value: FieldValue) {
        match self.fields.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }
}

/// One row per donor, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CytokineTable {
    order: Vec<String>,
    rows: HashMap<String, CytokineFrequencyRow>,
}

impl CytokineTable {
    /// Reshapes header-keyed records into per-donor rows. The donor comes from the
    /// first column (the part before `_` for composite sample keys); every other named
    /// column with a value becomes a cytokine field. Later rows win per field.
    pub fn from_records(records: &[HeaderRecord], normalizer: &RowNormalizer) -> Self {
        let mut table = CytokineTable::default();

        for record in records {
            let Some(key) = record.first_value().map(str::trim) else {
                continue;
            };
            if key.is_empty() || normalizer.is_noise(key) {
                debug!(key, "dropped cytokine row");
                continue;
            }
            let donor = key.split_once('_').map(|(donor, _)| donor).unwrap_or(key);
            if donor.is_empty() {
                continue;
            }

            let row = table.ensure_donor(donor);
            for (name, value) in record.fields.iter().skip(1) {
                if name.is_empty() || value.trim().is_empty() {
                    continue;
                }
                row.set(name, FieldValue::parse(value));
            }
        }

        table
    }

    fn ensure_donor(&mut self, donor: &str) -> &mut CytokineFrequencyRow {
        if !self.rows.contains_key(donor) {
            self.order.push(donor.to_string());
        }
        self.rows
            .entry(donor.to_string())
            .or_insert_with(|| CytokineFrequencyRow::new(donor))
    }

    pub fn get(&self, donor: &str) -> Option<&CytokineFrequencyRow> {
        self.rows.get(donor)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CytokineFrequencyRow> {
        self.order.iter().map(move |donor| &self.rows[donor])
    }

    /// Folds another table in; its fields win on collision.
    pub fn merge(&mut self, other: CytokineTable) {
        let CytokineTable { order, mut rows } = other;
        for donor in order {
            if let Some(incoming) = rows.remove(&donor) {
                let row = self.ensure_donor(&donor);
                for (name, value) in incoming.fields {
                    row.set(&name, value);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

pub fn parse_cytokine_file(
    file_name: &str,
    contents: &[u8],
    normalizer: &RowNormalizer,
) -> Result<CytokineTable, ParserError> {
    let text = decode_utf8(file_name, contents)?;
    let records = tokenize_records(file_name, text)?;
    if records.is_empty() {
        return Err(ParserError::EmptyData {
            file: file_name.to_string(),
        });
    }
    Ok(CytokineTable::from_records(&records, normalizer))
}
