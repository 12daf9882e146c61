use std::collections::HashMap;

use tracing::debug;

use crate::classify::FileClassifier;
use crate::metrics::DerivedTable;
use crate::rows::{merge_row, OutputRow, RowKey};

const MFI_SUFFIX: &str = " MFI";

/// Normalizes a marker name so Frequency and MFI panels of the same marker share a
/// row key. Applied until the name stops changing, so it is idempotent.
pub fn sanitize_marker(marker: &str) -> String {
    let mut current = marker.to_string();
    loop {
        let next = sanitize_step(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn sanitize_step(marker: &str) -> String {
    if let Some(stripped) = marker.strip_suffix('+') {
        stripped.to_string()
    } else if let Some(stripped) = marker.strip_suffix(MFI_SUFFIX) {
        stripped.to_string()
    } else {
        marker.trim().to_string()
    }
}

/// Rows unique by [`RowKey`], iterated in first-insertion order.
#[derive(Debug, Clone, Default)]
pub struct RowSet {
    rows: Vec<OutputRow>,
    index: HashMap<RowKey, usize>,
}

impl RowSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a row, merging it over an existing row with the same key.
    pub fn insert(&mut self, row: OutputRow) {
        match self.index.get(&row.key) {
            Some(&idx) => {
                let older = std::mem::replace(&mut self.rows[idx], OutputRow::new(row.key.clone(), ""));
                self.rows[idx] = merge_row(older, row);
            }
            None => {
                self.index.insert(row.key.clone(), self.rows.len());
                self.rows.push(row);
            }
        }
    }

    pub fn get(&self, key: &RowKey) -> Option<&OutputRow> {
        self.index.get(key).map(|&idx| &self.rows[idx])
    }

    pub fn get_mut(&mut self, key: &RowKey) -> Option<&mut OutputRow> {
        match self.index.get(key) {
            Some(&idx) => self.rows.get_mut(idx),
            None => None,
        }
    }

    pub fn contains(&self, key: &RowKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutputRow> {
        self.rows.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut OutputRow> {
        self.rows.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<OutputRow> {
        self.rows
    }
}

impl FromIterator<OutputRow> for RowSet {
    fn from_iter<I: IntoIterator<Item = OutputRow>>(iter: I) -> Self {
        let mut set = RowSet::new();
        for row in iter {
            set.insert(row);
        }
        set
    }
}

/// Flattens derived tables, in input order, into one keyed row set.
pub fn combine_tables(tables: &[DerivedTable], classifier: &FileClassifier) -> RowSet {
    let mut combined = RowSet::new();

    for table in tables {
        let cell_type = classifier.cell_type(&table.file_name);
        debug!(
            file = %table.file_name,
            cell_type = %cell_type,
            panel = %table.panel,
            records = table.records.len(),
            "combining derived table"
        );

        for record in &table.records {
            let key = RowKey::new(
                cell_type.canonical_name(),
                record.donor.as_str(),
                sanitize_marker(&record.marker),
                record.peptide.as_str(),
            );
            let row = OutputRow::new(key, table.file_name.as_str()).with_bundle(table.panel, record.bundle);
            combined.insert(row);
        }
    }

    combined
}
