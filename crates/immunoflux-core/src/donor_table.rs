use std::collections::HashMap;

use immunoflux_parser::{HeaderRow, NormalizedRow};

/// Marker values for a single donor/condition, in header order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerValues {
    order: Vec<String>,
    values: HashMap<String, f64>,
}

impl MarkerValues {
    fn insert(&mut self, marker: &str, value: f64) {
        if !self.values.contains_key(marker) {
            self.order.push(marker.to_string());
        }
        self.values.insert(marker.to_string(), value);
    }

    pub fn get(&self, marker: &str) -> Option<f64> {
        self.values.get(marker).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.order
            .iter()
            .map(move |marker| (marker.as_str(), self.values[marker]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DonorEntry {
    condition_order: Vec<String>,
    conditions: HashMap<String, MarkerValues>,
}

impl DonorEntry {
    fn ensure_condition(&mut self, condition: &str) -> &mut MarkerValues {
        if !self.conditions.contains_key(condition) {
            self.condition_order.push(condition.to_string());
        }
        self.conditions.entry(condition.to_string()).or_default()
    }

    pub fn condition(&self, condition: &str) -> Option<&MarkerValues> {
        self.conditions.get(condition)
    }

    pub fn conditions(&self) -> impl Iterator<Item = (&str, &MarkerValues)> {
        self.condition_order
            .iter()
            .map(move |name| (name.as_str(), &self.conditions[name]))
    }
}

/// donor -> condition -> marker -> raw value for one source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DonorTable {
    pub file_name: String,
    donor_order: Vec<String>,
    donors: HashMap<String, DonorEntry>,
}

impl DonorTable {
    /// Builds the table from normalized rows. Markers come from the header by
    /// position; a repeated donor/condition row overwrites earlier values.
    pub fn build(file_name: &str, header: &HeaderRow, rows: &[NormalizedRow]) -> Self {
        let mut table = DonorTable {
            file_name: file_name.to_string(),
            ..Default::default()
        };

        for row in rows {
            let entry = table.ensure_donor(&row.donor);
            let values = entry.ensure_condition(&row.condition);
            for (idx, marker) in header.markers() {
                if let Some(field) = row.row.fields.get(idx) {
                    values.insert(marker, parse_value(field));
                }
            }
        }

        table
    }

    fn ensure_donor(&mut self, donor: &str) -> &mut DonorEntry {
        if !self.donors.contains_key(donor) {
            self.donor_order.push(donor.to_string());
        }
        self.donors.entry(donor.to_string()).or_default()
    }

    pub fn donor(&self, donor: &str) -> Option<&DonorEntry> {
        self.donors.get(donor)
    }

    pub fn donors(&self) -> impl Iterator<Item = (&str, &DonorEntry)> {
        self.donor_order
            .iter()
            .map(move |name| (name.as_str(), &self.donors[name]))
    }

    pub fn value(&self, donor: &str, condition: &str, marker: &str) -> Option<f64> {
        self.donors
            .get(donor)?
            .condition(condition)?
            .get(marker)
    }

    pub fn len(&self) -> usize {
        self.donor_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.donor_order.is_empty()
    }
}

/// Empty or non-numeric cells become NaN so the row survives with a missing value.
pub fn parse_value(field: &str) -> f64 {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}
