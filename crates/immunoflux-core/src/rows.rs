use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::classify::PanelKind;
use crate::metrics::MetricBundle;

pub const CELL_TYPE_FIELD: &str = "cellType";
pub const DONOR_FIELD: &str = "donor";
pub const PEPTIDE_FIELD: &str = "peptide";
pub const MARKER_FIELD: &str = "marker";
pub const FILE_FIELD: &str = "file";

/// Derived field names per panel kind, in [`MetricBundle::values`] order.
pub const METRIC_FIELDS: [(PanelKind, [&str; 4]); 2] = [
    (
        PanelKind::Frequency,
        [
            "foldChangeFrequency",
            "deltaFrequency",
            "originalFrequency",
            "unstimulatedFrequency",
        ],
    ),
    (
        PanelKind::Mfi,
        ["foldChangeMFI", "deltaMFI", "originalMFI", "unstimulatedMFI"],
    ),
];

/// Field a blocked row's metric is copied into on its baseline row.
pub const ANTIBODY_FIELD_MAP: [(&str, &str); 8] = [
    ("foldChangeFrequency", "antibodyFoldChangeFrequency"),
    ("deltaFrequency", "antibodyDeltaFrequency"),
    ("originalFrequency", "antibodyOriginalFrequency"),
    ("unstimulatedFrequency", "antibodyUnstimulatedFrequency"),
    ("foldChangeMFI", "antibodyFoldChangeMFI"),
    ("deltaMFI", "antibodyDeltaMFI"),
    ("originalMFI", "antibodyOriginalMFI"),
    ("unstimulatedMFI", "antibodyUnstimulatedMFI"),
];

pub fn metric_field_names(kind: PanelKind) -> [&'static str; 4] {
    match kind {
        PanelKind::Frequency => METRIC_FIELDS[0].1,
        PanelKind::Mfi => METRIC_FIELDS[1].1,
    }
}

pub fn antibody_field_name(field: &str) -> Option<&'static str> {
    ANTIBODY_FIELD_MAP
        .iter()
        .find(|(source, _)| *source == field)
        .map(|(_, target)| *target)
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric when the text parses as a float, text otherwise.
    pub fn parse(text: &str) -> Self {
        match text.trim().parse::<f64>() {
            Ok(value) => FieldValue::Number(value),
            Err(_) => FieldValue::Text(text.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) => Some(*value),
            FieldValue::Text(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(value) => write!(f, "{value}"),
            FieldValue::Text(text) => f.write_str(text),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Number(value) if value.is_finite() => serializer.serialize_f64(*value),
            FieldValue::Number(_) => serializer.serialize_none(),
            FieldValue::Text(text) => serializer.serialize_str(text),
        }
    }
}

/// Identity of an output record. Unique across the final row list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey {
    pub cell_type: String,
    pub donor: String,
    pub marker: String,
    pub peptide: String,
}

impl RowKey {
    pub fn new(
        cell_type: impl Into<String>,
        donor: impl Into<String>,
        marker: impl Into<String>,
        peptide: impl Into<String>,
    ) -> Self {
        Self {
            cell_type: cell_type.into(),
            donor: donor.into(),
            marker: marker.into(),
            peptide: peptide.into(),
        }
    }

    /// Key of the antibody-blocked row for the same cell type, donor and marker.
    pub fn blocked_counterpart(&self, blocked_suffix: &str) -> RowKey {
        RowKey {
            peptide: format!("{}{}", self.peptide, blocked_suffix),
            ..self.clone()
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.cell_type, self.donor, self.marker, self.peptide
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub key: RowKey,
    pub file: String,
    pub frequency: Option<MetricBundle>,
    pub mfi: Option<MetricBundle>,
    pub antibody_frequency: Option<MetricBundle>,
    pub antibody_mfi: Option<MetricBundle>,
    pub cytokines: Vec<(String, FieldValue)>,
}

impl OutputRow {
    pub fn new(key: RowKey, file: impl Into<String>) -> Self {
        Self {
            key,
            file: file.into(),
            frequency: None,
            mfi: None,
            antibody_frequency: None,
            antibody_mfi: None,
            cytokines: Vec::new(),
        }
    }

    pub fn with_bundle(mut self, kind: PanelKind, bundle: MetricBundle) -> Self {
        *self.bundle_mut(kind) = Some(bundle);
        self
    }

    pub fn bundle(&self, kind: PanelKind) -> Option<&MetricBundle> {
        match kind {
            PanelKind::Frequency => self.frequency.as_ref(),
            PanelKind::Mfi => self.mfi.as_ref(),
        }
    }

    pub fn bundle_mut(&mut self, kind: PanelKind) -> &mut Option<MetricBundle> {
        match kind {
            PanelKind::Frequency => &mut self.frequency,
            PanelKind::Mfi => &mut self.mfi,
        }
    }

    pub fn antibody_bundle(&self, kind: PanelKind) -> Option<&MetricBundle> {
        match kind {
            PanelKind::Frequency => self.antibody_frequency.as_ref(),
            PanelKind::Mfi => self.antibody_mfi.as_ref(),
        }
    }

    pub fn antibody_bundle_mut(&mut self, kind: PanelKind) -> &mut Option<MetricBundle> {
        match kind {
            PanelKind::Frequency => &mut self.antibody_frequency,
            PanelKind::Mfi => &mut self.antibody_mfi,
        }
    }

    /// Adds or replaces a cytokine field, keeping first-seen position.
    pub fn set_cytokine(&mut self, name: &str, value: FieldValue) {
        match self.cytokines.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.cytokines.push((name.to_string(), value)),
        }
    }

    /// Flat record view with the field names used by downstream consumers.
    pub fn fields(&self) -> Vec<(String, FieldValue)> {
        let mut fields: Vec<(String, FieldValue)> = vec![
            (CELL_TYPE_FIELD.to_string(), FieldValue::Text(self.key.cell_type.clone())),
            (DONOR_FIELD.to_string(), FieldValue::Text(self.key.donor.clone())),
            (PEPTIDE_FIELD.to_string(), FieldValue::Text(self.key.peptide.clone())),
            (MARKER_FIELD.to_string(), FieldValue::Text(self.key.marker.clone())),
            (FILE_FIELD.to_string(), FieldValue::Text(self.file.clone())),
        ];

        for kind in PanelKind::ALL {
            if let Some(bundle) = self.bundle(kind) {
                for (name, value) in metric_field_names(kind).iter().zip(bundle.values()) {
                    fields.push((name.to_string(), FieldValue::Number(value)));
                }
            }
        }

        for kind in PanelKind::ALL {
            if let Some(bundle) = self.antibody_bundle(kind) {
                for (name, value) in metric_field_names(kind).iter().zip(bundle.values()) {
                    if let Some(target) = antibody_field_name(name) {
                        fields.push((target.to_string(), FieldValue::Number(value)));
                    }
                }
            }
        }

        for (name, value) in &self.cytokines {
            match fields.iter_mut().find(|(existing, _)| existing == name) {
                Some((_, slot)) => *slot = value.clone(),
                None => fields.push((name.clone(), value.clone())),
            }
        }

        fields
    }

    pub fn field(&self, name: &str) -> Option<FieldValue> {
        self.fields()
            .into_iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }
}

impl Serialize for OutputRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self.fields();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (name, value) in &fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Shallow merge of two rows sharing a key: every field present on `newer`
/// replaces the one on `older`; fields only on `older` are kept.
pub fn merge_row(older: OutputRow, newer: OutputRow) -> OutputRow {
    let mut merged = OutputRow {
        key: newer.key,
        file: newer.file,
        frequency: newer.frequency.or(older.frequency),
        mfi: newer.mfi.or(older.mfi),
        antibody_frequency: newer.antibody_frequency.or(older.antibody_frequency),
        antibody_mfi: newer.antibody_mfi.or(older.antibody_mfi),
        cytokines: older.cytokines,
    };
    for (name, value) in newer.cytokines {
        merged.set_cytokine(&name, value);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> RowKey {
        RowKey::new("Monocytes", "D1", "CD14", "Flu")
    }

    #[test]
    fn merge_prefers_newer_fields_and_keeps_older_ones() {
        let older = OutputRow::new(key(), "a.csv")
            .with_bundle(PanelKind::Frequency, MetricBundle::derive(2.0, Some(1.0)))
            .with_bundle(PanelKind::Mfi, MetricBundle::derive(9.0, Some(3.0)));
        let newer = OutputRow::new(key(), "b.csv")
            .with_bundle(PanelKind::Frequency, MetricBundle::derive(8.0, Some(2.0)));

        let merged = merge_row(older, newer);
        assert_eq!(merged.file, "b.csv");
        assert_eq!(merged.frequency.map(|b| b.fold_change), Some(4.0));
        assert_eq!(merged.mfi.map(|b| b.fold_change), Some(3.0));
    }

    #[test]
    fn fields_use_fixed_names_and_cytokines_override() {
        let mut row = OutputRow::new(key(), "a.csv")
            .with_bundle(PanelKind::Mfi, MetricBundle::derive(9.0, Some(3.0)));
        row.antibody_mfi = Some(MetricBundle::derive(6.0, Some(3.0)));
        row.set_cytokine("donor", FieldValue::Text("override".into()));
        row.set_cytokine("IFNg", FieldValue::Number(0.4));

        let names: Vec<_> = row.fields().into_iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec![
                "cellType",
                "donor",
                "peptide",
                "marker",
                "file",
                "foldChangeMFI",
                "deltaMFI",
                "originalMFI",
                "unstimulatedMFI",
                "antibodyFoldChangeMFI",
                "antibodyDeltaMFI",
                "antibodyOriginalMFI",
                "antibodyUnstimulatedMFI",
                "IFNg",
            ]
        );
        assert_eq!(
            row.field("donor"),
            Some(FieldValue::Text("override".to_string()))
        );
        assert_eq!(row.field("antibodyFoldChangeMFI"), Some(FieldValue::Number(2.0)));
    }

    #[test]
    fn undefined_metrics_serialize_as_null() {
        let row = OutputRow::new(key(), "a.csv")
            .with_bundle(PanelKind::Frequency, MetricBundle::derive(2.0, None));
        let json = serde_json::to_value(&row).expect("serialize row");
        assert!(json["foldChangeFrequency"].is_null());
        assert_eq!(json["originalFrequency"], 2.0);
        assert_eq!(json["cellType"], "Monocytes");
    }

    #[test]
    fn blocked_counterpart_appends_suffix() {
        let blocked = key().blocked_counterpart(" + aIFNy");
        assert_eq!(blocked.peptide, "Flu + aIFNy");
        assert_eq!(blocked.marker, "CD14");
    }
}
