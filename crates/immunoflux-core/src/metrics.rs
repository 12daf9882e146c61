use serde::Serialize;
use tracing::warn;

use crate::classify::PanelKind;
use crate::donor_table::DonorTable;

/// Stimulated value relative to the donor's unstimulated baseline.
///
/// Values are carried at full precision. A missing baseline leaves `fold_change`,
/// `delta` and `unstimulated` as NaN; a zero baseline yields an infinite or NaN
/// fold change. Neither case is an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricBundle {
    pub fold_change: f64,
    pub delta: f64,
    pub original: f64,
    pub unstimulated: f64,
}

impl MetricBundle {
    pub fn derive(original: f64, baseline: Option<f64>) -> Self {
        let unstimulated = baseline.unwrap_or(f64::NAN);
        Self {
            fold_change: original / unstimulated,
            delta: original - unstimulated,
            original,
            unstimulated,
        }
    }

    pub fn has_baseline(&self) -> bool {
        !self.unstimulated.is_nan()
    }

    /// Values in field order: fold change, delta, original, unstimulated.
    pub fn values(&self) -> [f64; 4] {
        [self.fold_change, self.delta, self.original, self.unstimulated]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRecord {
    pub donor: String,
    pub peptide: String,
    pub marker: String,
    pub bundle: MetricBundle,
}

/// Derived metrics for every stimulated donor/peptide/marker of one file.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedTable {
    pub file_name: String,
    pub panel: PanelKind,
    pub records: Vec<DerivedRecord>,
}

pub fn derive_metrics(table: &DonorTable, panel: PanelKind, baseline_condition: &str) -> DerivedTable {
    let mut records = Vec::new();

    for (donor, entry) in table.donors() {
        let baseline = entry.condition(baseline_condition);
        if baseline.is_none() {
            warn!(
                file = %table.file_name,
                donor,
                "donor has no {baseline_condition} condition; fold change left undefined"
            );
        }

        for (peptide, values) in entry.conditions() {
            if peptide == baseline_condition {
                continue;
            }
            for (marker, value) in values.iter() {
                let baseline_value = baseline.and_then(|b| b.get(marker));
                records.push(DerivedRecord {
                    donor: donor.to_string(),
                    peptide: peptide.to_string(),
                    marker: marker.to_string(),
                    bundle: MetricBundle::derive(value, baseline_value),
                });
            }
        }
    }

    DerivedTable {
        file_name: table.file_name.clone(),
        panel,
        records,
    }
}
