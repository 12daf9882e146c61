use tracing::debug;

use crate::classify::PanelKind;
use crate::combine::RowSet;
use crate::cytokine::CytokineTable;
use crate::rows::OutputRow;

/// Folds antibody-blocked metrics into their baseline rows and merges per-donor
/// cytokine fields. Rows without a blocked counterpart or cytokine record pass
/// through unchanged; fields are only ever added.
pub fn reconcile(
    mut rows: RowSet,
    antibody_marker: &str,
    cytokines: Option<&CytokineTable>,
) -> Vec<OutputRow> {
    let blocked_suffix = format!(" + {antibody_marker}");

    let mut matches = Vec::new();
    for row in rows.iter() {
        if row.key.peptide.contains(antibody_marker) {
            continue;
        }
        let counterpart = row.key.blocked_counterpart(&blocked_suffix);
        if let Some(blocked) = rows.get(&counterpart) {
            matches.push((row.key.clone(), blocked.frequency, blocked.mfi));
        }
    }
    debug!(matched = matches.len(), "antibody-blocked counterparts found");

    for (key, frequency, mfi) in matches {
        if let Some(row) = rows.get_mut(&key) {
            for (kind, bundle) in [(PanelKind::Frequency, frequency), (PanelKind::Mfi, mfi)] {
                if let Some(bundle) = bundle {
                    *row.antibody_bundle_mut(kind) = Some(bundle);
                }
            }
        }
    }

    if let Some(table) = cytokines {
        for row in rows.iter_mut() {
            if let Some(record) = table.get(&row.key.donor) {
                for (name, value) in &record.fields {
                    row.set_cytokine(name, value.clone());
                }
            }
        }
    }

    rows.into_rows()
}
