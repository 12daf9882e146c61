use std::collections::HashSet;

use immunoflux_core::{
    combine_tables, sanitize_marker, DerivedRecord, DerivedTable, FileClassifier, MetricBundle,
    PanelKind, RowKey,
};

fn record(donor: &str, peptide: &str, marker: &str, value: f64, baseline: f64) -> DerivedRecord {
    DerivedRecord {
        donor: donor.to_string(),
        peptide: peptide.to_string(),
        marker: marker.to_string(),
        bundle: MetricBundle::derive(value, Some(baseline)),
    }
}

fn table(file_name: &str, panel: PanelKind, records: Vec<DerivedRecord>) -> DerivedTable {
    DerivedTable {
        file_name: file_name.to_string(),
        panel,
        records,
    }
}

#[test]
fn sanitize_marker_strips_suffixes_and_is_idempotent() {
    for (raw, expected) in [
        ("CD8+", "CD8"),
        ("CD8 MFI", "CD8"),
        ("  CD8 ", "CD8"),
        ("CD8 +", "CD8"),
        ("CD8+ MFI", "CD8"),
        ("HLA-DR", "HLA-DR"),
    ] {
        let once = sanitize_marker(raw);
        assert_eq!(once, expected, "sanitizing {raw:?}");
        assert_eq!(sanitize_marker(&once), once);
    }
}

#[test]
fn frequency_and_mfi_panels_collide_into_one_row() {
    let tables = vec![
        table(
            "Monocytes.csv",
            PanelKind::Frequency,
            vec![record("D1", "Flu", "CD14+", 4.0, 2.0)],
        ),
        table(
            "Monocytes_MFI.csv",
            PanelKind::Mfi,
            vec![record("D1", "Flu", "CD14 MFI", 900.0, 300.0)],
        ),
    ];

    let rows = combine_tables(&tables, &FileClassifier::default());
    assert_eq!(rows.len(), 1);

    let row = rows
        .get(&RowKey::new("Monocytes", "D1", "CD14", "Flu"))
        .expect("merged row");
    assert_eq!(row.frequency.map(|b| b.fold_change), Some(2.0));
    assert_eq!(row.mfi.map(|b| b.fold_change), Some(3.0));
    assert_eq!(row.file, "Monocytes_MFI.csv");
}

#[test]
fn later_file_wins_on_conflicting_fields() {
    let tables = vec![
        table(
            "Neutrophils_run1.csv",
            PanelKind::Frequency,
            vec![record("D1", "Flu", "CD16", 4.0, 2.0)],
        ),
        table(
            "Neutrophils_run2.csv",
            PanelKind::Frequency,
            vec![record("D1", "Flu", "CD16", 9.0, 3.0)],
        ),
    ];

    let rows = combine_tables(&tables, &FileClassifier::default()).into_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].frequency.map(|b| b.original), Some(9.0));
    assert_eq!(rows[0].file, "Neutrophils_run2.csv");
}

#[test]
fn row_keys_are_unique_and_ordered_by_file_then_discovery() {
    let tables = vec![
        table(
            "Monocytes.csv",
            PanelKind::Frequency,
            vec![
                record("D2", "Flu", "CD14", 1.0, 1.0),
                record("D1", "Flu", "CD14", 1.0, 1.0),
                record("D2", "Flu", "CD14+", 2.0, 1.0),
            ],
        ),
        table(
            "unlabelled.csv",
            PanelKind::Frequency,
            vec![record("D1", "Flu", "CD14", 1.0, 1.0)],
        ),
    ];

    let rows = combine_tables(&tables, &FileClassifier::default()).into_rows();
    let keys: Vec<_> = rows.iter().map(|row| row.key.clone()).collect();
    let unique: HashSet<_> = keys.iter().cloned().collect();
    assert_eq!(unique.len(), keys.len());

    assert_eq!(
        keys,
        vec![
            RowKey::new("Monocytes", "D2", "CD14", "Flu"),
            RowKey::new("Monocytes", "D1", "CD14", "Flu"),
            RowKey::new("unlabelled.csv", "D1", "CD14", "Flu"),
        ]
    );
}
