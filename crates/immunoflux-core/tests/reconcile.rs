use immunoflux_core::{
    reconcile, CytokineTable, FieldValue, MetricBundle, OutputRow, PanelKind, RowKey, RowSet,
};
use immunoflux_parser::{tokenize_records, RowNormalizer};

fn row(peptide: &str, kind: PanelKind, value: f64, baseline: f64) -> OutputRow {
    OutputRow::new(RowKey::new("Monocytes", "D1", "CD14", peptide), "Monocytes.csv")
        .with_bundle(kind, MetricBundle::derive(value, Some(baseline)))
}

#[test]
fn baseline_row_carries_blocked_metrics() {
    let rows: RowSet = vec![
        row("Flu", PanelKind::Frequency, 20.0, 10.0),
        row("Flu + aIFNy", PanelKind::Frequency, 15.0, 10.0),
    ]
    .into_iter()
    .collect();

    let output = reconcile(rows, "aIFNy", None);
    assert_eq!(output.len(), 2);

    let baseline = &output[0];
    let blocked = &output[1];
    let antibody = baseline.antibody_frequency.expect("antibody metrics copied");
    assert_eq!(Some(antibody.fold_change), blocked.frequency.map(|b| b.fold_change));
    assert_eq!(antibody.original, 15.0);
    assert_eq!(antibody.fold_change, 1.5);
    assert_eq!(
        baseline.field("antibodyFoldChangeFrequency"),
        Some(FieldValue::Number(1.5))
    );
    assert_eq!(
        baseline.field("antibodyOriginalFrequency"),
        Some(FieldValue::Number(15.0))
    );

    assert!(blocked.antibody_frequency.is_none());
}

#[test]
fn unmatched_rows_pass_through_without_antibody_fields() {
    let rows: RowSet = vec![
        row("SARS", PanelKind::Mfi, 20.0, 10.0),
        row("Flu + aIFNy", PanelKind::Mfi, 15.0, 10.0),
    ]
    .into_iter()
    .collect();

    let output = reconcile(rows, "aIFNy", None);
    let sars = &output[0];
    assert!(sars.antibody_mfi.is_none());
    assert!(sars.antibody_frequency.is_none());
    assert!(sars.field("antibodyFoldChangeMFI").is_none());
    assert_eq!(sars.mfi.map(|b| b.fold_change), Some(2.0));
}

#[test]
fn blocked_panel_kinds_map_to_matching_antibody_fields() {
    let mut baseline = row("CMV", PanelKind::Frequency, 2.0, 1.0);
    baseline.mfi = Some(MetricBundle::derive(50.0, Some(25.0)));
    let blocked = row("CMV + aIFNy", PanelKind::Mfi, 30.0, 25.0);

    let output = reconcile(vec![baseline, blocked].into_iter().collect(), "aIFNy", None);
    let baseline = &output[0];
    assert!(baseline.antibody_frequency.is_none());
    assert_eq!(baseline.antibody_mfi.map(|b| b.original), Some(30.0));
    assert_eq!(baseline.field("antibodyDeltaMFI"), Some(FieldValue::Number(5.0)));
}

#[test]
fn cytokine_fields_merge_by_donor() {
    let records = tokenize_records("Cytokines.csv", "Donor,IFNg,marker\nD1,0.8,CXCL10\n")
        .expect("records");
    let cytokines = CytokineTable::from_records(&records, &RowNormalizer::default());

    let mut other_donor = row("Flu", PanelKind::Frequency, 2.0, 1.0);
    other_donor.key.donor = "D9".to_string();
    let rows: RowSet = vec![row("Flu", PanelKind::Frequency, 2.0, 1.0), other_donor]
        .into_iter()
        .collect();

    let output = reconcile(rows, "aIFNy", Some(&cytokines));
    assert_eq!(output[0].field("IFNg"), Some(FieldValue::Number(0.8)));
    assert_eq!(
        output[0].field("marker"),
        Some(FieldValue::Text("CXCL10".to_string()))
    );
    assert!(output[1].field("IFNg").is_none());
    assert_eq!(output[1].field("marker"), Some(FieldValue::Text("CD14".to_string())));
}
