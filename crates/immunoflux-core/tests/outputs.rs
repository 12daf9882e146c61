use std::io::{Cursor, Read};

use chrono::{TimeZone, Utc};
use immunoflux_core::outputs::{package_folder, package_tables, render, rows_to_dataframe, OutputFormat};
use immunoflux_core::{FieldValue, MetricBundle, OutputRow, PanelKind, RowKey};
use polars::prelude::DataType;
use zip::ZipArchive;

fn sample_rows() -> Vec<OutputRow> {
    let mut with_cytokine = OutputRow::new(RowKey::new("Monocytes", "D1", "CD14", "Flu"), "Monocytes.csv")
        .with_bundle(PanelKind::Frequency, MetricBundle::derive(20.0, Some(10.0)));
    with_cytokine.set_cytokine("IFNg", FieldValue::Number(0.5));

    let without_baseline = OutputRow::new(RowKey::new("Monocytes", "D2", "CD14", "Flu"), "Monocytes.csv")
        .with_bundle(PanelKind::Frequency, MetricBundle::derive(4.0, None));

    vec![with_cytokine, without_baseline]
}

#[test]
fn dataframe_has_union_of_columns() -> anyhow::Result<()> {
    let df = rows_to_dataframe(&sample_rows())?;
    assert_eq!(df.height(), 2);

    let names: Vec<String> = df.get_column_names().iter().map(|name| name.to_string()).collect();
    assert_eq!(
        names,
        vec![
            "cellType",
            "donor",
            "peptide",
            "marker",
            "file",
            "foldChangeFrequency",
            "deltaFrequency",
            "originalFrequency",
            "unstimulatedFrequency",
            "IFNg",
        ]
    );
    assert_eq!(df.column("donor")?.dtype(), &DataType::String);
    assert_eq!(df.column("foldChangeFrequency")?.dtype(), &DataType::Float64);
    assert_eq!(df.column("IFNg")?.null_count(), 1);
    Ok(())
}

#[test]
fn csv_and_json_renderings() -> anyhow::Result<()> {
    let rows = sample_rows();

    let csv = String::from_utf8(render(&rows, OutputFormat::Csv)?)?;
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("cellType,donor,peptide,marker,file,foldChangeFrequency,deltaFrequency,originalFrequency,unstimulatedFrequency,IFNg")
    );
    assert_eq!(lines.count(), 2);

    let json: serde_json::Value = serde_json::from_slice(&render(&rows, OutputFormat::Json)?)?;
    let records = json.as_array().expect("array of rows");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["foldChangeFrequency"], 2.0);
    assert_eq!(records[0]["IFNg"], 0.5);
    assert!(records[1]["foldChangeFrequency"].is_null());
    assert!(records[1].get("IFNg").is_none());
    Ok(())
}

#[test]
fn parquet_bytes_are_written() -> anyhow::Result<()> {
    let bytes = render(&sample_rows(), OutputFormat::Parquet)?;
    assert!(bytes.starts_with(b"PAR1"));
    assert_eq!(OutputFormat::Parquet.extension(), "parquet");
    Ok(())
}

#[test]
fn packaged_tables_share_timestamped_folder() -> anyhow::Result<()> {
    let generated_at = Utc
        .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
        .single()
        .expect("valid timestamp");
    assert_eq!(package_folder(generated_at), "output-2024-01-02T03:04:05.000Z");

    let archive = package_tables(
        &[
            ("rows.csv".to_string(), b"a,b\n1,2\n".to_vec()),
            ("reports.json".to_string(), b"[]".to_vec()),
        ],
        generated_at,
    )?;

    let mut zip = ZipArchive::new(Cursor::new(archive))?;
    let names: Vec<String> = zip.file_names().map(str::to_string).collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"output-2024-01-02T03:04:05.000Z/rows.csv".to_string()));

    let mut contents = String::new();
    zip.by_name("output-2024-01-02T03:04:05.000Z/rows.csv")?
        .read_to_string(&mut contents)?;
    assert_eq!(contents, "a,b\n1,2\n");
    Ok(())
}
