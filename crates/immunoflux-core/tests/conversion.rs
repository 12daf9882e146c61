use std::io::{Cursor, Read};

use chrono::Utc;
use immunoflux_core::conversion::{convert_file, convert_files, convert_rows};
use immunoflux_core::{PipelineConfig, RowFormat};
use immunoflux_parser::{read_table, RowNormalizer, SourceFile};
use zip::ZipArchive;

const PANEL: &str = "\
,CD14
D1_Flu.fcs,20
D1_Unstimulated.fcs,10
Mean,1
D2_CMV + aIFNy.fcs,3
";

fn config() -> PipelineConfig {
    PipelineConfig {
        row_format: RowFormat::from_lines("Unstimulated.fcs\n\nFlu.fcs\nCMV + aIFNy.fcs\n"),
        ..PipelineConfig::default()
    }
}

#[test]
fn rows_follow_row_format_per_donor() -> anyhow::Result<()> {
    let table = read_table("Monocytes.csv", PANEL)?;
    let rows = convert_rows(&table.rows, &config().row_format, &RowNormalizer::default());

    let keys: Vec<&str> = rows.iter().map(|row| row.key()).collect();
    assert_eq!(
        keys,
        vec![
            "D1_Unstimulated.fcs",
            "D1_Flu.fcs",
            "D1_CMV + aIFNy.fcs",
            "D2_Unstimulated.fcs",
            "D2_Flu.fcs",
            "D2_CMV + aIFNy.fcs",
        ]
    );
    assert_eq!(rows[0].values(), ["10".to_string()]);
    assert!(rows[2].values().is_empty());
    Ok(())
}

#[test]
fn converted_file_keeps_renamed_header() -> anyhow::Result<()> {
    let converted = convert_file(&SourceFile::new("Monocytes.csv", PANEL), &config())?;
    let lines: Vec<&str> = converted.csv.lines().collect();
    assert_eq!(lines[0], "Name,CD14");
    assert_eq!(lines[1], "D1_Unstimulated.fcs,10");
    assert_eq!(lines[3], "D1_CMV + aIFNy.fcs");
    assert_eq!(lines.len(), 7);
    Ok(())
}

#[test]
fn batch_conversion_skips_cytokines_and_reports_failures() -> anyhow::Result<()> {
    let files = vec![
        SourceFile::new("Monocytes.csv", PANEL),
        SourceFile::new("Cytokines.csv", "Donor,IFNg\nD1,1\n"),
        SourceFile::new("Empty.csv", ""),
    ];
    let output = convert_files(&files, &config(), Utc::now())?;

    assert_eq!(output.converted, vec!["Monocytes.csv".to_string()]);
    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[0].0, "Empty.csv");

    let mut zip = ZipArchive::new(Cursor::new(output.archive))?;
    assert_eq!(zip.len(), 1);
    let mut entry = zip.by_index(0)?;
    assert!(entry.name().starts_with("output-"));
    assert!(entry.name().ends_with("/Monocytes.csv"));
    let mut contents = String::new();
    entry.read_to_string(&mut contents)?;
    assert!(contents.starts_with("Name,CD14"));
    Ok(())
}
