//! Legacy conversion mode: reorders and pads each donor's rows to a canonical
//! condition order before writing the file back out.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use immunoflux_parser::{decode_utf8, read_table, RawRow, RawTable, RowNormalizer, SourceFile};
use tracing::{info, warn};

use crate::classify::{FileClassifier, FileKind};
use crate::config::{PipelineConfig, RowFormat};
use crate::error::Result;
use crate::outputs::package_tables;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedFile {
    pub name: String,
    pub csv: String,
}

#[derive(Debug)]
pub struct ConversionOutput {
    pub archive: Vec<u8>,
    pub converted: Vec<String>,
    pub failures: Vec<(String, String)>,
}

/// For every donor, emits one row per row-format entry titled `<donor>_<entry>`:
/// the file's row with that title if present, otherwise a row holding only the title.
pub fn convert_rows(rows: &[RawRow], row_format: &RowFormat, normalizer: &RowNormalizer) -> Vec<RawRow> {
    let filtered: Vec<&RawRow> = rows.iter().filter(|row| !normalizer.is_noise(row.key())).collect();

    let mut by_title: HashMap<&str, &RawRow> = HashMap::new();
    let mut donors: Vec<&str> = Vec::new();
    for row in &filtered {
        by_title.insert(row.key(), *row);
        let donor = row.key().split('_').next().unwrap_or_default();
        if !donor.is_empty() && !donors.contains(&donor) {
            donors.push(donor);
        }
    }

    let mut converted = Vec::with_capacity(donors.len() * row_format.entries().len());
    for donor in donors {
        for entry in row_format.entries() {
            let title = format!("{donor}_{entry}");
            match by_title.get(title.as_str()) {
                Some(row) => converted.push((*row).clone()),
                None => converted.push(RawRow::new([title])),
            }
        }
    }
    converted
}

/// Header first (first field written as `Name`), then the converted rows.
pub fn convert_table(table: &RawTable, row_format: &RowFormat, normalizer: &RowNormalizer) -> Result<String> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());
    writer.write_record(&table.header.columns)?;
    for row in convert_rows(&table.rows, row_format, normalizer) {
        writer.write_record(&row.fields)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn convert_file(file: &SourceFile, config: &PipelineConfig) -> Result<ConvertedFile> {
    let text = decode_utf8(&file.name, &file.contents)?;
    let table = read_table(&file.name, text)?;
    let csv = convert_table(&table, &config.row_format, &config.normalizer())?;
    Ok(ConvertedFile {
        name: file.name.clone(),
        csv,
    })
}

/// Converts every donor-panel file and packages the results into one zip archive.
/// Files that fail to convert are listed in `failures` and left out of the archive.
pub fn convert_files(
    files: &[SourceFile],
    config: &PipelineConfig,
    generated_at: DateTime<Utc>,
) -> Result<ConversionOutput> {
    let classifier = FileClassifier::from_config(config);
    let mut entries = Vec::new();
    let mut converted = Vec::new();
    let mut failures = Vec::new();

    for file in files {
        if classifier.classify(&file.name) == FileKind::CytokineFrequency {
            info!(file = %file.name, "skipping cytokine file in conversion");
            continue;
        }
        match convert_file(file, config) {
            Ok(result) => {
                converted.push(result.name.clone());
                entries.push((result.name, result.csv.into_bytes()));
            }
            Err(err) => {
                warn!(file = %file.name, error = %err, "conversion failed");
                failures.push((file.name.clone(), err.to_string()));
            }
        }
    }

    let archive = package_tables(&entries, generated_at)?;
    Ok(ConversionOutput {
        archive,
        converted,
        failures,
    })
}
