use std::io::{Cursor, Write};

use chrono::{DateTime, SecondsFormat, Utc};
use polars::io::parquet::write::{ParquetCompression, ParquetWriter, StatisticsOptions};
use polars::prelude::{Column, CsvWriter, DataFrame, NamedFrom, SerWriter, Series};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;
use crate::rows::{FieldValue, OutputRow};

/// Output serialization formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Parquet => "parquet",
        }
    }
}

/// Builds a DataFrame whose columns are the union of row fields in first-seen order.
/// A column holding any text value is a string column; all others are `Float64`.
pub fn rows_to_dataframe(rows: &[OutputRow]) -> Result<DataFrame> {
    let records: Vec<Vec<(String, FieldValue)>> = rows.iter().map(OutputRow::fields).collect();

    let mut names: Vec<String> = Vec::new();
    for record in &records {
        for (name, _) in record {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
    }

    let mut columns: Vec<Column> = Vec::with_capacity(names.len());
    for name in &names {
        let values: Vec<Option<&FieldValue>> = records
            .iter()
            .map(|record| {
                record
                    .iter()
                    .find(|(field, _)| field == name)
                    .map(|(_, value)| value)
            })
            .collect();

        let is_text = values
            .iter()
            .any(|value| matches!(value, Some(FieldValue::Text(_))));

        let series = if is_text {
            let data: Vec<Option<String>> = values
                .iter()
                .map(|value| value.map(|v| v.to_string()))
                .collect();
            Series::new(name.as_str().into(), data)
        } else {
            let data: Vec<Option<f64>> = values
                .iter()
                .map(|value| value.and_then(FieldValue::as_f64))
                .collect();
            Series::new(name.as_str().into(), data)
        };
        columns.push(series.into());
    }

    Ok(DataFrame::new(columns)?)
}

pub fn write_csv<W: Write>(rows: &[OutputRow], writer: W) -> Result<()> {
    let mut df = rows_to_dataframe(rows)?;
    CsvWriter::new(writer).include_header(true).finish(&mut df)?;
    Ok(())
}

pub fn write_json<W: Write>(rows: &[OutputRow], writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, rows)?;
    Ok(())
}

pub fn create_parquet_bytes(rows: &[OutputRow]) -> Result<Vec<u8>> {
    let mut df = rows_to_dataframe(rows)?;
    let mut buffer = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buffer);
        ParquetWriter::new(&mut cursor)
            .with_compression(ParquetCompression::Zstd(None))
            .with_statistics(StatisticsOptions::default())
            .finish(&mut df)?;
    }
    Ok(buffer)
}

pub fn render(rows: &[OutputRow], format: OutputFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    match format {
        OutputFormat::Csv => write_csv(rows, &mut buffer)?,
        OutputFormat::Json => write_json(rows, &mut buffer)?,
        OutputFormat::Parquet => buffer = create_parquet_bytes(rows)?,
    }
    Ok(buffer)
}

/// Folder name used inside packaged archives.
pub fn package_folder(generated_at: DateTime<Utc>) -> String {
    format!(
        "output-{}",
        generated_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

/// Zips named blobs under a single `output-<timestamp>/` folder.
pub fn package_tables(entries: &[(String, Vec<u8>)], generated_at: DateTime<Utc>) -> Result<Vec<u8>> {
    let folder = package_folder(generated_at);
    let mut buffer = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buffer);
        let mut zip = ZipWriter::new(&mut cursor);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, bytes) in entries {
            zip.start_file(format!("{folder}/{name}"), options)?;
            zip.write_all(bytes)?;
        }

        zip.finish()?;
    }
    Ok(buffer)
}
