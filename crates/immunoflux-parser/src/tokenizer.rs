use csv::{ReaderBuilder, StringRecord};

use crate::errors::ParserError;
use crate::model::{HeaderRecord, HeaderRow, RawRow, RawTable};

const UTF8_BOM: char = '\u{feff}';

/// Decodes file bytes as UTF-8, dropping a leading byte-order mark.
pub fn decode_utf8<'a>(file: &str, bytes: &'a [u8]) -> Result<&'a str, ParserError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ParserError::InvalidUtf8 {
        file: file.to_string(),
    })?;
    Ok(text.strip_prefix(UTF8_BOM).unwrap_or(text))
}

/// Splits delimited text into rows of text fields. Record lengths may vary and
/// entirely blank records are skipped.
pub fn tokenize_rows(file: &str, content: &str) -> Result<Vec<RawRow>, ParserError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| ParserError::Csv {
            file: file.to_string(),
            source,
        })?;
        let row = record_to_row(&record);
        if !row.is_blank() {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Header-keyed variant of [`tokenize_rows`]: every data row becomes an ordered list
/// of `(header, value)` pairs.
pub fn tokenize_records(file: &str, content: &str) -> Result<Vec<HeaderRecord>, ParserError> {
    let mut rows = tokenize_rows(file, content)?.into_iter();
    let header = rows.next().ok_or_else(|| ParserError::MissingHeader {
        file: file.to_string(),
    })?;

    let records = rows
        .map(|row| HeaderRecord {
            fields: header
                .fields
                .iter()
                .enumerate()
                .map(|(idx, name)| {
                    let value = row.fields.get(idx).cloned().unwrap_or_default();
                    (name.trim().to_string(), value)
                })
                .collect(),
        })
        .collect();
    Ok(records)
}

/// Reads a donor-panel export: the first row is the header, the rest are data rows.
pub fn read_table(file: &str, content: &str) -> Result<RawTable, ParserError> {
    let mut rows = tokenize_rows(file, content)?;
    if rows.len() < 2 {
        return Err(ParserError::EmptyData {
            file: file.to_string(),
        });
    }
    let header = HeaderRow::from_row(rows.remove(0));
    Ok(RawTable {
        file_name: file.to_string(),
        header,
        rows,
    })
}

fn record_to_row(record: &StringRecord) -> RawRow {
    RawRow::new(record.iter())
}
