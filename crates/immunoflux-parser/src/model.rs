use std::fmt;

use serde::{Deserialize, Serialize};

/// Literal name bound to the first header field.
pub const NAME_COLUMN: &str = "Name";

/// A named raw file as it arrives from an upload or an expanded archive.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub contents: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("name", &self.name)
            .field("bytes", &self.contents.len())
            .finish()
    }
}

/// One tokenized row. Field 0 is the composite `<donor>_<condition><ext>` key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    pub fields: Vec<String>,
}

impl RawRow {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn key(&self) -> &str {
        self.fields.first().map(String::as_str).unwrap_or_default()
    }

    /// Positional values following the key.
    pub fn values(&self) -> &[String] {
        self.fields.get(1..).unwrap_or_default()
    }

    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|field| field.trim().is_empty())
    }
}

/// Marker names positionally aligned to [`RawRow`] fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRow {
    pub columns: Vec<String>,
}

impl HeaderRow {
    /// Builds a header from a raw first row, rebinding field 0 to `"Name"`.
    pub fn from_row(row: RawRow) -> Self {
        let mut columns = row.fields;
        match columns.first_mut() {
            Some(first) => *first = NAME_COLUMN.to_string(),
            None => columns.push(NAME_COLUMN.to_string()),
        }
        Self { columns }
    }

    /// Marker columns as `(field index, marker name)`, skipping the name column and
    /// columns with an empty header.
    pub fn markers(&self) -> impl Iterator<Item = (usize, &str)> {
        self.columns
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, name)| !name.trim().is_empty())
            .map(|(idx, name)| (idx, name.as_str()))
    }
}

/// Header plus data rows for a single file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub file_name: String,
    pub header: HeaderRow,
    pub rows: Vec<RawRow>,
}

/// Header-keyed row produced by the record tokenizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRecord {
    pub fields: Vec<(String, String)>,
}

impl HeaderRecord {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(header, _)| header == name)
            .map(|(_, value)| value.as_str())
    }

    /// Value of the first column regardless of its header text.
    pub fn first_value(&self) -> Option<&str> {
        self.fields.first().map(|(_, value)| value.as_str())
    }
}

/// A row whose key split cleanly into donor and condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub donor: String,
    pub condition: String,
    pub row: RawRow,
}
