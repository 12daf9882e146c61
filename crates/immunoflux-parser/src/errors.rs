use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("{file} CSV error: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    #[error("{file} is not valid UTF-8")]
    InvalidUtf8 { file: String },

    #[error("{file} did not contain any data rows")]
    EmptyData { file: String },

    #[error("{file} is missing a header row")]
    MissingHeader { file: String },

    #[error("{file} archive error: {source}")]
    Archive {
        file: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("{file} I/O error: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

impl ParserError {
    /// Name of the source file the error belongs to.
    pub fn file(&self) -> &str {
        match self {
            ParserError::Csv { file, .. }
            | ParserError::InvalidUtf8 { file }
            | ParserError::EmptyData { file }
            | ParserError::MissingHeader { file }
            | ParserError::Archive { file, .. }
            | ParserError::Io { file, .. } => file,
        }
    }
}
