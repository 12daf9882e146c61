// crates/immunoflux-core/src/error.rs

use immunoflux_parser::ParserError;
use thiserror::Error;

use crate::ingestion::FileReport;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Parser error: {0}")]
    Parser(#[from] ParserError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("CSV writing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ZIP operation failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("no parseable input files ({} failed)", failures.len())]
    NoParseableInput { failures: Vec<FileReport> },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
