pub mod classify;
pub mod combine;
pub mod config;
pub mod conversion;
pub mod cytokine;
pub mod donor_table;
pub mod error;
pub mod gating;
pub mod ingestion;
pub mod metrics;
pub mod outputs;
pub mod pipelines;
pub mod reconcile;
pub mod rows;

pub use classify::{CellType, FileClassifier, FileKind, PanelKind};
pub use combine::{combine_tables, sanitize_marker, RowSet};
pub use config::{PipelineConfig, RowFormat};
pub use cytokine::{CytokineFrequencyRow, CytokineTable};
pub use error::{PipelineError, Result};
pub use ingestion::{FileReport, FileStatus};
pub use metrics::{derive_metrics, DerivedRecord, DerivedTable, MetricBundle};
pub use pipelines::{Pipeline, PipelineOutput};
pub use reconcile::reconcile;
pub use rows::{merge_row, FieldValue, OutputRow, RowKey};
