use std::sync::Arc;

use immunoflux_parser::SourceFile;
use tracing::info;

use crate::classify::FileClassifier;
use crate::combine::combine_tables;
use crate::config::PipelineConfig;
use crate::cytokine::CytokineTable;
use crate::error::{PipelineError, Result};
use crate::ingestion::{ingest_files, ingest_files_blocking, FileReport, IngestionBatch, ParsedSource};
use crate::metrics::DerivedTable;
use crate::reconcile::reconcile;
use crate::rows::OutputRow;

#[derive(Debug)]
pub struct PipelineOutput {
    pub rows: Vec<OutputRow>,
    pub reports: Vec<FileReport>,
}

/// Reconciliation pipeline: expand -> classify -> parse per file -> combine -> reconcile.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Arc<PipelineConfig>,
    classifier: FileClassifier,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let classifier = FileClassifier::from_config(&config);
        Self {
            config: Arc::new(config),
            classifier,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Parses files concurrently, then combines and reconciles the joined results.
    pub async fn run(&self, inputs: Vec<SourceFile>) -> Result<PipelineOutput> {
        let batch = ingest_files(inputs, Arc::clone(&self.config)).await;
        self.assemble(batch)
    }

    pub fn run_blocking(&self, inputs: Vec<SourceFile>) -> Result<PipelineOutput> {
        let batch = ingest_files_blocking(inputs, &self.config);
        self.assemble(batch)
    }

    fn assemble(&self, batch: IngestionBatch) -> Result<PipelineOutput> {
        if batch.parsed.is_empty() {
            return Err(PipelineError::NoParseableInput {
                failures: batch.failures(),
            });
        }

        let IngestionBatch { parsed, reports } = batch;
        let mut panels: Vec<DerivedTable> = Vec::new();
        let mut cytokines: Option<CytokineTable> = None;

        for source in parsed {
            match source {
                ParsedSource::Panel(table) => panels.push(table),
                ParsedSource::Cytokine(table) => match cytokines.as_mut() {
                    Some(existing) => existing.merge(table),
                    None => cytokines = Some(table),
                },
            }
        }

        let combined = combine_tables(&panels, &self.classifier);
        let rows = reconcile(combined, &self.config.antibody_marker, cytokines.as_ref());
        info!(
            files = reports.len(),
            panels = panels.len(),
            rows = rows.len(),
            "pipeline complete"
        );

        Ok(PipelineOutput { rows, reports })
    }
}
