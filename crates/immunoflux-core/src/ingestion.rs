use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use immunoflux_parser::{decode_utf8, expand_inputs, read_table, ParserError, SourceFile};
use serde::Serialize;
use tracing::{info, warn};

use crate::classify::{FileClassifier, FileKind, PanelKind};
use crate::config::PipelineConfig;
use crate::cytokine::{parse_cytokine_file, CytokineTable};
use crate::donor_table::DonorTable;
use crate::metrics::{derive_metrics, DerivedTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileStatus {
    Duplicate,
    Parsed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: String,
    pub hash: Option<String>,
    pub kind: Option<FileKind>,
    pub status: FileStatus,
    pub records: usize,
    pub message: Option<String>,
}

impl FileReport {
    fn failed(path: &str, hash: Option<String>, kind: Option<FileKind>, message: String) -> Self {
        Self {
            path: path.to_string(),
            hash,
            kind,
            status: FileStatus::Failed,
            records: 0,
            message: Some(message),
        }
    }
}

/// Per-file parse result.
#[derive(Debug, Clone)]
pub enum ParsedSource {
    Panel(DerivedTable),
    Cytokine(CytokineTable),
}

impl ParsedSource {
    pub fn record_count(&self) -> usize {
        match self {
            ParsedSource::Panel(table) => table.records.len(),
            ParsedSource::Cytokine(table) => table.len(),
        }
    }
}

/// Successfully parsed sources in input order, plus one report per input file.
#[derive(Debug, Default)]
pub struct IngestionBatch {
    pub parsed: Vec<ParsedSource>,
    pub reports: Vec<FileReport>,
}

impl IngestionBatch {
    pub fn failures(&self) -> Vec<FileReport> {
        self.reports
            .iter()
            .filter(|report| report.status == FileStatus::Failed)
            .cloned()
            .collect()
    }
}

pub fn compute_hash(contents: &[u8]) -> String {
    blake3::hash(contents).to_hex().to_string()
}

/// Runs the per-file stages for one source: normalize, build, derive for panels;
/// reshape for cytokine files.
pub fn parse_source(
    file: &SourceFile,
    kind: FileKind,
    config: &PipelineConfig,
) -> Result<ParsedSource, ParserError> {
    let normalizer = config.normalizer();
    match kind {
        FileKind::CytokineFrequency => {
            parse_cytokine_file(&file.name, &file.contents, &normalizer).map(ParsedSource::Cytokine)
        }
        FileKind::DonorPanel(panel) => {
            parse_panel(file, panel, config).map(ParsedSource::Panel)
        }
    }
}

fn parse_panel(
    file: &SourceFile,
    panel: PanelKind,
    config: &PipelineConfig,
) -> Result<DerivedTable, ParserError> {
    let text = decode_utf8(&file.name, &file.contents)?;
    let table = read_table(&file.name, text)?;
    let rows = config.normalizer().normalize(&table.rows);
    let donors = DonorTable::build(&file.name, &table.header, &rows);
    Ok(derive_metrics(&donors, panel, &config.baseline_condition))
}

/// Report path used when the whole input batch fails before files are known.
const INPUT_BATCH: &str = "<input batch>";

struct PendingFile {
    file: SourceFile,
    hash: String,
    kind: FileKind,
}

enum Slot {
    Reported(FileReport),
    Pending(PendingFile),
}

/// Expands archives, drops duplicate uploads and classifies files, keeping input order.
/// A duplicate has the same content and classifies the same way as an earlier file;
/// identical bytes under another cell type or panel kind are still parsed.
fn plan(inputs: Vec<SourceFile>, classifier: &FileClassifier) -> Vec<Slot> {
    let names: Vec<String> = inputs.iter().map(|input| input.name.clone()).collect();
    let mut seen = HashSet::new();
    let mut slots = Vec::new();

    for (name, expanded) in names.iter().zip(expand_inputs(inputs)) {
        let files = match expanded {
            Ok(files) => files,
            Err(err) => {
                warn!(file = %name, error = %err, "failed to expand input");
                slots.push(Slot::Reported(FileReport::failed(name, None, None, err.to_string())));
                continue;
            }
        };

        for file in files {
            let hash = compute_hash(&file.contents);
            let kind = classifier.classify(&file.name);
            let identity = (hash.clone(), kind, classifier.cell_type(&file.name));
            if !seen.insert(identity) {
                info!(file = %file.name, "skipping duplicate upload");
                slots.push(Slot::Reported(FileReport {
                    path: file.name,
                    hash: Some(hash),
                    kind: Some(kind),
                    status: FileStatus::Duplicate,
                    records: 0,
                    message: None,
                }));
                continue;
            }
            slots.push(Slot::Pending(PendingFile { file, hash, kind }));
        }
    }

    slots
}

fn record_outcome(
    batch: &mut IngestionBatch,
    path: String,
    hash: String,
    kind: FileKind,
    outcome: Result<ParsedSource, String>,
) {
    match outcome {
        Ok(parsed) => {
            let records = parsed.record_count();
            info!(file = %path, kind = %kind, records, "parsed file");
            batch.reports.push(FileReport {
                path,
                hash: Some(hash),
                kind: Some(kind),
                status: FileStatus::Parsed,
                records,
                message: None,
            });
            batch.parsed.push(parsed);
        }
        Err(message) => {
            warn!(file = %path, error = %message, "failed to parse file");
            batch
                .reports
                .push(FileReport::failed(&path, Some(hash), Some(kind), message));
        }
    }
}

/// Expands inputs on a blocking task, then parses every file on its own blocking
/// task and waits for all of them. Results
/// keep input order regardless of which task finishes first; a failing or
/// panicking task only affects its own file.
pub async fn ingest_files(inputs: Vec<SourceFile>, config: Arc<PipelineConfig>) -> IngestionBatch {
    let classifier = FileClassifier::from_config(&config);
    let slots = match tokio::task::spawn_blocking(move || plan(inputs, &classifier)).await {
        Ok(slots) => slots,
        Err(join_err) => {
            warn!(error = %join_err, "input expansion did not complete");
            let mut batch = IngestionBatch::default();
            batch.reports.push(FileReport::failed(
                INPUT_BATCH,
                None,
                None,
                format!("input expansion did not complete: {join_err}"),
            ));
            return batch;
        }
    };

    let mut handles = Vec::new();
    let mut order = Vec::with_capacity(slots.len());
    for slot in slots {
        match slot {
            Slot::Reported(report) => order.push(Err(report)),
            Slot::Pending(pending) => {
                let PendingFile { file, hash, kind } = pending;
                let path = file.name.clone();
                let config = Arc::clone(&config);
                handles.push(tokio::task::spawn_blocking(move || {
                    parse_source(&file, kind, &config)
                }));
                order.push(Ok((path, hash, kind)));
            }
        }
    }

    let mut results = join_all(handles).await.into_iter();
    let mut batch = IngestionBatch::default();

    for entry in order {
        match entry {
            Err(report) => batch.reports.push(report),
            Ok((path, hash, kind)) => {
                let outcome = match results.next() {
                    Some(Ok(parsed)) => parsed.map_err(|err| err.to_string()),
                    Some(Err(join_err)) => Err(format!("parse task did not complete: {join_err}")),
                    None => Err("parse task result missing".to_string()),
                };
                record_outcome(&mut batch, path, hash, kind, outcome);
            }
        }
    }

    batch
}

/// Sequential variant of [`ingest_files`] for callers without a runtime.
pub fn ingest_files_blocking(inputs: Vec<SourceFile>, config: &PipelineConfig) -> IngestionBatch {
    let classifier = FileClassifier::from_config(config);
    let mut batch = IngestionBatch::default();

    for slot in plan(inputs, &classifier) {
        match slot {
            Slot::Reported(report) => batch.reports.push(report),
            Slot::Pending(PendingFile { file, hash, kind }) => {
                let outcome = parse_source(&file, kind, config).map_err(|err| err.to_string());
                record_outcome(&mut batch, file.name, hash, kind, outcome);
            }
        }
    }

    batch
}
