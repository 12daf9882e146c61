// crates/immunoflux/src/commands/process.rs

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use comfy_table::Table;
use immunoflux_core::outputs::{render, OutputFormat};
use immunoflux_core::{FileReport, Pipeline, PipelineError};
use tracing::info;

use crate::inputs::{load_config, read_inputs, write_output};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Csv,
    Json,
    Parquet,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Parquet => OutputFormat::Parquet,
        }
    }
}

#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Input files, zip archives or glob patterns
    #[arg(required = true)]
    inputs: Vec<String>,
    /// Write rows here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = FormatArg::Csv)]
    format: FormatArg,
    /// Pipeline config TOML (falls back to IMMUNOFLUX_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,
}

pub async fn handle_process_command(args: ProcessArgs) -> Result<()> {
    let config = load_config(args.config)?;
    let files = read_inputs(&args.inputs)?;
    let pipeline = Pipeline::new(config);

    let output = match pipeline.run(files).await {
        Ok(output) => output,
        Err(PipelineError::NoParseableInput { failures }) => {
            eprintln!("{}", report_table(&failures));
            anyhow::bail!("no input file could be parsed ({} failed)", failures.len());
        }
        Err(err) => return Err(err.into()),
    };

    eprintln!("{}", report_table(&output.reports));

    let bytes = render(&output.rows, args.format.into()).context("failed to render output rows")?;
    write_output(args.output.as_deref(), &bytes)?;
    info!(rows = output.rows.len(), "wrote output rows");
    Ok(())
}

pub fn report_table(reports: &[FileReport]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["File", "Kind", "Status", "Records", "Message"]);
    for report in reports {
        table.add_row(vec![
            report.path.clone(),
            report
                .kind
                .map(|kind| kind.to_string())
                .unwrap_or_else(|| "-".to_string()),
            format!("{:?}", report.status),
            report.records.to_string(),
            report.message.clone().unwrap_or_default(),
        ]);
    }
    table
}
