// crates/immunoflux/src/commands/convert.rs

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use comfy_table::Table;
use immunoflux_core::conversion::convert_files;
use immunoflux_core::RowFormat;
use immunoflux_parser::expand_inputs;
use tracing::{info, warn};

use crate::inputs::{load_config, read_inputs, write_output};

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input files, zip archives or glob patterns
    #[arg(required = true)]
    inputs: Vec<String>,
    /// Destination zip archive
    #[arg(short, long)]
    output: PathBuf,
    /// Row format file, one condition label per line
    #[arg(long)]
    row_format: Option<PathBuf>,
    #[arg(long)]
    config: Option<PathBuf>,
}

pub fn handle_convert_command(args: ConvertArgs) -> Result<()> {
    let mut config = load_config(args.config)?;
    if let Some(path) = &args.row_format {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read row format {}", path.display()))?;
        config.row_format = RowFormat::from_lines(&text);
    }

    let raw = read_inputs(&args.inputs)?;
    let names: Vec<String> = raw.iter().map(|file| file.name.clone()).collect();
    let mut files = Vec::new();
    let mut failures = Vec::new();
    for (name, expanded) in names.into_iter().zip(expand_inputs(raw)) {
        match expanded {
            Ok(entries) => files.extend(entries),
            Err(err) => {
                warn!(file = %name, error = %err, "failed to expand input");
                failures.push((name, err.to_string()));
            }
        }
    }

    let output = convert_files(&files, &config, Utc::now()).context("conversion failed")?;
    failures.extend(output.failures);

    let mut table = Table::new();
    table.set_header(vec!["File", "Result"]);
    for name in &output.converted {
        table.add_row(vec![name.clone(), "converted".to_string()]);
    }
    for (name, message) in &failures {
        table.add_row(vec![name.clone(), message.clone()]);
    }
    eprintln!("{table}");

    write_output(Some(&args.output), &output.archive)?;
    info!(
        converted = output.converted.len(),
        failed = failures.len(),
        archive = %args.output.display(),
        "wrote converted files"
    );
    Ok(())
}
