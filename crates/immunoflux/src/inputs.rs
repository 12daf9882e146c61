use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use immunoflux_core::PipelineConfig;
use immunoflux_parser::SourceFile;
use tracing::{info, warn};

const CONFIG_ENV: &str = "IMMUNOFLUX_CONFIG";

/// Resolves each argument as a glob pattern and reads every matching file.
pub fn read_inputs(patterns: &[String]) -> Result<Vec<SourceFile>> {
    let mut files = Vec::new();

    for pattern in patterns {
        let mut matched = 0;
        for entry in glob::glob(pattern).with_context(|| format!("invalid input pattern {pattern}"))? {
            let path = match entry {
                Ok(path) => path,
                Err(err) => {
                    warn!(pattern = %pattern, error = %err, "could not read matched path");
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            files.push(read_source(&path)?);
            matched += 1;
        }
        if matched == 0 {
            bail!("no input files match {pattern}");
        }
    }

    info!(files = files.len(), "collected input files");
    Ok(files)
}

fn read_source(path: &Path) -> Result<SourceFile> {
    let contents =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SourceFile::new(name, contents))
}

/// Config from `--config`, then `IMMUNOFLUX_CONFIG`, then built-in defaults.
pub fn load_config(explicit: Option<PathBuf>) -> Result<PipelineConfig> {
    let path = explicit.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
    match path {
        Some(path) => PipelineConfig::load(&path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

pub fn write_output(output: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, bytes)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes).context("failed to write to stdout")?;
            stdout.flush().context("failed to flush stdout")
        }
    }
}
