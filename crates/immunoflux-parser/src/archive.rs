use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::errors::ParserError;
use crate::model::SourceFile;

/// Path fragment identifying macOS resource-fork entries (`__MACOSX/...`).
const MACOS_METADATA: &str = "MACOS";

pub fn is_archive(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".zip")
}

/// Expands a zip archive into its member files in archive order. Directory entries
/// and macOS metadata entries are skipped.
pub fn expand_archive(file: &SourceFile) -> Result<Vec<SourceFile>, ParserError> {
    let archive_error = |source: zip::result::ZipError| ParserError::Archive {
        file: file.name.clone(),
        source,
    };

    let mut archive = ZipArchive::new(Cursor::new(file.contents.as_slice())).map_err(archive_error)?;
    let mut files = Vec::new();

    for idx in 0..archive.len() {
        let mut entry = archive.by_index(idx).map_err(archive_error)?;
        if entry.is_dir() || entry.name().contains(MACOS_METADATA) {
            continue;
        }

        let entry_path = entry.name().to_string();
        let name = entry_path
            .rsplit('/')
            .next()
            .unwrap_or(entry_path.as_str())
            .to_string();
        if name.is_empty() {
            continue;
        }

        let mut contents = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut contents)
            .map_err(|source| ParserError::Io {
                file: entry_path.clone(),
                source,
            })?;
        files.push(SourceFile { name, contents });
    }

    Ok(files)
}

/// Expands archives and passes other files through, preserving input order. Each
/// input yields either its files or the error that stopped it.
pub fn expand_inputs(inputs: Vec<SourceFile>) -> Vec<Result<Vec<SourceFile>, ParserError>> {
    inputs
        .into_iter()
        .map(|input| {
            if is_archive(&input.name) {
                expand_archive(&input)
            } else {
                Ok(vec![input])
            }
        })
        .collect()
}
