//! Inbound directory scanning

use crate::error::{IngestError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Collect ingestible files under `root`
///
/// Walks recursively in file-name order and keeps regular files whose
/// extension equals `extension` (case-sensitive, leading dot optional).
/// `exclude` is never entered; pass the processed directory so relocated
/// files are not scanned again when it lives inside the inbound tree.
/// Directories are compared by canonical path, while the returned paths keep
/// `root` exactly as given.
pub fn scan(root: &Path, extension: &str, exclude: Option<&Path>) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(IngestError::DirectoryNotFound(root.to_path_buf()));
    }

    let extension = extension.trim_start_matches('.');
    let exclude = exclude.and_then(|path| fs::canonicalize(path).ok());
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_excluded(entry, exclude.as_deref()));

    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == extension)
        {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        return Err(IngestError::NoFilesFound(root.to_path_buf()));
    }

    Ok(files)
}

fn is_excluded(entry: &DirEntry, exclude: Option<&Path>) -> bool {
    match exclude {
        Some(excluded) if entry.file_type().is_dir() => {
            fs::canonicalize(entry.path()).is_ok_and(|path| path == excluded)
        }
        _ => false,
    }
}
