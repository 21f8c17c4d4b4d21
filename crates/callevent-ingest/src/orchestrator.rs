//! Batch orchestration
//!
//! One run: acquire the run guard, scan the inbound tree, ensure the
//! destination schema, then for each file read, validate, store and move it
//! to the processed directory. Files are handled strictly one at a time in
//! scan order. Only the guard, scan and schema steps can fail the run; every
//! per-file problem is logged, recorded in the [`RunReport`], and the next
//! file is processed.

use crate::config::ParserConfig;
use crate::error::{FileError, IngestError, Result};
use crate::guard::RunGuard;
use crate::reader::read_rows;
use crate::scanner::scan;
use crate::store::CallEventStore;
use crate::validation::{validate, ValidatedBatch};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Outcome of one inbound file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// Stored and moved to the processed directory
    Processed,
    /// Could not be opened; left in place
    ReadFailed,
    /// Store rejected the batch; left in place for retry
    StoreFailed,
    /// Stored, but could not be moved
    RelocateFailed,
}

impl FileStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, FileStatus::Processed)
    }
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
    pub accepted: usize,
    pub rejected: usize,
    /// Error text for failed files
    pub detail: Option<String>,
}

/// Per-file results of a completed run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub files: Vec<FileReport>,
}

impl RunReport {
    pub fn processed_count(&self) -> usize {
        self.files.iter().filter(|f| f.status.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.files.len() - self.processed_count()
    }

    pub fn accepted_records(&self) -> usize {
        self.files.iter().map(|f| f.accepted).sum()
    }

    pub fn rejected_records(&self) -> usize {
        self.files.iter().map(|f| f.rejected).sum()
    }

    /// Report for `path`, if it was a candidate in this run
    pub fn file(&self, path: &Path) -> Option<&FileReport> {
        self.files.iter().find(|f| f.path == path)
    }
}

/// Drives ingestion runs against a [`CallEventStore`]
pub struct BatchOrchestrator<S> {
    store: S,
    guard: RunGuard,
    processed_dir: PathBuf,
    extension: String,
}

impl<S: CallEventStore> BatchOrchestrator<S> {
    pub fn new(store: S, config: &ParserConfig) -> Self {
        Self {
            store,
            guard: RunGuard::new(&config.lock_file),
            processed_dir: config.processed_dir.clone(),
            extension: config.extension.clone(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn guard(&self) -> &RunGuard {
        &self.guard
    }

    /// Process every ingestible file under `inbound`
    ///
    /// # Errors
    ///
    /// `AlreadyRunning`, `RunGuard`, `DirectoryNotFound`, `NoFilesFound`,
    /// `Scan` and `StorePrepareFailed`. The run marker is removed on every
    /// path once it has been created.
    pub async fn run(&self, inbound: &Path) -> Result<RunReport> {
        let run = self.guard.acquire()?;
        info!(marker = %run.marker().display(), "Run guard acquired");

        let files = scan(inbound, &self.extension, Some(&self.processed_dir))?;
        info!(
            inbound = %inbound.display(),
            count = files.len(),
            "Found files to process"
        );

        self.store
            .prepare()
            .await
            .map_err(IngestError::StorePrepareFailed)?;

        let mut report = RunReport::default();
        for path in files {
            report.files.push(self.process_file(path).await);
        }

        info!(
            files = report.files.len(),
            processed = report.processed_count(),
            failed = report.failed_count(),
            accepted = report.accepted_records(),
            rejected = report.rejected_records(),
            "Run complete"
        );

        Ok(report)
    }

    async fn process_file(&self, path: PathBuf) -> FileReport {
        let rows = match read_rows(&path) {
            Ok(rows) => rows,
            Err(source) => {
                let err = FileError::Read {
                    path: path.clone(),
                    source,
                };
                error!("{}", err);
                return failed(path, FileStatus::ReadFailed, None, err);
            }
        };

        let batch = validate(&rows, &path);
        for message in batch.error_messages() {
            warn!("{}", message);
        }

        if let Err(source) = self.store.create(&batch).await {
            let err = FileError::StoreWrite {
                path: path.clone(),
                source,
            };
            error!("{}", err);
            return failed(path, FileStatus::StoreFailed, Some(&batch), err);
        }

        match self.relocate(&path) {
            Ok(destination) => {
                info!(
                    file = %path.display(),
                    destination = %destination.display(),
                    accepted = batch.accepted().len(),
                    rejected = batch.rejected().len(),
                    "File processed"
                );
                FileReport {
                    path,
                    status: FileStatus::Processed,
                    accepted: batch.accepted().len(),
                    rejected: batch.rejected().len(),
                    detail: None,
                }
            }
            Err(err) => {
                error!("{}", err);
                failed(path, FileStatus::RelocateFailed, Some(&batch), err)
            }
        }
    }

    /// Move `path` to `<processed_dir>/<file name>`
    ///
    /// An existing file at the destination is never replaced; the source is
    /// left in the inbound directory instead.
    fn relocate(&self, path: &Path) -> std::result::Result<PathBuf, FileError> {
        let file_name = path.file_name().ok_or_else(|| FileError::Relocate {
            path: path.to_path_buf(),
            destination: self.processed_dir.clone(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
        })?;
        let destination = self.processed_dir.join(file_name);

        fs::create_dir_all(&self.processed_dir)
            .and_then(|()| {
                if fs::symlink_metadata(&destination).is_ok() {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        "a processed file with this name already exists",
                    ));
                }
                fs::rename(path, &destination)
            })
            .map_err(|source| FileError::Relocate {
                path: path.to_path_buf(),
                destination: destination.clone(),
                source,
            })?;

        Ok(destination)
    }
}

fn failed(
    path: PathBuf,
    status: FileStatus,
    batch: Option<&ValidatedBatch>,
    err: FileError,
) -> FileReport {
    FileReport {
        path,
        status,
        accepted: batch.map_or(0, |b| b.accepted().len()),
        rejected: batch.map_or(0, |b| b.rejected().len()),
        detail: Some(err.to_string()),
    }
}
