//! Error types for call event ingestion
//!
//! Three tiers, matching how far a failure is allowed to travel:
//!
//! - [`IngestError`] aborts the whole run and is the only error a caller of
//!   [`crate::orchestrator::BatchOrchestrator::run`] ever sees.
//! - [`FileError`] is absorbed per file: it is logged, recorded in the run
//!   report, and the file stays in the inbound directory.
//! - Record rejections live in [`crate::validation`] and never leave the
//!   batch they were found in.

use crate::store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for run-level operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Conditions that end a run before or instead of per-file processing
#[derive(Error, Debug)]
pub enum IngestError {
    /// Another run holds the marker
    #[error("A parsing process is currently running ('{}' exists), exiting", .marker.display())]
    AlreadyRunning { marker: PathBuf },

    /// The marker could not be created for a reason other than already existing
    #[error("Could not create run marker '{}': {source}", .marker.display())]
    RunGuard {
        marker: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Inbound root is missing
    #[error("Directory does not exist: '{}'", .0.display())]
    DirectoryNotFound(PathBuf),

    /// Inbound root holds no ingestible files
    #[error("No CSV files found in '{}'", .0.display())]
    NoFilesFound(PathBuf),

    /// Walking the inbound tree failed part way
    #[error("Failed to scan inbound directory: {0}")]
    Scan(#[from] walkdir::Error),

    /// Destination schema could not be ensured
    #[error("Store preparation failed: {0}")]
    StorePrepareFailed(#[source] StoreError),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

impl IngestError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Failures confined to a single inbound file
#[derive(Error, Debug)]
pub enum FileError {
    #[error("could not open '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Database write error for file '{}': {source}", .path.display())]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    #[error("could not move '{}' to '{}': {source}", .path.display(), .destination.display())]
    Relocate {
        path: PathBuf,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
