//! Single-run guard backed by a marker file
//!
//! The marker's existence is the only record of an active run. Acquiring
//! creates it with `create_new`, which fails if the file already exists, so
//! two invocations on the same host cannot both succeed. The returned
//! [`ActiveRun`] removes the marker when dropped.

use crate::error::{IngestError, Result};
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Marker-file mutual exclusion for ingestion runs
#[derive(Debug, Clone)]
pub struct RunGuard {
    marker: PathBuf,
}

impl RunGuard {
    pub fn new(marker: impl Into<PathBuf>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn marker(&self) -> &Path {
        &self.marker
    }

    /// True while the marker file exists
    pub fn is_active(&self) -> bool {
        self.marker.exists()
    }

    /// Create the marker, failing with `AlreadyRunning` if it exists
    ///
    /// Not reentrant: acquiring twice without releasing fails the second time.
    pub fn acquire(&self) -> Result<ActiveRun<'_>> {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.marker)
        {
            Ok(_) => {
                debug!(marker = %self.marker.display(), "Run marker created");
                Ok(ActiveRun { guard: self })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(IngestError::AlreadyRunning {
                marker: self.marker.clone(),
            }),
            Err(source) => Err(IngestError::RunGuard {
                marker: self.marker.clone(),
                source,
            }),
        }
    }

    /// Remove the marker if present. Never fails; problems are logged.
    pub fn release(&self) {
        match std::fs::remove_file(&self.marker) {
            Ok(()) => debug!(marker = %self.marker.display(), "Run marker removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                marker = %self.marker.display(),
                error = %e,
                "Failed to remove run marker"
            ),
        }
    }
}

/// Held for the duration of a run; releases the guard on drop
#[derive(Debug)]
#[must_use = "the run guard is released as soon as this value is dropped"]
pub struct ActiveRun<'a> {
    guard: &'a RunGuard,
}

impl ActiveRun<'_> {
    pub fn marker(&self) -> &Path {
        self.guard.marker()
    }
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        self.guard.release();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn guard_in(dir: &TempDir) -> RunGuard {
        RunGuard::new(dir.path().join("running"))
    }

    #[test]
    fn test_acquire_creates_empty_marker() {
        let dir = TempDir::new().unwrap();
        let guard = guard_in(&dir);
        assert!(!guard.is_active());

        let run = guard.acquire().unwrap();
        assert!(guard.is_active());
        assert_eq!(std::fs::metadata(run.marker()).unwrap().len(), 0);
    }

    #[test]
    fn test_second_acquire_fails_while_held() {
        let dir = TempDir::new().unwrap();
        let guard = guard_in(&dir);

        let _run = guard.acquire().unwrap();
        let err = guard.acquire().unwrap_err();
        assert!(matches!(err, IngestError::AlreadyRunning { .. }));
    }

    #[test]
    fn test_existing_marker_blocks_acquire() {
        let dir = TempDir::new().unwrap();
        let guard = guard_in(&dir);
        std::fs::write(guard.marker(), b"").unwrap();

        assert!(matches!(
            guard.acquire(),
            Err(IngestError::AlreadyRunning { .. })
        ));
        // A failed acquire must not remove someone else's marker
        assert!(guard.is_active());
    }

    #[test]
    fn test_drop_releases_and_allows_reacquire() {
        let dir = TempDir::new().unwrap();
        let guard = guard_in(&dir);

        {
            let _run = guard.acquire().unwrap();
        }
        assert!(!guard.is_active());

        let _run = guard.acquire().unwrap();
        assert!(guard.is_active());
    }

    #[test]
    fn test_release_without_marker_is_harmless() {
        let dir = TempDir::new().unwrap();
        let guard = guard_in(&dir);
        guard.release();
        guard.release();
        assert!(!guard.is_active());
    }

    #[test]
    fn test_unwritable_marker_location_is_reported() {
        let dir = TempDir::new().unwrap();
        let guard = RunGuard::new(dir.path().join("missing").join("running"));

        assert!(matches!(guard.acquire(), Err(IngestError::RunGuard { .. })));
    }
}
