use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tempfile::{TempDir, TempPath};
use tracing::{debug, warn};

use crate::viewfinder::common::error::{Result, ViewfinderError};

/// Cooperative cancellation shared between the owner of a capture and the
/// code running it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(ViewfinderError::Cancelled);
        }
        Ok(())
    }
}

/// State of one capture operation: a private staging directory for the
/// stills and the cancellation token of whoever started it.
///
/// Each operation gets its own session, so a new capture never sees files
/// left by a previous one. Dropping the session removes the directory and
/// anything still staged in it.
#[derive(Debug)]
pub struct BracketSession {
    staging: TempDir,
    cancel: CancellationToken,
}

impl BracketSession {
    /// Session staging under the system temporary directory.
    pub fn new(cancel: CancellationToken) -> Result<Self> {
        let staging = tempfile::Builder::new().prefix("bracket_").tempdir()?;
        debug!(path = %staging.path().display(), "Bracket session opened");
        Ok(Self { staging, cancel })
    }

    /// Session staging under `parent`.
    pub fn in_dir(parent: &Path, cancel: CancellationToken) -> Result<Self> {
        let staging = tempfile::Builder::new()
            .prefix("bracket_")
            .tempdir_in(parent)?;
        debug!(path = %staging.path().display(), "Bracket session opened");
        Ok(Self { staging, cancel })
    }

    pub fn staging_dir(&self) -> &Path {
        self.staging.path()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Reserves an empty staging file for one shot. The file is deleted when
    /// the returned path is dropped.
    pub fn stage(&self, shot: usize, suffix: &str) -> Result<TempPath> {
        let file = tempfile::Builder::new()
            .prefix(&format!("cap_{shot}_"))
            .suffix(suffix)
            .tempfile_in(self.staging.path())?;
        Ok(file.into_temp_path())
    }

    /// Deletes a staged file now, logging instead of failing.
    pub fn discard(&self, staged: TempPath) {
        let path = staged.to_path_buf();
        if let Err(e) = staged.close() {
            warn!(path = %path.display(), error = %e, "Failed to remove staged still");
        }
    }

    /// Removes the staging directory, reporting any error.
    pub fn close(self) -> Result<()> {
        debug!(path = %self.staging.path().display(), "Bracket session closed");
        self.staging.close()?;
        Ok(())
    }
}
