//! Staged CSV resource
//!
//! DuckDB's CSV reader consumes files, so host-supplied text is written to one
//! file per session before ingestion. Each write replaces the previous content.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

pub struct StagingArea {
    path: PathBuf,
}

impl StagingArea {
    /// Reserve a uniquely named staging file inside `dir`. Nothing is written yet.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref().join(format!("csv_analyzer_{}.csv", Uuid::new_v4()));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `content` as UTF-8, truncating whatever was staged before.
    pub fn write(&self, content: &str) -> io::Result<&Path> {
        fs::write(&self.path, content)?;
        debug!(path = %self.path.display(), bytes = content.len(), "CSV staged");
        Ok(&self.path)
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Could not remove staged CSV"),
        }
    }
}
