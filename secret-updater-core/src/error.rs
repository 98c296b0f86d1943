//! Error types for secret-updater-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::WatchedFile;

/// Failure to read the credential triple from disk.
///
/// Never retried by the caller: a missing or unreadable file is only fixed by
/// the next write to the watched directory.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read {file} at {path}: {source}")]
    Read {
        file: WatchedFile,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SnapshotError {
    /// Path of the file that could not be read.
    pub fn path(&self) -> &std::path::Path {
        match self {
            SnapshotError::Read { path, .. } => path,
        }
    }
}
