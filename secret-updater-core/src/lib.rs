//! Core types for the mTLS secret updater.
//!
//! - [`types`] — the watched credential files and the in-memory triple
//! - [`snapshot`] — reads the three files as one unit
//! - [`error`] — [`SnapshotError`]

pub mod error;
pub mod snapshot;
pub mod types;

pub use error::SnapshotError;
pub use snapshot::read_snapshot;
pub use types::{CredentialTriple, WatchedFile, WatchedFiles};
