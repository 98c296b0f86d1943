//! Reads the credential triple from disk.

use std::fs;

use crate::error::SnapshotError;
use crate::types::{CredentialTriple, WatchedFile, WatchedFiles};

/// Read all three files fully, in [`WatchedFile::ALL`] order.
///
/// Stops at the first failure and reports the failing path; no partial
/// triple is ever returned.
pub fn read_snapshot(files: &WatchedFiles) -> Result<CredentialTriple, SnapshotError> {
    let read = |file: WatchedFile| {
        let path = files.path(file);
        fs::read(path).map_err(|source| SnapshotError::Read {
            file,
            path: path.to_path_buf(),
            source,
        })
    };

    let ca_cert = read(WatchedFile::CaCert)?;
    let tls_cert = read(WatchedFile::TlsCert)?;
    let tls_key = read(WatchedFile::TlsKey)?;
    Ok(CredentialTriple::new(ca_cert, tls_cert, tls_key))
}
