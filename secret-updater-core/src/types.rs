//! Domain types for the watched credential files.
//!
//! The set of files is fixed: a CA certificate, a leaf certificate and its
//! private key, always living side by side in one directory.

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// WatchedFile
// ---------------------------------------------------------------------------

/// One member of the credential triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchedFile {
    CaCert,
    TlsCert,
    TlsKey,
}

impl WatchedFile {
    /// All members, in the order they are read.
    pub const ALL: [WatchedFile; 3] = [
        WatchedFile::CaCert,
        WatchedFile::TlsCert,
        WatchedFile::TlsKey,
    ];

    /// File name inside the certificate directory.
    pub fn file_name(self) -> &'static str {
        match self {
            WatchedFile::CaCert => "ca.crt",
            WatchedFile::TlsCert => "tls.crt",
            WatchedFile::TlsKey => "tls.key",
        }
    }

    /// Key under which the file's content is stored in the secret.
    pub fn data_key(self) -> &'static str {
        // Secret keys mirror the file names written by the issuing sidecar.
        self.file_name()
    }

    fn index(self) -> usize {
        match self {
            WatchedFile::CaCert => 0,
            WatchedFile::TlsCert => 1,
            WatchedFile::TlsKey => 2,
        }
    }
}

impl fmt::Display for WatchedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

// ---------------------------------------------------------------------------
// WatchedFiles
// ---------------------------------------------------------------------------

/// Absolute locations of the three watched files.
///
/// Built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedFiles {
    dir: PathBuf,
    paths: [PathBuf; 3],
}

impl WatchedFiles {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let paths = WatchedFile::ALL.map(|file| dir.join(file.file_name()));
        Self { dir, paths }
    }

    /// Directory holding the triple; this is what gets watched.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file: WatchedFile) -> &Path {
        &self.paths[file.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (WatchedFile, &Path)> {
        WatchedFile::ALL
            .into_iter()
            .map(move |file| (file, self.path(file)))
    }

    /// Exact match against the watched paths; no normalisation is applied.
    pub fn match_path(&self, path: &Path) -> Option<WatchedFile> {
        self.iter()
            .find(|(_, watched)| *watched == path)
            .map(|(file, _)| file)
    }

    /// `true` when every member of the triple is present on disk.
    pub fn all_exist(&self) -> bool {
        self.paths.iter().all(|path| path.exists())
    }
}

// ---------------------------------------------------------------------------
// CredentialTriple
// ---------------------------------------------------------------------------

/// Raw bytes of the three files, captured together.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialTriple {
    contents: [Vec<u8>; 3],
}

impl CredentialTriple {
    pub fn new(ca_cert: Vec<u8>, tls_cert: Vec<u8>, tls_key: Vec<u8>) -> Self {
        Self {
            contents: [ca_cert, tls_cert, tls_key],
        }
    }

    pub fn get(&self, file: WatchedFile) -> &[u8] {
        &self.contents[file.index()]
    }

    /// File content as text; invalid UTF-8 is replaced with U+FFFD.
    pub fn text(&self, file: WatchedFile) -> Cow<'_, str> {
        String::from_utf8_lossy(self.get(file))
    }
}

// Keep key material out of logs.
impl fmt::Debug for CredentialTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("CredentialTriple");
        for file in WatchedFile::ALL {
            out.field(file.file_name(), &format_args!("<{} bytes>", self.get(file).len()));
        }
        out.finish()
    }
}
