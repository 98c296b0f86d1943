//! Patch body construction and the bounded-timeout call wrapper.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use secret_updater_core::{CredentialTriple, WatchedFile};
use serde::Serialize;

use crate::{CredentialStore, PatchAttemptResult, StoreError};

/// Field manager recorded on every patch.
pub const FIELD_MANAGER: &str = "mtls-secret-updater";

/// Upper bound for a single patch call, independent of task cancellation.
pub const PATCH_TIMEOUT: Duration = Duration::from_secs(5);

/// `{"stringData": {"ca.crt": …, "tls.crt": …, "tls.key": …}}`
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct PatchBody<'a> {
    #[serde(rename = "stringData")]
    string_data: BTreeMap<&'static str, Cow<'a, str>>,
}

impl<'a> PatchBody<'a> {
    pub fn from_triple(triple: &'a CredentialTriple) -> Self {
        let string_data = WatchedFile::ALL
            .into_iter()
            .map(|file| (file.data_key(), triple.text(file)))
            .collect();
        Self { string_data }
    }
}

// The API client may debug-log the patch; print keys only.
impl fmt::Debug for PatchBody<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchBody")
            .field("stringData", &self.string_data.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Run one patch call, giving up after `limit`.
///
/// The call is not raced against any outer cancellation: the caller decides
/// what to do with the result once it returns.
pub async fn patch_bounded<S>(
    store: &S,
    triple: &CredentialTriple,
    limit: Duration,
) -> PatchAttemptResult
where
    S: CredentialStore + ?Sized,
{
    match tokio::time::timeout(limit, store.patch(triple)).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}
