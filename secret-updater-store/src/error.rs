//! Error types for secret-updater-store.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The API server rejected the patch or could not be reached.
    #[error("patch of secret {namespace}/{name} failed: {source}")]
    Api {
        name: String,
        namespace: String,
        #[source]
        source: kube::Error,
    },

    #[error("patch call timed out after {0:?}")]
    Timeout(Duration),

    /// Not running inside a cluster, or the service account mount is unusable.
    #[error("in-cluster configuration unavailable: {0}")]
    InCluster(#[from] kube::config::InClusterError),

    #[error("failed to build cluster client: {0}")]
    Client(#[source] kube::Error),
}
