//! In-cluster Secret patching through the Kubernetes API.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, Patch, PatchParams};
use kube::{Client, Config};
use secret_updater_core::CredentialTriple;

use crate::patch::{PatchBody, FIELD_MANAGER};
use crate::{CredentialStore, PatchAttemptResult, StoreError};

/// Patches one named Secret in one namespace.
#[derive(Clone)]
pub struct KubeSecretStore {
    api: Api<Secret>,
    name: String,
    namespace: String,
}

impl KubeSecretStore {
    pub fn new(client: Client, name: impl Into<String>, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            api: Api::namespaced(client, &namespace),
            name: name.into(),
            namespace,
        }
    }

    /// Bootstrap a client from the pod's service account.
    pub fn in_cluster(
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let config = Config::incluster()?;
        tracing::debug!(cluster_url = %config.cluster_url, "loaded in-cluster configuration");
        let client = Client::try_from(config).map_err(StoreError::Client)?;
        Ok(Self::new(client, name, namespace))
    }

    fn params() -> PatchParams {
        PatchParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..PatchParams::default()
        }
    }
}

#[async_trait]
impl CredentialStore for KubeSecretStore {
    async fn patch(&self, triple: &CredentialTriple) -> PatchAttemptResult {
        let body = PatchBody::from_triple(triple);
        self.api
            .patch(&self.name, &Self::params(), &Patch::Strategic(&body))
            .await
            .map(|_| ())
            .map_err(|source| StoreError::Api {
                name: self.name.clone(),
                namespace: self.namespace.clone(),
                source,
            })
    }

    fn target(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}
