//! # secret-updater-store
//!
//! Credential store client: pushes a [`CredentialTriple`] into a namespaced
//! Secret as a merge patch.
//!
//! [`CredentialStore`] is the seam the scheduler drives; [`KubeSecretStore`]
//! is the in-cluster implementation. Wrap calls in [`patch_bounded`] to apply
//! the per-call timeout.
//!
//! [`CredentialTriple`]: secret_updater_core::CredentialTriple

pub mod error;
pub mod kube_store;
pub mod patch;

use async_trait::async_trait;
use secret_updater_core::CredentialTriple;

pub use error::StoreError;
pub use kube_store::KubeSecretStore;
pub use patch::{patch_bounded, PatchBody, FIELD_MANAGER, PATCH_TIMEOUT};

/// Result of one patch call. Every error is retryable.
pub type PatchAttemptResult = Result<(), StoreError>;

/// Destination of the credential triple.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Apply the triple to the target object.
    async fn patch(&self, triple: &CredentialTriple) -> PatchAttemptResult;

    /// Human-readable target, used in log fields.
    fn target(&self) -> String;
}
