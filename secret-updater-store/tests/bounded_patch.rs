use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use secret_updater_core::CredentialTriple;
use secret_updater_store::{
    patch_bounded, CredentialStore, PatchAttemptResult, StoreError, PATCH_TIMEOUT,
};
use tokio::time::Instant;

struct SlowStore {
    delay: Duration,
    calls: AtomicUsize,
}

#[async_trait]
impl CredentialStore for SlowStore {
    async fn patch(&self, _triple: &CredentialTriple) -> PatchAttemptResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    fn target(&self) -> String {
        "test/slow".to_string()
    }
}

fn triple() -> CredentialTriple {
    CredentialTriple::new(b"CA".to_vec(), b"CERT".to_vec(), b"KEY".to_vec())
}

#[tokio::test(start_paused = true, flavor = "current_thread")]
async fn call_within_limit_returns_store_result() {
    let store = SlowStore {
        delay: Duration::from_secs(1),
        calls: AtomicUsize::new(0),
    };

    let result = patch_bounded(&store, &triple(), PATCH_TIMEOUT).await;
    assert!(result.is_ok(), "got: {result:?}");
    assert_eq!(store.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true, flavor = "current_thread")]
async fn call_past_limit_times_out() {
    let store = SlowStore {
        delay: Duration::from_secs(30),
        calls: AtomicUsize::new(0),
    };
    let started = Instant::now();

    let err = patch_bounded(&store, &triple(), PATCH_TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Timeout(limit) if limit == PATCH_TIMEOUT));
    let elapsed = started.elapsed();
    assert!(elapsed >= PATCH_TIMEOUT && elapsed < Duration::from_secs(30), "elapsed {elapsed:?}");
    assert!(err.to_string().contains("timed out"));
}

#[tokio::test(start_paused = true, flavor = "current_thread")]
async fn works_through_trait_object() {
    let store: Box<dyn CredentialStore> = Box::new(SlowStore {
        delay: Duration::from_millis(10),
        calls: AtomicUsize::new(0),
    });

    tokio_test::assert_ok!(patch_bounded(store.as_ref(), &triple(), PATCH_TIMEOUT).await);
    assert_eq!(store.target(), "test/slow");
}
