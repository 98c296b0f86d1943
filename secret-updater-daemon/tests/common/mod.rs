#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use notify::event::{CreateKind, DataChange, ModifyKind};
use notify::{Event, EventKind};
use secret_updater_core::CredentialTriple;
use secret_updater_store::{CredentialStore, PatchAttemptResult, StoreError};
use tempfile::TempDir;

/// In-memory store that records every call and can be told to fail.
#[derive(Default)]
pub struct RecordingStore {
    calls: Mutex<Vec<CredentialTriple>>,
    failures_remaining: AtomicU32,
    call_delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    panic_next: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fails the next `failures` calls; `u32::MAX` fails forever.
    pub fn failing(failures: u32) -> Arc<Self> {
        let store = Self::default();
        store.failures_remaining.store(failures, Ordering::SeqCst);
        Arc::new(store)
    }

    pub fn with_delay(call_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            call_delay,
            ..Self::default()
        })
    }

    /// The next call panics instead of returning.
    pub fn panicking_once() -> Arc<Self> {
        let store = Self::default();
        store.panic_next.store(true, Ordering::SeqCst);
        Arc::new(store)
    }

    pub fn set_failures(&self, failures: u32) {
        self.failures_remaining.store(failures, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<CredentialTriple> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialStore for RecordingStore {
    async fn patch(&self, triple: &CredentialTriple) -> PatchAttemptResult {
        if self.panic_next.swap(false, Ordering::SeqCst) {
            panic!("store client crashed");
        }
        self.calls.lock().unwrap().push(triple.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.call_delay.is_zero() {
            tokio::time::sleep(self.call_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            if remaining != u32::MAX {
                self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            }
            return Err(StoreError::Timeout(Duration::from_secs(5)));
        }
        Ok(())
    }

    fn target(&self) -> String {
        "test/recording".to_string()
    }
}

/// Temp dir holding a complete triple with `-v1` contents.
pub fn cert_dir() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    write_file(dir.path(), "ca.crt", "CA-v1");
    write_file(dir.path(), "tls.crt", "CERT-v1");
    write_file(dir.path(), "tls.key", "KEY-v1");
    dir
}

pub fn write_file(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).expect("write cert file");
}

pub fn write_event(path: &Path) -> notify::Result<Event> {
    Ok(Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
        .add_path(path.to_path_buf()))
}

pub fn create_event(path: &Path) -> notify::Result<Event> {
    Ok(Event::new(EventKind::Create(CreateKind::File)).add_path(path.to_path_buf()))
}
