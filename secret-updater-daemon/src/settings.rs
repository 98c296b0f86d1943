use std::time::Duration;

pub use secret_updater_store::PATCH_TIMEOUT;

pub const DEFAULT_CERT_DIR: &str = "/certs";

/// Quiet interval before reading. The issuing sidecar rewrites each file
/// several times and may emit several coordinated updates within ~30 ms.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);

pub const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Timing knobs for a synchronization task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    pub debounce: Duration,
    pub retry_delay: Duration,
    pub patch_timeout: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            debounce: DEBOUNCE_WINDOW,
            retry_delay: RETRY_DELAY,
            patch_timeout: PATCH_TIMEOUT,
        }
    }
}
