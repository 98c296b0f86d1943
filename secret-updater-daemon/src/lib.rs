//! Secret updater runtime: change filter + sync scheduler + process wiring.

mod error;
pub mod filter;
pub mod runtime;
pub mod scheduler;
pub mod settings;

pub use error::DaemonError;
pub use runtime::{event_loop, init_tracing, run, start_blocking, LogFormat, UpdaterConfig};
pub use scheduler::{Phase, Supervisor, TaskGeneration, TaskOutcome, Trigger};
pub use settings::SyncSettings;
