use std::path::PathBuf;
use std::sync::Arc;

use notify::{recommended_watcher, Event, RecommendedWatcher, RecursiveMode, Watcher};
use secret_updater_core::WatchedFiles;
use secret_updater_store::{CredentialStore, KubeSecretStore};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{io_err, DaemonError};
use crate::filter::qualifying_write;
use crate::scheduler::{Supervisor, Trigger};
use crate::settings::SyncSettings;

/// Everything read from the environment at startup.
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    pub secret_name: String,
    pub secret_namespace: String,
    pub cert_dir: PathBuf,
    pub settings: SyncSettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Build the runtime, connect to the cluster and run until a shutdown signal
/// or a fatal watcher error.
pub fn start_blocking(config: UpdaterConfig) -> Result<(), DaemonError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;

    runtime.block_on(run_in_cluster(config))
}

async fn run_in_cluster(config: UpdaterConfig) -> Result<(), DaemonError> {
    let store = KubeSecretStore::in_cluster(&config.secret_name, &config.secret_namespace)?;
    let shutdown = CancellationToken::new();

    let signal_handle = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let result = wait_for_shutdown_signal().await;
            shutdown.cancel();
            result
        })
    };

    let files = WatchedFiles::in_dir(&config.cert_dir);
    let result = run(files, Arc::new(store), config.settings, shutdown).await;

    if signal_handle.is_finished() {
        signal_handle.await.map_err(|source| DaemonError::Join {
            task: "signal_handler",
            source,
        })??;
    } else {
        signal_handle.abort();
    }
    result
}

/// Watch `files` and keep the store in sync until `shutdown` is cancelled.
pub async fn run(
    files: WatchedFiles,
    store: Arc<dyn CredentialStore>,
    settings: SyncSettings,
    shutdown: CancellationToken,
) -> Result<(), DaemonError> {
    tracing::info!(dir = %files.dir().display(), "setting up certificate directory watch");

    let (event_tx, event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
    let mut watcher: RecommendedWatcher = recommended_watcher(move |event| {
        let _ = event_tx.send(event);
    })?;
    // The directory, not the files: files created later still report writes.
    watcher.watch(files.dir(), RecursiveMode::NonRecursive)?;

    let supervisor = Supervisor::new(store, files, settings, shutdown.clone());
    let result = event_loop(event_rx, supervisor, shutdown).await;
    drop(watcher);
    result
}

/// Decision loop: one pass per notification, in delivery order.
///
/// Starts an initial sync when the whole triple is already on disk. Returns
/// once `shutdown` is cancelled, the event channel closes, or the watcher
/// reports an error; the live task is stopped before returning.
pub async fn event_loop(
    mut events: mpsc::UnboundedReceiver<notify::Result<Event>>,
    mut supervisor: Supervisor,
    shutdown: CancellationToken,
) -> Result<(), DaemonError> {
    if supervisor.files().all_exist() {
        tracing::info!("all certificate files exist, syncing secret");
        supervisor.supersede(Trigger::Startup);
    } else {
        tracing::info!("not all certificate files exist, skipping the initial sync");
    }

    tracing::info!(dir = %supervisor.files().dir().display(), "watching for changes");

    let result = loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                tracing::info!("received shutdown signal, exiting");
                break Ok(());
            }
            event = events.recv() => {
                let Some(event) = event else {
                    tracing::warn!("watcher event channel closed");
                    break Ok(());
                };
                match event {
                    Ok(event) => {
                        if let Some(file) = qualifying_write(&event, supervisor.files()) {
                            tracing::info!(
                                path = %supervisor.files().path(file).display(),
                                "detected change",
                            );
                            supervisor.supersede(Trigger::Change(file));
                        }
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "watcher error");
                        break Err(DaemonError::Notify(err));
                    }
                }
            }
        }
    };

    // Join before reporting any loop error so the live task never outlives us.
    supervisor.shutdown().await?;
    result
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<(), DaemonError> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate =
        signal(SignalKind::terminate()).map_err(|e| io_err("SIGTERM handler", e))?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.map_err(|e| io_err("ctrl-c handler", e))?;
            tracing::info!("received ctrl-c");
        }
        _ = terminate.recv() => tracing::info!("received SIGTERM"),
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<(), DaemonError> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| io_err("ctrl-c handler", e))?;
    tracing::info!("received ctrl-c");
    Ok(())
}

pub fn init_tracing(format: LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = match format {
        LogFormat::Text => fmt().with_env_filter(filter).with_target(false).try_init(),
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .try_init(),
    };
}
