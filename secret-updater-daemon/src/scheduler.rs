//! Synchronization scheduler: turns change notifications into at most one
//! live sync task at a time.
//!
//! A task walks `debouncing → reading → patching ⇄ retrying` and ends in
//! `succeeded`, `cancelled` or `aborted`. The [`Supervisor`] owns the only
//! handle to the live task; [`Supervisor::supersede`] cancels it and starts a
//! replacement in one step.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use secret_updater_core::{read_snapshot, CredentialTriple, WatchedFile, WatchedFiles};
use secret_updater_store::{patch_bounded, CredentialStore};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::DaemonError;
use crate::settings::SyncSettings;

// ---------------------------------------------------------------------------
// Task identity and state
// ---------------------------------------------------------------------------

/// Monotonic per-process task counter, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskGeneration(pub u64);

impl fmt::Display for TaskGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Debouncing,
    Reading,
    Patching,
    Retrying,
    Succeeded,
    Cancelled,
    Aborted,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Succeeded | Phase::Cancelled | Phase::Aborted)
    }
}

/// How a task body ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded { attempts: u32 },
    Cancelled,
    /// The snapshot could not be read; only a later change restarts work.
    Aborted,
}

impl TaskOutcome {
    pub fn phase(self) -> Phase {
        match self {
            TaskOutcome::Succeeded { .. } => Phase::Succeeded,
            TaskOutcome::Cancelled => Phase::Cancelled,
            TaskOutcome::Aborted => Phase::Aborted,
        }
    }
}

/// Why a task was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Startup,
    Change(WatchedFile),
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Startup => f.write_str("startup"),
            Trigger::Change(file) => write!(f, "change in {file}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

struct ActiveTask {
    generation: TaskGeneration,
    cancel: CancellationToken,
    phase: watch::Receiver<Phase>,
    handle: JoinHandle<TaskOutcome>,
}

/// Single owner of the live sync task.
///
/// Task tokens are children of `root`, so cancelling `root` reaches the live
/// task's waits directly and stops [`Supervisor::supersede`] from starting
/// anything new.
pub struct Supervisor {
    store: Arc<dyn CredentialStore>,
    files: Arc<WatchedFiles>,
    settings: SyncSettings,
    root: CancellationToken,
    last_generation: u64,
    active: Option<ActiveTask>,
}

impl Supervisor {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        files: WatchedFiles,
        settings: SyncSettings,
        root: CancellationToken,
    ) -> Self {
        Self {
            store,
            files: Arc::new(files),
            settings,
            root,
            last_generation: 0,
            active: None,
        }
    }

    pub fn files(&self) -> &WatchedFiles {
        &self.files
    }

    /// Cancel the live task (if any) and start a new one.
    ///
    /// Returns `None` once shutdown has begun. The new task does not read or
    /// patch until the cancelled one has fully stopped.
    pub fn supersede(&mut self, trigger: Trigger) -> Option<TaskGeneration> {
        if self.root.is_cancelled() {
            tracing::debug!(%trigger, "shutdown in progress, not starting a sync task");
            return None;
        }

        let predecessor = self.active.take().map(|previous| {
            previous.cancel.cancel();
            tracing::debug!(generation = %previous.generation, "superseded sync task");
            previous.handle
        });

        self.last_generation += 1;
        let generation = TaskGeneration(self.last_generation);
        let cancel = self.root.child_token();
        let (phase_tx, phase_rx) = watch::channel(Phase::Debouncing);

        let task = SyncTask {
            generation,
            cancel: cancel.clone(),
            phase: phase_tx,
            store: self.store.clone(),
            files: self.files.clone(),
            settings: self.settings,
        };
        tracing::debug!(%generation, %trigger, "starting sync task");
        let handle = tokio::spawn(task.run(predecessor));

        self.active = Some(ActiveTask {
            generation,
            cancel,
            phase: phase_rx,
            handle,
        });
        Some(generation)
    }

    pub fn active_generation(&self) -> Option<TaskGeneration> {
        self.active.as_ref().map(|task| task.generation)
    }

    /// Current phase of the most recently started task.
    pub fn active_phase(&self) -> Option<Phase> {
        self.active.as_ref().map(|task| *task.phase.borrow())
    }

    /// Phase updates of the most recently started task; keeps reporting after
    /// the task has been superseded.
    pub fn subscribe_phase(&self) -> Option<watch::Receiver<Phase>> {
        self.active.as_ref().map(|task| task.phase.clone())
    }

    /// Wait for the most recent task to finish on its own.
    pub async fn join_active(&mut self) -> Result<Option<TaskOutcome>, DaemonError> {
        match self.active.take() {
            Some(task) => join_task(task).await.map(Some),
            None => Ok(None),
        }
    }

    /// Cancel the most recent task and wait for it to stop.
    ///
    /// Bounded by the patch timeout when a call is outstanding.
    pub async fn shutdown(&mut self) -> Result<Option<TaskOutcome>, DaemonError> {
        match self.active.take() {
            Some(task) => {
                task.cancel.cancel();
                join_task(task).await.map(Some)
            }
            None => Ok(None),
        }
    }
}

async fn join_task(task: ActiveTask) -> Result<TaskOutcome, DaemonError> {
    task.handle.await.map_err(|source| DaemonError::Join {
        task: "sync",
        source,
    })
}

// ---------------------------------------------------------------------------
// Task body
// ---------------------------------------------------------------------------

struct SyncTask {
    generation: TaskGeneration,
    cancel: CancellationToken,
    phase: watch::Sender<Phase>,
    store: Arc<dyn CredentialStore>,
    files: Arc<WatchedFiles>,
    settings: SyncSettings,
}

impl SyncTask {
    async fn run(self, predecessor: Option<JoinHandle<TaskOutcome>>) -> TaskOutcome {
        let outcome = self.drive(predecessor).await;
        self.enter(outcome.phase());
        outcome
    }

    async fn drive(&self, predecessor: Option<JoinHandle<TaskOutcome>>) -> TaskOutcome {
        // The predecessor is awaited even when this task is cancelled, so a
        // chain of superseded tasks drains in order.
        let predecessor_done = async {
            if let Some(handle) = predecessor {
                if let Err(err) = handle.await {
                    tracing::error!(
                        generation = %self.generation,
                        error = %err,
                        "previous sync task failed",
                    );
                }
            }
        };
        let (debounced, ()) = tokio::join!(self.wait(self.settings.debounce), predecessor_done);
        // Cancellation may land after the debounce but while the predecessor
        // is still draining.
        if !debounced || self.cancel.is_cancelled() {
            tracing::debug!(generation = %self.generation, "sync task cancelled while debouncing");
            return TaskOutcome::Cancelled;
        }

        self.enter(Phase::Reading);
        let triple = match self.read().await {
            Some(triple) => triple,
            None if self.cancel.is_cancelled() => return TaskOutcome::Cancelled,
            None => return TaskOutcome::Aborted,
        };

        let mut attempts = 0u32;
        loop {
            if self.cancel.is_cancelled() {
                tracing::debug!(
                    generation = %self.generation,
                    "sync task cancelled before patching",
                );
                return TaskOutcome::Cancelled;
            }

            self.enter(Phase::Patching);
            attempts += 1;
            tracing::info!(
                generation = %self.generation,
                attempt = attempts,
                target = %self.store.target(),
                "patching secret",
            );
            let result =
                patch_bounded(self.store.as_ref(), &triple, self.settings.patch_timeout).await;

            if self.cancel.is_cancelled() {
                tracing::debug!(
                    generation = %self.generation,
                    "discarding patch result of cancelled sync task",
                );
                return TaskOutcome::Cancelled;
            }

            match result {
                Ok(()) => {
                    tracing::info!(
                        generation = %self.generation,
                        attempts,
                        target = %self.store.target(),
                        "patched secret",
                    );
                    return TaskOutcome::Succeeded { attempts };
                }
                Err(err) => {
                    tracing::warn!(
                        generation = %self.generation,
                        attempt = attempts,
                        error = %err,
                        retry_in = ?self.settings.retry_delay,
                        "error patching secret, will retry",
                    );
                }
            }

            self.enter(Phase::Retrying);
            if !self.wait(self.settings.retry_delay).await {
                tracing::debug!(
                    generation = %self.generation,
                    "sync task cancelled, stopping patch attempts",
                );
                return TaskOutcome::Cancelled;
            }
        }
    }

    async fn read(&self) -> Option<CredentialTriple> {
        let files = self.files.clone();
        match tokio::task::spawn_blocking(move || read_snapshot(&files)).await {
            Ok(Ok(triple)) => Some(triple),
            Ok(Err(err)) if self.cancel.is_cancelled() => {
                tracing::debug!(
                    generation = %self.generation,
                    error = %err,
                    "ignoring read failure of cancelled sync task",
                );
                None
            }
            Ok(Err(err)) => {
                tracing::warn!(
                    generation = %self.generation,
                    path = %err.path().display(),
                    error = %err,
                    "error reading certificate files, waiting for next change",
                );
                None
            }
            Err(err) => {
                tracing::error!(
                    generation = %self.generation,
                    error = %err,
                    "snapshot reader failed",
                );
                None
            }
        }
    }

    /// `false` if cancellation won, including when it lands in the same
    /// instant the delay elapses.
    async fn wait(&self, delay: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => !self.cancel.is_cancelled(),
        }
    }

    fn enter(&self, phase: Phase) {
        self.phase.send_replace(phase);
    }
}
