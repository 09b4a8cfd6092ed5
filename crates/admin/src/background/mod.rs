//! Background tasks and scheduled jobs.
//!
//! Each submodule provides a long-running async function intended to be
//! spawned via `tokio::spawn`. All tasks accept a [`CancellationToken`]
//! for graceful shutdown. Cancellation suppresses future ticks; a pass that
//! is already running finishes first.

pub mod archive_job;
pub mod sync_job;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

/// Handles to the spawned scheduler tasks.
pub struct BackgroundJobs {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl BackgroundJobs {
    /// Spawn the reconciliation and archival jobs.
    ///
    /// Both run once immediately, then on their configured period.
    #[must_use]
    pub fn start(state: &AppState) -> Self {
        let cancel = CancellationToken::new();
        let config = state.config();

        let handles = vec![
            tokio::spawn(sync_job::run(
                state.sync().clone(),
                config.sync.interval,
                cancel.clone(),
            )),
            tokio::spawn(archive_job::run(
                state.archive().clone(),
                config.archive.interval,
                cancel.clone(),
            )),
        ];

        Self { cancel, handles }
    }

    /// Stop scheduling new passes.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Stop and wait for every job to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Background job panicked");
            }
        }
    }
}
