//! Periodic reconciliation sweep.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::services::{SweepTrigger, SyncService};

/// Run the reconciliation loop.
///
/// Sweeps once on start, then every `period`. Runs until `cancel` is
/// triggered.
pub async fn run(sync: SyncService, period: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = period.as_secs(), "Reconciliation job started");

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                tracing::info!("Reconciliation job stopping");
                break;
            }
            _ = interval.tick() => {
                match sync.run_sweep(SweepTrigger::Scheduled).await {
                    Ok(report) if report.total_inconsistencies > 0 => {
                        tracing::info!(
                            users_checked = report.users_checked,
                            fixed = report.fixed_count(),
                            needs_attention = report.needs_attention_count(),
                            "Reconciliation: inconsistencies found"
                        );
                    }
                    Ok(report) => {
                        tracing::debug!(users_checked = report.users_checked, "Reconciliation: all records consistent");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Reconciliation: sweep failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use crate::db::{MemoryRecordStore, RecordStore};
    use crate::models::NewUser;
    use crate::services::{AuditService, SyncOptions};

    #[tokio::test(start_paused = true)]
    async fn test_first_sweep_runs_immediately() {
        let memory = Arc::new(MemoryRecordStore::new());
        let user = memory
            .insert_user(NewUser::candidate("job@example.com", Utc::now()))
            .await;
        let store: Arc<dyn RecordStore> = memory.clone();
        let sync = SyncService::new(
            Arc::clone(&store),
            AuditService::new(Arc::clone(&store)),
            SyncOptions::default(),
        );

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(sync, Duration::from_secs(3600), cancel.clone()));
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(store.get_docket(user.id).await.unwrap().is_some());
        assert!(store.get_contract(user.id).await.unwrap().is_some());

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_failure_does_not_stop_the_job() {
        let memory = Arc::new(MemoryRecordStore::new());
        memory.fail_reads(true);
        let store: Arc<dyn RecordStore> = memory.clone();
        let sync = SyncService::new(
            Arc::clone(&store),
            AuditService::new(Arc::clone(&store)),
            SyncOptions::default(),
        );

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(sync, Duration::from_secs(60), cancel.clone()));
        tokio::time::sleep(Duration::from_secs(150)).await;
        assert!(!handle.is_finished());

        cancel.cancel();
        handle.await.unwrap();
    }
}
