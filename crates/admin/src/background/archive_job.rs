//! Periodic archival of aged accounts.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::services::ArchiveService;

/// Run the archival loop.
///
/// Archives once on start, then every `period`. Runs until `cancel` is
/// triggered.
pub async fn run(archive: ArchiveService, period: Duration, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = period.as_secs(),
        min_age_days = archive.policy().min_age.num_days(),
        "Archival job started"
    );

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                tracing::info!("Archival job stopping");
                break;
            }
            _ = interval.tick() => {
                let run = archive.run_automatic_archive().await;
                if run.errors.is_empty() {
                    if run.archived > 0 {
                        tracing::info!(archived = run.archived, "Archival: {}", run.summary);
                    } else {
                        tracing::debug!("Archival: no users eligible");
                    }
                } else {
                    tracing::warn!(
                        archived = run.archived,
                        errors = run.errors.len(),
                        first_error = run.errors.first().map(String::as_str),
                        "Archival: {}",
                        run.summary
                    );
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
    use crate::services::{ArchivePolicy, AuditService};

    #[tokio::test(start_paused = true)]
    async fn test_archives_on_start_and_stops_on_cancel() {
        let memory = Arc::new(MemoryRecordStore::new());
        let old = memory
            .insert_user(NewUser::candidate(
                "old@example.com",
                Utc::now() - chrono::Duration::days(400),
            ))
            .await;
        let fresh = memory
            .insert_user(NewUser::candidate("new@example.com", Utc::now()))
            .await;
        let store: Arc<dyn RecordStore> = memory.clone();
        let archive = ArchiveService::new(
            Arc::clone(&store),
            AuditService::new(Arc::clone(&store)),
            ArchivePolicy::default(),
        );

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(archive, Duration::from_secs(86_400), cancel.clone()));
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(store.get_user(old.id).await.unwrap().unwrap().archived);
        assert!(!store.get_user(fresh.id).await.unwrap().unwrap().archived);

        cancel.cancel();
        handle.await.unwrap();
    }
}
