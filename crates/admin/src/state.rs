//! Application state shared by the background jobs and the health endpoint.

use std::sync::Arc;

use crate::config::AdminConfig;
use crate::db::RecordStore;
use crate::services::{
    ArchivePolicy, ArchiveService, AuditService, SyncOptions, SyncService,
};

/// Services wired over one record store.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    store: Arc<dyn RecordStore>,
    audit: AuditService,
    sync: SyncService,
    archive: ArchiveService,
}

impl AppState {
    /// Build every service from `config` over `store`.
    #[must_use]
    pub fn new(config: AdminConfig, store: Arc<dyn RecordStore>) -> Self {
        let audit = AuditService::new(Arc::clone(&store));
        let sync = SyncService::new(
            Arc::clone(&store),
            audit.clone(),
            SyncOptions {
                concurrency: config.sync.concurrency,
                audit_repairs: config.sync.audit_repairs,
            },
        );
        let archive = ArchiveService::new(
            Arc::clone(&store),
            audit.clone(),
            ArchivePolicy::days(config.archive.min_age_days),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                audit,
                sync,
                archive,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.inner.store
    }

    #[must_use]
    pub fn audit(&self) -> &AuditService {
        &self.inner.audit
    }

    #[must_use]
    pub fn sync(&self) -> &SyncService {
        &self.inner.sync
    }

    #[must_use]
    pub fn archive(&self) -> &ArchiveService {
        &self.inner.archive
    }
}
