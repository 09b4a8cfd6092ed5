//! Audit Log Service.
//!
//! Records "what happened, by whom, when" for every component and derives
//! reporting statistics from the ledger.
//!
//! Writing is fail-open: [`AuditService::log`] never returns an error, so a
//! broken audit table cannot break the operation being audited.

mod describe;
mod redact;
pub mod stats;

use std::sync::Arc;

use chrono::{Duration, Local, Utc};
use serde_json::Value;
use tracing::{error, instrument};

use caseflow_core::{AuditAction, EntityType, Severity, UserId};

use crate::db::{RecordStore, RepositoryError};
use crate::models::{AuditLogPage, AuditLogQuery, NewAuditLogEntry};

pub use describe::{changed_fields, describe};
pub use redact::{REDACTED, SENSITIVE_FIELDS, redact_sensitive_fields};
pub use stats::AuditStats;

/// Who performed an action and from where.
#[derive(Debug, Clone, Default)]
pub struct AuditContext {
    pub user_id: Option<UserId>,
    pub admin_email: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub session_id: Option<String>,
    pub metadata: Option<Value>,
}

impl AuditContext {
    /// Context for an action taken by (or on behalf of) a user.
    #[must_use]
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    /// Context for an action taken by an administrator.
    #[must_use]
    pub fn admin(email: impl Into<String>) -> Self {
        Self {
            admin_email: Some(email.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// What an action touched.
#[derive(Debug, Clone, Default)]
pub struct AuditOptions {
    pub entity_id: Option<String>,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    /// Generated from the action and entity when absent.
    pub description: Option<String>,
    /// `info` when absent.
    pub severity: Option<Severity>,
}

/// Audit log writer and reader.
#[derive(Clone)]
pub struct AuditService {
    store: Arc<dyn RecordStore>,
}

impl AuditService {
    /// Create a new audit service over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Append an entry to the audit log.
    ///
    /// Sensitive keys in the value snapshots and metadata are redacted before
    /// storage. A failed write is logged and swallowed.
    #[instrument(skip(self, context, options), fields(action = %action, entity_type = %entity_type))]
    pub async fn log(
        &self,
        action: AuditAction,
        entity_type: EntityType,
        context: AuditContext,
        options: AuditOptions,
    ) {
        let description = options.description.unwrap_or_else(|| {
            describe(
                action,
                entity_type,
                options.entity_id.as_deref(),
                options.old_values.as_ref(),
                options.new_values.as_ref(),
            )
        });

        let entry = NewAuditLogEntry {
            user_id: context.user_id,
            admin_email: context.admin_email,
            action,
            entity_type,
            entity_id: options.entity_id,
            old_values: options.old_values.as_ref().map(redact_sensitive_fields),
            new_values: options.new_values.as_ref().map(redact_sensitive_fields),
            metadata: context.metadata.as_ref().map(redact_sensitive_fields),
            ip_address: context.ip_address,
            user_agent: context.user_agent,
            session_id: context.session_id,
            severity: options.severity.unwrap_or_default(),
            description,
            timestamp: Utc::now(),
        };

        if let Err(e) = self.store.insert_audit_log(&entry).await {
            error!(
                error = %e,
                action = %action,
                entity_type = %entity_type,
                "failed to write audit log entry"
            );
        }
    }

    /// Record a login, logout or failed login.
    pub async fn log_auth(&self, action: AuditAction, context: AuditContext) {
        let severity = if action == AuditAction::LoginFailed {
            Severity::Warning
        } else {
            Severity::Info
        };
        let session_id = context.session_id.clone();
        self.log(
            action,
            EntityType::Session,
            context,
            AuditOptions {
                entity_id: session_id,
                severity: Some(severity),
                ..AuditOptions::default()
            },
        )
        .await;
    }

    /// Record a create, update or delete. Deletes are logged as warnings.
    pub async fn log_data_change(
        &self,
        action: AuditAction,
        entity_type: EntityType,
        entity_id: impl Into<String> + Send,
        context: AuditContext,
        old_values: Option<Value>,
        new_values: Option<Value>,
    ) {
        let severity = if action == AuditAction::Delete {
            Severity::Warning
        } else {
            Severity::Info
        };
        self.log(
            action,
            entity_type,
            context,
            AuditOptions {
                entity_id: Some(entity_id.into()),
                old_values,
                new_values,
                severity: Some(severity),
                description: None,
            },
        )
        .await;
    }

    /// Record an upload or download attached to a record.
    pub async fn log_file_operation(
        &self,
        action: AuditAction,
        entity_type: EntityType,
        entity_id: impl Into<String> + Send,
        file_name: &str,
        context: AuditContext,
    ) {
        let entity_id = entity_id.into();
        let verb = if action == AuditAction::Download {
            "Downloaded"
        } else {
            "Uploaded"
        };
        let description = format!(
            "{verb} {file_name} for {} {entity_id}",
            entity_type.label()
        );
        self.log(
            action,
            entity_type,
            context,
            AuditOptions {
                entity_id: Some(entity_id),
                description: Some(description),
                new_values: Some(serde_json::json!({ "file_name": file_name })),
                ..AuditOptions::default()
            },
        )
        .await;
    }

    /// Record an action performed by the system itself.
    pub async fn log_system(
        &self,
        action: AuditAction,
        description: impl Into<String> + Send,
        metadata: Option<Value>,
        severity: Severity,
    ) {
        self.log(
            action,
            EntityType::System,
            AuditContext {
                metadata,
                ..AuditContext::default()
            },
            AuditOptions {
                description: Some(description.into()),
                severity: Some(severity),
                ..AuditOptions::default()
            },
        )
        .await;
    }

    /// One page of entries matching `query`, newest first.
    ///
    /// # Errors
    ///
    /// Returns the store error if the read fails.
    #[instrument(skip(self, query), fields(page = query.page, limit = query.limit))]
    pub async fn get_audit_logs(
        &self,
        query: &AuditLogQuery,
    ) -> Result<AuditLogPage, RepositoryError> {
        let query = query.normalized();
        let (logs, total) = self.store.query_audit_logs(&query).await?;
        let total_pages = total.div_ceil(u64::from(query.limit));

        Ok(AuditLogPage {
            logs,
            total,
            page: query.page,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
        })
    }

    /// Aggregate statistics over the last `days` days.
    ///
    /// # Errors
    ///
    /// Returns the store error if the read fails.
    #[instrument(skip(self))]
    pub async fn get_audit_stats(&self, days: u32) -> Result<AuditStats, RepositoryError> {
        let now = Utc::now();
        let cutoff = now - Duration::days(i64::from(days));
        let entries = self.store.list_audit_logs_since(cutoff).await?;
        let offset = *Local::now().offset();

        Ok(AuditStats::compute(&entries, now, days, offset))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryRecordStore;
    use serde_json::json;

    fn service() -> (Arc<MemoryRecordStore>, AuditService) {
        let store = Arc::new(MemoryRecordStore::new());
        let service = AuditService::new(store.clone());
        (store, service)
    }

    #[tokio::test]
    async fn test_log_generates_description_and_defaults() {
        let (store, audit) = service();
        audit
            .log(
                AuditAction::Create,
                EntityType::WorkPermit,
                AuditContext::admin("ops@example.com"),
                AuditOptions {
                    entity_id: Some("12".to_string()),
                    ..AuditOptions::default()
                },
            )
            .await;

        let entries = store.audit_entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description, "Created work permit 12");
        assert_eq!(entries[0].severity, Severity::Info);
        assert_eq!(entries[0].admin_email.as_deref(), Some("ops@example.com"));
    }

    #[tokio::test]
    async fn test_log_is_fail_open() {
        let (store, audit) = service();
        store.fail_audit_writes(true);
        audit
            .log_system(AuditAction::SyncStart, "sweep", None, Severity::Info)
            .await;
        assert!(store.audit_entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_log_redacts_after_diffing() {
        let (store, audit) = service();
        audit
            .log_data_change(
                AuditAction::Update,
                EntityType::User,
                "4",
                AuditContext::user(UserId::new(4)),
                Some(json!({ "password": "old", "email": "a@x.io" })),
                Some(json!({ "password": "new", "email": "a@x.io" })),
            )
            .await;

        let entry = &store.audit_entries().await[0];
        assert_eq!(entry.description, "Updated user 4: password");
        assert_eq!(entry.new_values.as_ref().unwrap()["password"], REDACTED);
        assert_eq!(entry.new_values.as_ref().unwrap()["email"], "a@x.io");
    }

    #[tokio::test]
    async fn test_wrapper_severities() {
        let (store, audit) = service();
        audit
            .log_auth(AuditAction::LoginFailed, AuditContext::default())
            .await;
        audit.log_auth(AuditAction::Login, AuditContext::default()).await;
        audit
            .log_data_change(
                AuditAction::Delete,
                EntityType::Contract,
                "9",
                AuditContext::admin("ops@example.com"),
                None,
                None,
            )
            .await;

        let entries = store.audit_entries().await;
        assert_eq!(entries[0].severity, Severity::Warning);
        assert_eq!(entries[0].entity_type, EntityType::Session);
        assert_eq!(entries[0].description, "Failed login attempt");
        assert_eq!(entries[1].severity, Severity::Info);
        assert_eq!(entries[2].severity, Severity::Warning);
        assert_eq!(entries[2].description, "Deleted contract 9");
    }

    #[tokio::test]
    async fn test_file_operation_description() {
        let (store, audit) = service();
        audit
            .log_file_operation(
                AuditAction::Upload,
                EntityType::Docket,
                "3",
                "passport.pdf",
                AuditContext::user(UserId::new(3)),
            )
            .await;

        let entries = store.audit_entries().await;
        assert_eq!(entries[0].description, "Uploaded passport.pdf for docket 3");
    }

    #[tokio::test]
    async fn test_get_audit_logs_pages() {
        let (_store, audit) = service();
        for _ in 0..7 {
            audit
                .log_system(AuditAction::View, "tick", None, Severity::Info)
                .await;
        }

        let page = audit
            .get_audit_logs(&AuditLogQuery {
                page: 0,
                limit: 3,
                ..AuditLogQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.total, 7);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.logs.len(), 3);
    }
}
