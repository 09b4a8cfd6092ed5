//! Reconciliation sweep.
//!
//! Walks every user and keeps their four sub-records present and valid:
//! missing records are created with safe defaults, out-of-vocabulary statuses
//! are reset, and problems only a human can resolve are flagged.
//!
//! A sweep holds no state of its own and every write is an idempotent
//! upsert or a partial update, so overlapping sweeps are safe.

mod records;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::{StreamExt, stream};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{info, instrument, warn};

use caseflow_core::{AuditAction, EntityType, Severity, UserId};

use crate::db::{RecordStore, RepositoryError};
use crate::models::{Contract, Docket, User, WorkPermit, WorkVisa};
use crate::services::audit::{AuditContext, AuditOptions, AuditService};

pub use records::{Correction, Finding, SubRecord, UserRepair};

/// One problem found during a sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inconsistency {
    pub user_id: UserId,
    pub user_email: String,
    #[serde(rename = "type")]
    pub kind: EntityType,
    pub issue: String,
    /// Whether the sweep repaired it.
    pub fixed: bool,
}

/// Result of one sweep. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub timestamp: DateTime<Utc>,
    pub users_checked: usize,
    /// In user order, then docket, work permit, work visa, contract.
    pub inconsistencies: Vec<Inconsistency>,
    pub total_inconsistencies: usize,
}

impl SyncReport {
    /// Inconsistencies the sweep repaired.
    #[must_use]
    pub fn fixed_count(&self) -> usize {
        self.inconsistencies.iter().filter(|i| i.fixed).count()
    }

    /// Inconsistencies left for a human.
    #[must_use]
    pub fn needs_attention_count(&self) -> usize {
        self.total_inconsistencies - self.fixed_count()
    }
}

/// What started a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepTrigger {
    Scheduled,
    Manual,
}

impl fmt::Display for SweepTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Scheduled => "scheduled",
            Self::Manual => "manual",
        })
    }
}

/// Sweep tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Users checked at once. 1 means strictly sequential.
    pub concurrency: usize,
    /// Write an audit entry for every automatic repair.
    pub audit_repairs: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            audit_repairs: true,
        }
    }
}

/// Reconciliation sweep over the record store.
#[derive(Clone)]
pub struct SyncService {
    store: Arc<dyn RecordStore>,
    audit: AuditService,
    options: SyncOptions,
}

impl SyncService {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, audit: AuditService, options: SyncOptions) -> Self {
        Self {
            store,
            audit,
            options: SyncOptions {
                concurrency: options.concurrency.max(1),
                ..options
            },
        }
    }

    /// Run a sweep requested by an administrator.
    ///
    /// # Errors
    ///
    /// Returns the store error if the user list cannot be read.
    pub async fn manual_sync(&self) -> Result<SyncReport, RepositoryError> {
        self.run_sweep(SweepTrigger::Manual).await
    }

    /// Check every user and repair what can be repaired.
    ///
    /// A failure while checking one record becomes an unfixed inconsistency
    /// and never stops the sweep.
    ///
    /// # Errors
    ///
    /// Returns the store error if the user list cannot be read.
    #[instrument(skip(self), fields(trigger = %trigger))]
    pub async fn run_sweep(&self, trigger: SweepTrigger) -> Result<SyncReport, RepositoryError> {
        let timestamp = Utc::now();
        self.audit
            .log_system(
                AuditAction::SyncStart,
                format!("Data synchronization started ({trigger})"),
                Some(json!({ "trigger": trigger.to_string() })),
                Severity::Info,
            )
            .await;

        let users = match self.store.list_users().await {
            Ok(users) => users,
            Err(e) => {
                warn!(error = %e, "reconciliation sweep could not list users");
                self.audit
                    .log_system(
                        AuditAction::SyncComplete,
                        format!("Data synchronization failed: {e}"),
                        Some(json!({
                            "trigger": trigger.to_string(),
                            "error": e.to_string(),
                        })),
                        Severity::Error,
                    )
                    .await;
                return Err(e);
            }
        };

        // Each check owns its user and a service handle so the sweep future
        // stays `Send` and can run on a spawned task.
        let per_user: Vec<Vec<Inconsistency>> = stream::iter(users.iter().cloned())
            .map(|user| {
                let sync = self.clone();
                async move { sync.check_user(&user).await }
            })
            .buffered(self.options.concurrency)
            .collect()
            .await;
        let inconsistencies: Vec<Inconsistency> = per_user.into_iter().flatten().collect();

        let report = SyncReport {
            timestamp,
            users_checked: users.len(),
            total_inconsistencies: inconsistencies.len(),
            inconsistencies,
        };

        info!(
            users_checked = report.users_checked,
            total = report.total_inconsistencies,
            fixed = report.fixed_count(),
            needs_attention = report.needs_attention_count(),
            "reconciliation sweep complete"
        );
        self.audit
            .log_system(
                AuditAction::SyncComplete,
                format!(
                    "Data synchronization completed: {} users checked, {} inconsistencies",
                    report.users_checked, report.total_inconsistencies
                ),
                Some(json!({
                    "trigger": trigger.to_string(),
                    "users_checked": report.users_checked,
                    "total_inconsistencies": report.total_inconsistencies,
                    "fixed": report.fixed_count(),
                    "needs_attention": report.needs_attention_count(),
                })),
                Severity::Info,
            )
            .await;

        Ok(report)
    }

    async fn check_user(&self, user: &User) -> Vec<Inconsistency> {
        let mut found = Vec::new();
        self.check::<Docket>(user, &mut found).await;
        self.check::<WorkPermit>(user, &mut found).await;
        self.check::<WorkVisa>(user, &mut found).await;
        self.check::<Contract>(user, &mut found).await;

        if !found.is_empty() {
            let fixed = found.iter().filter(|i| i.fixed).count();
            info!(
                user_id = %user.id,
                email = %user.email,
                fixed,
                needs_attention = found.len() - fixed,
                "reconciled user"
            );
        }
        found
    }

    async fn check<R: SubRecord>(&self, user: &User, found: &mut Vec<Inconsistency>) {
        if let Err(e) = self.try_check::<R>(user, found).await {
            warn!(
                user_id = %user.id,
                kind = %R::KIND,
                error = %e,
                "sub-record check failed"
            );
            found.push(inconsistency(
                user,
                R::KIND,
                format!("Failed to check {} record: {e}", R::KIND.label()),
                false,
            ));
        }
    }

    async fn try_check<R: SubRecord>(
        &self,
        user: &User,
        found: &mut Vec<Inconsistency>,
    ) -> Result<(), RepositoryError> {
        let store = self.store.as_ref();

        let record = match R::fetch(store, user.id).await? {
            Some(record) => record,
            None => {
                let upserted = R::create_default(store, user.id).await?;
                if upserted.created {
                    self.report_created(user, &upserted.record, found).await?;
                    return Ok(());
                }
                // Another sweep inserted it first.
                upserted.record
            }
        };

        for finding in record.inspect() {
            let Some(correction) = finding.correction else {
                found.push(inconsistency(user, R::KIND, finding.issue, false));
                continue;
            };
            R::apply(store, user.id, &correction.update).await?;
            found.push(inconsistency(user, R::KIND, finding.issue, true));
            self.audit_repair(
                AuditAction::Update,
                R::KIND,
                user,
                record.entity_id(),
                Some(single_field(correction.field, correction.old)),
                Some(single_field(correction.field, correction.new)),
            )
            .await;
        }
        Ok(())
    }

    async fn report_created<R: SubRecord>(
        &self,
        user: &User,
        created: &R,
        found: &mut Vec<Inconsistency>,
    ) -> Result<(), RepositoryError> {
        found.push(inconsistency(
            user,
            R::KIND,
            format!("Missing {} record, created automatically", R::KIND.label()),
            true,
        ));
        self.audit_repair(
            AuditAction::Create,
            R::KIND,
            user,
            created.entity_id(),
            None,
            serde_json::to_value(created).ok(),
        )
        .await;

        if let Some(repair) = R::after_create(self.store.as_ref(), user).await? {
            found.push(inconsistency(user, EntityType::User, repair.issue, true));
            self.audit_repair(
                AuditAction::Update,
                EntityType::User,
                user,
                user.id.to_string(),
                Some(repair.old_values),
                Some(repair.new_values),
            )
            .await;
        }
        Ok(())
    }

    async fn audit_repair(
        &self,
        action: AuditAction,
        entity_type: EntityType,
        user: &User,
        entity_id: String,
        old_values: Option<Value>,
        new_values: Option<Value>,
    ) {
        if !self.options.audit_repairs {
            return;
        }
        self.audit
            .log(
                action,
                entity_type,
                AuditContext::user(user.id).with_metadata(json!({ "source": "reconciliation" })),
                AuditOptions {
                    entity_id: Some(entity_id),
                    old_values,
                    new_values,
                    ..AuditOptions::default()
                },
            )
            .await;
    }
}

fn single_field(field: &str, value: impl Into<Value>) -> Value {
    let mut map = Map::new();
    map.insert(field.to_owned(), value.into());
    Value::Object(map)
}

fn inconsistency(user: &User, kind: EntityType, issue: String, fixed: bool) -> Inconsistency {
    Inconsistency {
        user_id: user.id,
        user_email: user.email.clone(),
        kind,
        issue,
        fixed,
    }
}
