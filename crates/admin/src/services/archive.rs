//! Archival Scheduler service.
//!
//! Users older than the policy age are moved out of the active set. Archiving
//! is reversible and every transition is written to the audit log.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{info, instrument, warn};

use caseflow_core::{AuditAction, EntityType, Severity, UserId};

use crate::db::{RecordStore, RepositoryError};
use crate::models::User;
use crate::services::audit::{AuditContext, AuditOptions, AuditService};

/// Reason recorded when an administrator archives without giving one.
pub const MANUAL_ARCHIVE_REASON: &str = "manual_archive";

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Errors from manual archive operations.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("user {0} not found")]
    NotFound(UserId),

    #[error("user {0} is already archived")]
    AlreadyArchived(UserId),

    #[error("user {0} is not archived")]
    NotArchived(UserId),

    #[error("archive operation already in progress")]
    Busy,

    #[error(transparent)]
    Store(#[from] RepositoryError),
}

/// When a user becomes eligible for archival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchivePolicy {
    pub min_age: Duration,
}

impl ArchivePolicy {
    /// Policy with a minimum age in whole days.
    #[must_use]
    pub fn days(days: u32) -> Self {
        Self {
            min_age: Duration::days(i64::from(days)),
        }
    }

    /// Active users whose age has reached `min_age`.
    #[must_use]
    pub fn is_eligible(&self, user: &User, now: DateTime<Utc>) -> bool {
        user.is_active() && user.age_at(now) >= self.min_age
    }

    /// Latest creation time that is eligible at `now`.
    #[must_use]
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.min_age
    }
}

impl Default for ArchivePolicy {
    fn default() -> Self {
        Self::days(365)
    }
}

/// Outcome of an automatic archive pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveRun {
    pub archived: usize,
    pub errors: Vec<String>,
    pub summary: String,
}

/// User counts for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveStats {
    pub total_users: usize,
    pub active_users: usize,
    pub archived_users: usize,
    pub users_eligible_for_archive: usize,
    /// Whole days since the oldest active user was created.
    pub oldest_user_age: i64,
}

/// Clears the running flag when dropped.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Archival operations over the record store.
#[derive(Clone)]
pub struct ArchiveService {
    store: Arc<dyn RecordStore>,
    audit: AuditService,
    policy: ArchivePolicy,
    running: Arc<AtomicBool>,
}

impl ArchiveService {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, audit: AuditService, policy: ArchivePolicy) -> Self {
        Self {
            store,
            audit,
            policy,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub const fn policy(&self) -> ArchivePolicy {
        self.policy
    }

    /// Whether an automatic pass is in progress.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Archive every eligible user.
    ///
    /// Passes never overlap: a call made while one is running returns at once
    /// with nothing archived. Per-user failures are collected in `errors`.
    #[instrument(skip(self))]
    pub async fn run_automatic_archive(&self) -> ArchiveRun {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            warn!("automatic archive skipped, previous pass still running");
            return ArchiveRun {
                archived: 0,
                errors: vec![ArchiveError::Busy.to_string()],
                summary: "Skipped: archive operation already in progress".to_owned(),
            };
        };

        let now = Utc::now();
        let candidates = match self
            .store
            .list_active_users_created_before(self.policy.cutoff(now))
            .await
        {
            Ok(users) => users,
            Err(e) => {
                warn!(error = %e, "failed to list archive candidates");
                return ArchiveRun {
                    archived: 0,
                    errors: vec![format!("Failed to list archive candidates: {e}")],
                    summary: "Archived 0 users (candidate lookup failed)".to_owned(),
                };
            }
        };

        let mut archived = 0;
        let mut errors = Vec::new();
        for user in candidates
            .iter()
            .filter(|user| self.policy.is_eligible(user, now))
        {
            let reason = format!("automatic_archive_{}_days_old", age_days_ceil(user, now));
            match self.store.archive_user(user.id, &reason, now).await {
                Ok(_) => {
                    archived += 1;
                    self.audit_transition(user.id, true, &reason, None).await;
                }
                // Archived by someone else since the candidates were listed.
                Err(RepositoryError::Conflict(_)) => {
                    info!(user_id = %user.id, "user already archived, skipping");
                }
                Err(e) => {
                    warn!(user_id = %user.id, error = %e, "failed to archive user");
                    errors.push(format!("Failed to archive user {}: {e}", user.id));
                }
            }
        }

        let summary = if errors.is_empty() {
            format!("Archived {archived} users")
        } else {
            format!("Archived {archived} users with {} errors", errors.len())
        };
        info!(archived, errors = errors.len(), "automatic archive complete");

        ArchiveRun {
            archived,
            errors,
            summary,
        }
    }

    /// Archive one user. `reason` defaults to [`MANUAL_ARCHIVE_REASON`].
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::NotFound` for an unknown user,
    /// `ArchiveError::AlreadyArchived` if the user is already archived, and
    /// `ArchiveError::Store` if the store fails.
    #[instrument(skip(self))]
    pub async fn archive_user(
        &self,
        user_id: UserId,
        reason: Option<&str>,
        admin_email: Option<&str>,
    ) -> Result<User, ArchiveError> {
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(MANUAL_ARCHIVE_REASON);

        // The store only archives an active user, so a concurrent archive of
        // the same user surfaces here as `AlreadyArchived`.
        let user = self
            .store
            .archive_user(user_id, reason, Utc::now())
            .await
            .map_err(|e| transition_error(e, user_id, ArchiveError::AlreadyArchived))?;
        self.audit_transition(user_id, true, reason, admin_email)
            .await;
        info!(user_id = %user_id, reason, "user archived");
        Ok(user)
    }

    /// Return an archived user to the active set.
    ///
    /// Archive metadata is cleared.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::NotFound` for an unknown user,
    /// `ArchiveError::NotArchived` if the user is active, and
    /// `ArchiveError::Store` if the store fails.
    #[instrument(skip(self))]
    pub async fn unarchive_user(
        &self,
        user_id: UserId,
        admin_email: Option<&str>,
    ) -> Result<User, ArchiveError> {
        let user = self.load(user_id).await?;
        let restored = self
            .store
            .unarchive_user(user_id)
            .await
            .map_err(|e| transition_error(e, user_id, ArchiveError::NotArchived))?;
        let previous_reason = user.archived_reason.unwrap_or_default();
        self.audit_transition(user_id, false, &previous_reason, admin_email)
            .await;
        info!(user_id = %user_id, "user unarchived");
        Ok(restored)
    }

    /// User counts. Degrades to all zeros if the store cannot be read.
    #[instrument(skip(self))]
    pub async fn get_archive_stats(&self) -> ArchiveStats {
        let users = match self.store.list_users().await {
            Ok(users) => users,
            Err(e) => {
                warn!(error = %e, "archive stats unavailable");
                return ArchiveStats::default();
            }
        };

        let now = Utc::now();
        let active: Vec<&User> = users.iter().filter(|u| u.is_active()).collect();
        ArchiveStats {
            total_users: users.len(),
            active_users: active.len(),
            archived_users: users.len() - active.len(),
            users_eligible_for_archive: active
                .iter()
                .filter(|u| self.policy.is_eligible(u, now))
                .count(),
            oldest_user_age: active
                .iter()
                .map(|u| u.age_at(now).num_days())
                .max()
                .unwrap_or(0)
                .max(0),
        }
    }

    async fn load(&self, user_id: UserId) -> Result<User, ArchiveError> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or(ArchiveError::NotFound(user_id))
    }

    async fn audit_transition(
        &self,
        user_id: UserId,
        archived: bool,
        reason: &str,
        admin_email: Option<&str>,
    ) {
        let description = if archived {
            format!("Archived user {user_id}: {reason}")
        } else {
            format!("Unarchived user {user_id}")
        };
        self.audit
            .log(
                AuditAction::StatusChange,
                EntityType::User,
                AuditContext {
                    user_id: Some(user_id),
                    admin_email: admin_email.map(str::to_owned),
                    ..AuditContext::default()
                },
                AuditOptions {
                    entity_id: Some(user_id.to_string()),
                    old_values: Some(json!({ "archived": !archived })),
                    new_values: Some(json!({ "archived": archived, "archived_reason": reason })),
                    description: Some(description),
                    severity: Some(Severity::Info),
                },
            )
            .await;
    }
}

/// Days since creation, rounded up.
fn age_days_ceil(user: &User, now: DateTime<Utc>) -> i64 {
    let millis = user.age_at(now).num_milliseconds().max(0);
    (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

/// Map a refused archive transition. `Conflict` means the user was already
/// in the target state.
fn transition_error(
    error: RepositoryError,
    user_id: UserId,
    conflict: fn(UserId) -> ArchiveError,
) -> ArchiveError {
    match error {
        RepositoryError::NotFound => ArchiveError::NotFound(user_id),
        RepositoryError::Conflict(_) => conflict(user_id),
        other => ArchiveError::Store(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryRecordStore;
    use crate::models::NewUser;

    fn user_created(created_at: DateTime<Utc>) -> User {
        User {
            id: UserId::new(1),
            phone: None,
            email: "a@example.com".to_string(),
            display_name: "a".to_string(),
            is_admin: false,
            docket_completed: false,
            archived: false,
            archived_at: None,
            archived_reason: None,
            created_at,
        }
    }

    fn service(store: &Arc<MemoryRecordStore>) -> ArchiveService {
        let store: Arc<dyn RecordStore> = store.clone();
        ArchiveService::new(
            store.clone(),
            AuditService::new(store),
            ArchivePolicy::default(),
        )
    }

    #[test]
    fn test_eligibility_boundary() {
        let now: DateTime<Utc> = "2026-06-01T12:00:00Z".parse().unwrap();
        let policy = ArchivePolicy::default();

        let exactly = user_created(now - Duration::days(365));
        let almost = user_created(now - Duration::days(365) + Duration::seconds(1));
        assert!(policy.is_eligible(&exactly, now));
        assert!(!policy.is_eligible(&almost, now));

        let mut archived = exactly;
        archived.archived = true;
        assert!(!policy.is_eligible(&archived, now));
    }

    #[test]
    fn test_age_rounding() {
        let now: DateTime<Utc> = "2026-06-01T12:00:00Z".parse().unwrap();
        let user = user_created(now - Duration::days(400) - Duration::hours(1));
        assert_eq!(age_days_ceil(&user, now), 401);
        assert_eq!(user.age_at(now).num_days(), 400);
        assert_eq!(age_days_ceil(&user_created(now - Duration::days(365)), now), 365);
    }

    #[tokio::test]
    async fn test_busy_pass_returns_immediately() {
        let store = Arc::new(MemoryRecordStore::new());
        store
            .insert_user(NewUser::candidate("old@example.com", Utc::now() - Duration::days(500)))
            .await;
        let archive = service(&store);

        let held = RunGuard::acquire(&archive.running).unwrap();
        let run = archive.run_automatic_archive().await;
        assert_eq!(run.archived, 0);
        assert_eq!(run.errors, ["archive operation already in progress"]);
        drop(held);

        let run = archive.run_automatic_archive().await;
        assert_eq!(run.archived, 1);
        assert!(!archive.is_running());
    }

    #[tokio::test]
    async fn test_manual_archive_round_trip() {
        let store = Arc::new(MemoryRecordStore::new());
        let user = store
            .insert_user(NewUser::candidate("m@example.com", Utc::now()))
            .await;
        let archive = service(&store);

        let archived = archive.archive_user(user.id, None, None).await.unwrap();
        assert_eq!(archived.archived_reason.as_deref(), Some(MANUAL_ARCHIVE_REASON));
        assert!(matches!(
            archive.archive_user(user.id, None, None).await,
            Err(ArchiveError::AlreadyArchived(_))
        ));

        archive.unarchive_user(user.id, None).await.unwrap();
        assert!(matches!(
            archive.unarchive_user(user.id, None).await,
            Err(ArchiveError::NotArchived(_))
        ));
        assert!(matches!(
            archive.unarchive_user(UserId::new(999), None).await,
            Err(ArchiveError::NotFound(_))
        ));

        let transitions = store
            .audit_entries()
            .await
            .iter()
            .filter(|e| e.action == AuditAction::StatusChange)
            .count();
        assert_eq!(transitions, 2);
    }

    #[tokio::test]
    async fn test_archive_keeps_the_first_reason() {
        let store = Arc::new(MemoryRecordStore::new());
        let user = store
            .insert_user(NewUser::candidate("r@example.com", Utc::now() - Duration::days(500)))
            .await;
        let archive = service(&store);

        store
            .archive_user(user.id, "withdrew", Utc::now())
            .await
            .unwrap();
        assert!(matches!(
            archive.archive_user(user.id, None, None).await,
            Err(ArchiveError::AlreadyArchived(_))
        ));

        let kept = store.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(kept.archived_reason.as_deref(), Some("withdrew"));
        assert!(store.audit_entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_stats_degrade_to_zero() {
        let store = Arc::new(MemoryRecordStore::new());
        store
            .insert_user(NewUser::candidate("s@example.com", Utc::now()))
            .await;
        store.fail_reads(true);
        assert_eq!(service(&store).get_archive_stats().await, ArchiveStats::default());
    }
}
