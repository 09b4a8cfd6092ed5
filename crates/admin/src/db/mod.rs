//! Record Store: persistence for case records and the audit log.
//!
//! # Database: `caseflow` schema
//!
//! ## Tables
//!
//! - `users` - Candidate and admin accounts with archival flags
//! - `dockets` - Candidate document bundles (one per user)
//! - `work_permits` - Work permit workflow (one per user)
//! - `work_visas` - Work visa workflow and embassy interview (one per user)
//! - `contracts` - Company contract and job offer documents (one per user)
//! - `audit_logs` - Append-only event ledger
//!
//! # Implementations
//!
//! - [`PgRecordStore`] - `PostgreSQL`, used by the binaries
//! - [`MemoryRecordStore`] - in-process, used by tests and dry runs
//! - [`TimedStore`] - wraps either and bounds every call with a timeout
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p caseflow-cli -- migrate
//! ```

pub mod audit_logs;
pub mod contracts;
pub mod dockets;
pub mod memory;
pub mod store;
pub mod timeout;
pub mod users;
pub mod work_permits;
pub mod work_visas;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Row};
use thiserror::Error;

use caseflow_core::UserId;

use crate::models::{
    AuditLogEntry, AuditLogQuery, Contract, ContractUpdate, Docket, NewAuditLogEntry,
    NewContract, NewDocket, NewWorkPermit, NewWorkVisa, User, WorkPermit, WorkPermitUpdate,
    WorkVisa, WorkVisaUpdate,
};

pub use memory::MemoryRecordStore;
pub use store::PgRecordStore;
pub use timeout::TimedStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate per-user record).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The store did not answer in time.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Store operation that was abandoned.
        operation: &'static str,
        /// Configured limit.
        after: Duration,
    },

    /// The store refused the operation (connection lost, injected failure).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Record returned by an idempotent create.
#[derive(Debug, Clone, PartialEq)]
pub struct Upserted<T> {
    pub record: T,
    /// False when the record already existed and was returned unchanged.
    pub created: bool,
}

impl<T> Upserted<T> {
    #[must_use]
    pub const fn created(record: T) -> Self {
        Self {
            record,
            created: true,
        }
    }

    #[must_use]
    pub const fn existing(record: T) -> Self {
        Self {
            record,
            created: false,
        }
    }
}

/// `RETURNING` suffix for an upsert. `xmax` is zero only on a row version
/// written by an insert, so it tells a fresh row from one kept by `ON CONFLICT`.
const INSERTED_FLAG: &str = "(xmax = 0) AS inserted";

/// An upsert row plus its [`INSERTED_FLAG`] column.
struct UpsertRow<R> {
    row: R,
    inserted: bool,
}

impl<'r, R> FromRow<'r, PgRow> for UpsertRow<R>
where
    R: FromRow<'r, PgRow>,
{
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            row: R::from_row(row)?,
            inserted: row.try_get("inserted")?,
        })
    }
}

impl<R> UpsertRow<R> {
    fn into_upserted<T: From<R>>(self) -> Upserted<T> {
        Upserted {
            record: self.row.into(),
            created: self.inserted,
        }
    }
}

/// Abstract CRUD contract over the per-user records and the audit log.
///
/// Sub-records are addressed by their owning user. `create_*` calls are
/// idempotent: when a record already exists for the user it is returned
/// unchanged with `created: false`, so overlapping sweeps cannot create
/// duplicates or both claim the insert.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Cheap round trip used by the readiness probe.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Get a user by ID.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// All users, oldest first.
    async fn list_users(&self) -> Result<Vec<User>, RepositoryError>;

    /// Users that are not archived, oldest first.
    async fn list_active_users(&self) -> Result<Vec<User>, RepositoryError>;

    /// Archived users, most recently archived first.
    async fn list_archived_users(&self) -> Result<Vec<User>, RepositoryError>;

    /// Active users created at or before `cutoff`, oldest first.
    async fn list_active_users_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<User>, RepositoryError>;

    /// Mark an active user archived. Returns `NotFound` for an unknown user
    /// and `Conflict` if the user is already archived, leaving it untouched.
    async fn archive_user(
        &self,
        id: UserId,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<User, RepositoryError>;

    /// Return an archived user to the active set, clearing archive metadata.
    /// Returns `Conflict` if the user is not archived.
    async fn unarchive_user(&self, id: UserId) -> Result<User, RepositoryError>;

    /// Set the user's docket-completed flag.
    async fn set_docket_completed(&self, id: UserId, completed: bool)
    -> Result<(), RepositoryError>;

    async fn get_docket(&self, user_id: UserId) -> Result<Option<Docket>, RepositoryError>;

    async fn create_docket(&self, docket: &NewDocket)
    -> Result<Upserted<Docket>, RepositoryError>;

    async fn get_work_permit(&self, user_id: UserId)
    -> Result<Option<WorkPermit>, RepositoryError>;

    async fn create_work_permit(
        &self,
        permit: &NewWorkPermit,
    ) -> Result<Upserted<WorkPermit>, RepositoryError>;

    async fn update_work_permit(
        &self,
        user_id: UserId,
        update: &WorkPermitUpdate,
    ) -> Result<WorkPermit, RepositoryError>;

    async fn get_work_visa(&self, user_id: UserId) -> Result<Option<WorkVisa>, RepositoryError>;

    async fn create_work_visa(&self, visa: &NewWorkVisa)
    -> Result<Upserted<WorkVisa>, RepositoryError>;

    async fn update_work_visa(
        &self,
        user_id: UserId,
        update: &WorkVisaUpdate,
    ) -> Result<WorkVisa, RepositoryError>;

    async fn get_contract(&self, user_id: UserId) -> Result<Option<Contract>, RepositoryError>;

    async fn create_contract(
        &self,
        contract: &NewContract,
    ) -> Result<Upserted<Contract>, RepositoryError>;

    async fn update_contract(
        &self,
        user_id: UserId,
        update: &ContractUpdate,
    ) -> Result<Contract, RepositoryError>;

    /// Append an entry to the audit log.
    async fn insert_audit_log(
        &self,
        entry: &NewAuditLogEntry,
    ) -> Result<AuditLogEntry, RepositoryError>;

    /// One page of matching entries (newest first) and the total match count.
    async fn query_audit_logs(
        &self,
        query: &AuditLogQuery,
    ) -> Result<(Vec<AuditLogEntry>, u64), RepositoryError>;

    /// Every entry with `timestamp >= cutoff`, oldest first.
    async fn list_audit_logs_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<AuditLogEntry>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
