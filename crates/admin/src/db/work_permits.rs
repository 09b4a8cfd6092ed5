//! Work permit repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use caseflow_core::{UserId, WorkPermitId};

use super::{INSERTED_FLAG, RepositoryError, UpsertRow, Upserted};
use crate::models::{NewWorkPermit, WorkPermit, WorkPermitUpdate};

const COLUMNS: &str = "id, user_id, status, notes, final_docket_url, tracking_code, updated_at";

/// Internal row type for `PostgreSQL` work permit queries.
#[derive(Debug, sqlx::FromRow)]
struct WorkPermitRow {
    id: WorkPermitId,
    user_id: UserId,
    status: String,
    notes: Option<String>,
    final_docket_url: Option<String>,
    tracking_code: Option<String>,
    updated_at: DateTime<Utc>,
}

impl From<WorkPermitRow> for WorkPermit {
    fn from(row: WorkPermitRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            status: row.status,
            notes: row.notes,
            final_docket_url: row.final_docket_url,
            tracking_code: row.tracking_code,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for work permit database operations.
pub struct WorkPermitRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WorkPermitRepository<'a> {
    /// Create a new work permit repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the work permit owned by a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<WorkPermit>, RepositoryError> {
        let query = format!("SELECT {COLUMNS} FROM caseflow.work_permits WHERE user_id = $1");
        let row = sqlx::query_as::<_, WorkPermitRow>(&query)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Create a work permit, or return the one the user already has.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        permit: &NewWorkPermit,
    ) -> Result<Upserted<WorkPermit>, RepositoryError> {
        let query = format!(
            "INSERT INTO caseflow.work_permits (user_id, status) \
             VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING {COLUMNS}, {INSERTED_FLAG}"
        );
        let row = sqlx::query_as::<_, UpsertRow<WorkPermitRow>>(&query)
            .bind(permit.user_id)
            .bind(permit.status.as_str())
            .fetch_one(self.pool)
            .await?;

        Ok(row.into_upserted())
    }

    /// Apply the set fields of `update` to the user's work permit.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no work permit.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        user_id: UserId,
        update: &WorkPermitUpdate,
    ) -> Result<WorkPermit, RepositoryError> {
        let query = format!(
            "UPDATE caseflow.work_permits \
             SET status = COALESCE($2, status), \
                 notes = COALESCE($3, notes), \
                 updated_at = NOW() \
             WHERE user_id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkPermitRow>(&query)
            .bind(user_id)
            .bind(update.status.map(|s| s.as_str()))
            .bind(update.notes.as_deref())
            .fetch_optional(self.pool)
            .await?
            .map(Into::into)
            .ok_or(RepositoryError::NotFound)
    }
}
