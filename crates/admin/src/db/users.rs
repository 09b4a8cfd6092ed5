//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use caseflow_core::UserId;

use super::RepositoryError;
use crate::models::User;

/// Column list for `users` SELECT queries.
const COLUMNS: &str = "\
    id, phone, email, display_name, is_admin, docket_completed, \
    archived, archived_at, archived_reason, created_at";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    phone: Option<String>,
    email: String,
    display_name: String,
    is_admin: bool,
    docket_completed: bool,
    archived: bool,
    archived_at: Option<DateTime<Utc>>,
    archived_reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            phone: row.phone,
            email: row.email,
            display_name: row.display_name,
            is_admin: row.is_admin,
            docket_completed: row.docket_completed,
            archived: row.archived,
            archived_at: row.archived_at,
            archived_reason: row.archived_reason,
            created_at: row.created_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let query = format!("SELECT {COLUMNS} FROM caseflow.users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// List every user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        self.list_where("TRUE ORDER BY created_at ASC, id ASC").await
    }

    /// List users that are not archived, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<User>, RepositoryError> {
        self.list_where("NOT archived ORDER BY created_at ASC, id ASC")
            .await
    }

    /// List archived users, most recently archived first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_archived(&self) -> Result<Vec<User>, RepositoryError> {
        self.list_where("archived ORDER BY archived_at DESC, id ASC")
            .await
    }

    /// List active users created at or before `cutoff`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<User>, RepositoryError> {
        let query = format!(
            "SELECT {COLUMNS} FROM caseflow.users \
             WHERE NOT archived AND created_at <= $1 \
             ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, UserRow>(&query)
            .bind(cutoff)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Mark an active user archived.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Conflict` if the user is already archived.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn archive(
        &self,
        id: UserId,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<User, RepositoryError> {
        let query = format!(
            "UPDATE caseflow.users \
             SET archived = TRUE, archived_at = $2, archived_reason = $3 \
             WHERE id = $1 AND NOT archived \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .bind(at)
            .bind(reason)
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(row) => Ok(row.into()),
            None => Err(self.unchanged(id, "already archived").await),
        }
    }

    /// Return an archived user to the active set and clear the archive metadata.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Conflict` if the user is not archived.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn unarchive(&self, id: UserId) -> Result<User, RepositoryError> {
        let query = format!(
            "UPDATE caseflow.users \
             SET archived = FALSE, archived_at = NULL, archived_reason = NULL \
             WHERE id = $1 AND archived \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(row) => Ok(row.into()),
            None => Err(self.unchanged(id, "not archived").await),
        }
    }

    /// Explain why a conditional update matched no row.
    async fn unchanged(&self, id: UserId, state: &str) -> RepositoryError {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM caseflow.users WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await;

        match exists {
            Ok(true) => RepositoryError::Conflict(format!("user {id} is {state}")),
            Ok(false) => RepositoryError::NotFound,
            Err(e) => RepositoryError::Database(e),
        }
    }

    /// Set the docket-completed flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_docket_completed(
        &self,
        id: UserId,
        completed: bool,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE caseflow.users SET docket_completed = $2 WHERE id = $1")
            .bind(id)
            .bind(completed)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_where(&self, clause: &str) -> Result<Vec<User>, RepositoryError> {
        let query = format!("SELECT {COLUMNS} FROM caseflow.users WHERE {clause}");
        let rows = sqlx::query_as::<_, UserRow>(&query)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
