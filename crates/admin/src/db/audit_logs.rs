//! Audit log repository for database operations.
//!
//! The table is append-only; a trigger installed by the migrations rejects
//! UPDATE and DELETE, so this repository only inserts and reads.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use caseflow_core::{AuditAction, EntityType, Severity, UserId};

use super::RepositoryError;
use crate::models::{AuditLogEntry, AuditLogQuery, NewAuditLogEntry};

const COLUMNS: &str = "\
    id, user_id, admin_email, action, entity_type, entity_id, old_values, \
    new_values, metadata, ip_address, user_agent, session_id, severity, \
    description, timestamp";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` audit log queries.
#[derive(Debug, sqlx::FromRow)]
struct AuditLogRow {
    id: Uuid,
    user_id: Option<UserId>,
    admin_email: Option<String>,
    action: String,
    entity_type: String,
    entity_id: Option<String>,
    old_values: Option<serde_json::Value>,
    new_values: Option<serde_json::Value>,
    metadata: Option<serde_json::Value>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    session_id: Option<String>,
    severity: String,
    description: String,
    timestamp: DateTime<Utc>,
}

impl TryFrom<AuditLogRow> for AuditLogEntry {
    type Error = RepositoryError;

    fn try_from(row: AuditLogRow) -> Result<Self, Self::Error> {
        let corrupt = |e: caseflow_core::UnknownVariant| {
            RepositoryError::DataCorruption(format!("audit log {}: {e}", row.id))
        };
        let action: AuditAction = row.action.parse().map_err(corrupt)?;
        let entity_type: EntityType = row.entity_type.parse().map_err(corrupt)?;
        let severity: Severity = row.severity.parse().map_err(corrupt)?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            admin_email: row.admin_email,
            action,
            entity_type,
            entity_id: row.entity_id,
            old_values: row.old_values,
            new_values: row.new_values,
            metadata: row.metadata,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            session_id: row.session_id,
            severity,
            description: row.description,
            timestamp: row.timestamp,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for audit log database operations.
pub struct AuditLogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AuditLogRepository<'a> {
    /// Create a new audit log repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append an entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, entry: &NewAuditLogEntry) -> Result<AuditLogEntry, RepositoryError> {
        let query = format!(
            "INSERT INTO caseflow.audit_logs ( \
                 user_id, admin_email, action, entity_type, entity_id, old_values, \
                 new_values, metadata, ip_address, user_agent, session_id, severity, \
                 description, timestamp \
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, AuditLogRow>(&query)
            .bind(entry.user_id)
            .bind(entry.admin_email.as_deref())
            .bind(entry.action.as_str())
            .bind(entry.entity_type.as_str())
            .bind(entry.entity_id.as_deref())
            .bind(entry.old_values.as_ref())
            .bind(entry.new_values.as_ref())
            .bind(entry.metadata.as_ref())
            .bind(entry.ip_address.as_deref())
            .bind(entry.user_agent.as_deref())
            .bind(entry.session_id.as_deref())
            .bind(entry.severity.as_str())
            .bind(&entry.description)
            .bind(entry.timestamp)
            .fetch_one(self.pool)
            .await?;

        row.try_into()
    }

    /// One page of entries matching `query`, newest first, plus the total
    /// number of matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn query(
        &self,
        query: &AuditLogQuery,
    ) -> Result<(Vec<AuditLogEntry>, u64), RepositoryError> {
        let query = query.normalized();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM caseflow.audit_logs");
        push_filters(&mut count, &query);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {COLUMNS} FROM caseflow.audit_logs"
        ));
        push_filters(&mut select, &query);
        select
            .push(" ORDER BY timestamp DESC, id DESC LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(query.offset()).unwrap_or(i64::MAX));

        let rows = select
            .build_query_as::<AuditLogRow>()
            .fetch_all(self.pool)
            .await?;
        let logs = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((logs, u64::try_from(total).unwrap_or(0)))
    }

    /// Every entry at or after `cutoff`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn list_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        let query = format!(
            "SELECT {COLUMNS} FROM caseflow.audit_logs \
             WHERE timestamp >= $1 \
             ORDER BY timestamp ASC"
        );
        let rows = sqlx::query_as::<_, AuditLogRow>(&query)
            .bind(cutoff)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

/// Append a WHERE clause for every set filter.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &AuditLogQuery) {
    builder.push(" WHERE TRUE");
    if let Some(user_id) = query.user_id {
        builder.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(email) = &query.admin_email {
        builder.push(" AND admin_email = ").push_bind(email.clone());
    }
    if let Some(action) = query.action {
        builder.push(" AND action = ").push_bind(action.as_str());
    }
    if let Some(entity_type) = query.entity_type {
        builder
            .push(" AND entity_type = ")
            .push_bind(entity_type.as_str());
    }
    if let Some(entity_id) = &query.entity_id {
        builder.push(" AND entity_id = ").push_bind(entity_id.clone());
    }
    if let Some(severity) = query.severity {
        builder.push(" AND severity = ").push_bind(severity.as_str());
    }
    if let Some(start) = query.start_date {
        builder.push(" AND timestamp >= ").push_bind(start);
    }
    if let Some(end) = query.end_date {
        builder.push(" AND timestamp <= ").push_bind(end);
    }
    if let Some(term) = query.search.as_deref().map(str::trim)
        && !term.is_empty()
    {
        let pattern = format!("%{}%", escape_like(term));
        builder
            .push(" AND (description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR entity_id ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR admin_email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Escape `LIKE` metacharacters so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
