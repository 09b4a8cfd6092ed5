//! Audit reporting commands.

use caseflow_admin::models::AuditLogQuery;
use caseflow_core::{AuditAction, EntityType, Severity, UserId};

use super::{CommandError, connect, print_json};

/// Filters accepted by `caseflow audit logs`.
pub struct LogFilter {
    pub page: u32,
    pub limit: u32,
    pub user_id: Option<UserId>,
    pub action: Option<AuditAction>,
    pub entity_type: Option<EntityType>,
    pub severity: Option<Severity>,
    pub search: Option<String>,
}

impl From<LogFilter> for AuditLogQuery {
    fn from(filter: LogFilter) -> Self {
        Self {
            page: filter.page,
            limit: filter.limit,
            user_id: filter.user_id,
            action: filter.action,
            entity_type: filter.entity_type,
            severity: filter.severity,
            search: filter.search,
            ..Self::default()
        }
    }
}

/// Print statistics for the last `days` days.
///
/// # Errors
///
/// Returns an error if the audit log cannot be read.
pub async fn stats(days: u32) -> Result<(), CommandError> {
    let state = connect().await?;
    let stats = state.audit().get_audit_stats(days).await?;
    print_json(&stats)
}

/// Print one page of matching entries.
///
/// # Errors
///
/// Returns an error if the audit log cannot be read.
pub async fn logs(filter: LogFilter) -> Result<(), CommandError> {
    let state = connect().await?;
    let page = state.audit().get_audit_logs(&filter.into()).await?;
    tracing::info!(
        "Page {} of {} ({} entries)",
        page.page,
        page.total_pages,
        page.total
    );
    print_json(&page)
}
