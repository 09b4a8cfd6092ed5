//! Audit log entries and queries.
//!
//! Entries are append-only: nothing in this crate updates or deletes one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use caseflow_core::{AuditAction, EntityType, Severity, UserId};

/// Default page size for audit log listings.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 500;

/// A single immutable audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub user_id: Option<UserId>,
    pub admin_email: Option<String>,
    pub action: AuditAction,
    pub entity_type: EntityType,
    pub entity_id: Option<String>,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub metadata: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub session_id: Option<String>,
    pub severity: Severity,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Parameters for appending an audit log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditLogEntry {
    pub user_id: Option<UserId>,
    pub admin_email: Option<String>,
    pub action: AuditAction,
    pub entity_type: EntityType,
    pub entity_id: Option<String>,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub metadata: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub session_id: Option<String>,
    pub severity: Severity,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Filters and paging for audit log listings.
///
/// Every filter is optional; set filters are combined with AND.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogQuery {
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    pub user_id: Option<UserId>,
    pub admin_email: Option<String>,
    pub action: Option<AuditAction>,
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<String>,
    pub severity: Option<Severity>,
    /// Inclusive lower bound on `timestamp`.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `timestamp`.
    pub end_date: Option<DateTime<Utc>>,
    /// Case-insensitive substring of description, entity ID or admin email.
    pub search: Option<String>,
}

impl Default for AuditLogQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            user_id: None,
            admin_email: None,
            action: None,
            entity_type: None,
            entity_id: None,
            severity: None,
            start_date: None,
            end_date: None,
            search: None,
        }
    }
}

impl AuditLogQuery {
    /// Copy of this query with page and limit pulled into range.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_PAGE_SIZE),
            ..self.clone()
        }
    }

    /// Number of entries skipped before this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Whether `entry` passes every filter (paging is not applied).
    #[must_use]
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        if self.user_id.is_some_and(|id| entry.user_id != Some(id)) {
            return false;
        }
        if let Some(email) = &self.admin_email
            && entry.admin_email.as_deref() != Some(email.as_str())
        {
            return false;
        }
        if self.action.is_some_and(|a| a != entry.action) {
            return false;
        }
        if self.entity_type.is_some_and(|t| t != entry.entity_type) {
            return false;
        }
        if let Some(entity_id) = &self.entity_id
            && entry.entity_id.as_deref() != Some(entity_id.as_str())
        {
            return false;
        }
        if self.severity.is_some_and(|s| s != entry.severity) {
            return false;
        }
        if self.start_date.is_some_and(|start| entry.timestamp < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| entry.timestamp > end) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                let contains = |field: Option<&str>| {
                    field.is_some_and(|value| value.to_lowercase().contains(&term))
                };
                contains(Some(&entry.description))
                    || contains(entry.entity_id.as_deref())
                    || contains(entry.admin_email.as_deref())
            }
        }
    }
}

/// One page of audit log entries, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct AuditLogPage {
    pub logs: Vec<AuditLogEntry>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn entry() -> AuditLogEntry {
        AuditLogEntry {
            id: Uuid::new_v4(),
            user_id: Some(UserId::new(7)),
            admin_email: Some("Ops@Example.com".to_string()),
            action: AuditAction::Update,
            entity_type: EntityType::WorkVisa,
            entity_id: Some("31".to_string()),
            old_values: None,
            new_values: None,
            metadata: None,
            ip_address: None,
            user_agent: None,
            session_id: None,
            severity: Severity::Info,
            description: "Updated work visa 31: status".to_string(),
            timestamp: "2026-03-01T10:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(AuditLogQuery::default().matches(&entry()));
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let by_description = AuditLogQuery {
            search: Some("WORK VISA".to_string()),
            ..AuditLogQuery::default()
        };
        let by_email = AuditLogQuery {
            search: Some("ops@example".to_string()),
            ..AuditLogQuery::default()
        };
        let miss = AuditLogQuery {
            search: Some("contract".to_string()),
            ..AuditLogQuery::default()
        };
        assert!(by_description.matches(&entry()));
        assert!(by_email.matches(&entry()));
        assert!(!miss.matches(&entry()));
    }

    #[test]
    fn test_date_bounds_are_inclusive() {
        let at = entry().timestamp;
        let query = AuditLogQuery {
            start_date: Some(at),
            end_date: Some(at),
            ..AuditLogQuery::default()
        };
        assert!(query.matches(&entry()));

        let after = AuditLogQuery {
            start_date: Some(at + chrono::Duration::seconds(1)),
            ..AuditLogQuery::default()
        };
        assert!(!after.matches(&entry()));
    }

    #[test]
    fn test_typed_filters() {
        let wrong_action = AuditLogQuery {
            action: Some(AuditAction::Delete),
            ..AuditLogQuery::default()
        };
        let right_entity = AuditLogQuery {
            entity_type: Some(EntityType::WorkVisa),
            user_id: Some(UserId::new(7)),
            ..AuditLogQuery::default()
        };
        assert!(!wrong_action.matches(&entry()));
        assert!(right_entity.matches(&entry()));
    }

    #[test]
    fn test_normalized_paging() {
        let query = AuditLogQuery {
            page: 0,
            limit: 10_000,
            ..AuditLogQuery::default()
        }
        .normalized();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, MAX_PAGE_SIZE);
        assert_eq!(query.offset(), 0);

        let third = AuditLogQuery {
            page: 3,
            limit: 20,
            ..AuditLogQuery::default()
        };
        assert_eq!(third.offset(), 40);
    }
}
