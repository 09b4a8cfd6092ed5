//! Audit log vocabulary.
//!
//! These strings are stored verbatim in the audit log table and must match
//! entries written by earlier deployments exactly.

string_vocabulary! {
    /// What happened.
    pub enum AuditAction("audit action") {
        Create => "CREATE",
        Update => "UPDATE",
        Delete => "DELETE",
        Login => "LOGIN",
        Logout => "LOGOUT",
        LoginFailed => "LOGIN_FAILED",
        Upload => "UPLOAD",
        Download => "DOWNLOAD",
        View => "VIEW",
        StatusChange => "STATUS_CHANGE",
        PermissionChange => "PERMISSION_CHANGE",
        SyncStart => "SYNC_START",
        SyncComplete => "SYNC_COMPLETE",
    }
}

impl AuditAction {
    /// Create, update or delete of a record.
    #[must_use]
    pub const fn is_data_modification(self) -> bool {
        matches!(self, Self::Create | Self::Update | Self::Delete)
    }

    /// Upload or download of a file.
    #[must_use]
    pub const fn is_file_operation(self) -> bool {
        matches!(self, Self::Upload | Self::Download)
    }

    /// Actions that destroy data or change access rights.
    #[must_use]
    pub const fn is_high_risk(self) -> bool {
        matches!(self, Self::Delete | Self::PermissionChange)
    }
}

string_vocabulary! {
    /// What kind of thing it happened to.
    pub enum EntityType("entity type") {
        User => "user",
        Docket => "docket",
        Contract => "contract",
        WorkPermit => "work_permit",
        WorkVisa => "work_visa",
        Notification => "notification",
        System => "system",
        Session => "session",
        File => "file",
    }
}

impl EntityType {
    /// Human-readable label used in generated descriptions.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Docket => "docket",
            Self::Contract => "contract",
            Self::WorkPermit => "work permit",
            Self::WorkVisa => "work visa",
            Self::Notification => "notification",
            Self::System => "system",
            Self::Session => "session",
            Self::File => "file",
        }
    }
}

string_vocabulary! {
    /// How much attention an entry deserves.
    pub enum Severity("severity") {
        Info => "info",
        Warning => "warning",
        Error => "error",
        Critical => "critical",
    }
}

impl Severity {
    /// `error` or `critical`.
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Error | Self::Critical)
    }
}

impl Default for Severity {
    fn default() -> Self {
        Self::Info
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_action_vocabulary_is_complete() {
        let wire: Vec<&str> = AuditAction::ALL.iter().map(|a| a.as_str()).collect();
        assert_eq!(
            wire,
            [
                "CREATE",
                "UPDATE",
                "DELETE",
                "LOGIN",
                "LOGOUT",
                "LOGIN_FAILED",
                "UPLOAD",
                "DOWNLOAD",
                "VIEW",
                "STATUS_CHANGE",
                "PERMISSION_CHANGE",
                "SYNC_START",
                "SYNC_COMPLETE",
            ]
        );
    }

    #[test]
    fn test_entity_vocabulary_is_complete() {
        let wire: Vec<&str> = EntityType::ALL.iter().map(|e| e.as_str()).collect();
        assert_eq!(
            wire,
            [
                "user",
                "docket",
                "contract",
                "work_permit",
                "work_visa",
                "notification",
                "system",
                "session",
                "file",
            ]
        );
    }

    #[test]
    fn test_action_parse_is_case_sensitive() {
        assert_eq!("LOGIN_FAILED".parse::<AuditAction>().unwrap(), AuditAction::LoginFailed);
        assert!("login_failed".parse::<AuditAction>().is_err());
    }

    #[test]
    fn test_action_categories() {
        assert!(AuditAction::Delete.is_data_modification());
        assert!(AuditAction::Delete.is_high_risk());
        assert!(AuditAction::PermissionChange.is_high_risk());
        assert!(!AuditAction::Update.is_high_risk());
        assert!(AuditAction::Download.is_file_operation());
        assert!(!AuditAction::View.is_file_operation());
    }

    #[test]
    fn test_severity_errors() {
        assert!(Severity::Critical.is_error());
        assert!(Severity::Error.is_error());
        assert!(!Severity::Warning.is_error());
        assert_eq!(Severity::default(), Severity::Info);
    }
}
