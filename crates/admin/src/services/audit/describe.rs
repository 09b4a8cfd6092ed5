//! Human-readable descriptions for audit entries.

use serde_json::Value;

use caseflow_core::{AuditAction, EntityType};

/// Generate the description stored when the caller supplies none.
///
/// An UPDATE that carries both snapshots lists the fields whose serialized
/// value changed, in key order.
#[must_use]
pub fn describe(
    action: AuditAction,
    entity_type: EntityType,
    entity_id: Option<&str>,
    old_values: Option<&Value>,
    new_values: Option<&Value>,
) -> String {
    let subject = match entity_id {
        Some(id) => format!("{} {id}", entity_type.label()),
        None => entity_type.label().to_owned(),
    };

    match action {
        AuditAction::Create => format!("Created {subject}"),
        AuditAction::Update => match (old_values, new_values) {
            (Some(old), Some(new)) => {
                let fields = changed_fields(old, new);
                if fields.is_empty() {
                    format!("Updated {subject}")
                } else {
                    format!("Updated {subject}: {}", fields.join(", "))
                }
            }
            _ => format!("Updated {subject}"),
        },
        AuditAction::Delete => format!("Deleted {subject}"),
        AuditAction::Login => "User logged in".to_owned(),
        AuditAction::Logout => "User logged out".to_owned(),
        AuditAction::LoginFailed => "Failed login attempt".to_owned(),
        AuditAction::Upload => format!("Uploaded file for {subject}"),
        AuditAction::Download => format!("Downloaded file from {subject}"),
        AuditAction::View => format!("Viewed {subject}"),
        AuditAction::StatusChange => format!("Changed status of {subject}"),
        AuditAction::PermissionChange => format!("Changed permissions for {subject}"),
        AuditAction::SyncStart => "Data synchronization started".to_owned(),
        AuditAction::SyncComplete => "Data synchronization completed".to_owned(),
    }
}

/// Keys of `new` whose JSON serialization differs from the same key in `old`.
///
/// Keys absent from `old` count as changed. Non-object snapshots have no
/// fields.
#[must_use]
pub fn changed_fields(old: &Value, new: &Value) -> Vec<String> {
    let Value::Object(new) = new else {
        return Vec::new();
    };
    let mut fields: Vec<String> = new
        .iter()
        .filter(|(key, value)| {
            old.get(key.as_str())
                .is_none_or(|previous| previous.to_string() != value.to_string())
        })
        .map(|(key, _)| key.clone())
        .collect();
    fields.sort();
    fields
}
