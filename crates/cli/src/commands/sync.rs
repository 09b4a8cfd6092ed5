//! Manual reconciliation sweep.

use super::{CommandError, connect, print_json};

/// Run one sweep and print the report.
///
/// # Errors
///
/// Returns an error if the database cannot be reached or the user list
/// cannot be read.
pub async fn run() -> Result<(), CommandError> {
    let state = connect().await?;
    let report = state.sync().manual_sync().await?;

    tracing::info!(
        users_checked = report.users_checked,
        fixed = report.fixed_count(),
        needs_attention = report.needs_attention_count(),
        "Sweep complete"
    );
    print_json(&report)
}
