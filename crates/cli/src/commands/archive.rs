//! Archival commands.
//!
//! # Usage
//!
//! ```bash
//! caseflow archive run
//! caseflow archive user 42 -r "withdrew application" -a ops@example.com
//! caseflow archive restore 42
//! caseflow archive stats
//! ```

use caseflow_core::UserId;

use super::{CommandError, connect, print_json};

/// Archive every eligible user now.
///
/// # Errors
///
/// Returns an error if the database cannot be reached.
pub async fn run() -> Result<(), CommandError> {
    let state = connect().await?;
    let run = state.archive().run_automatic_archive().await;
    for error in &run.errors {
        tracing::warn!("{error}");
    }
    print_json(&run)
}

/// Archive one user.
///
/// # Errors
///
/// Returns an error if the user is unknown or already archived.
pub async fn archive_user(
    id: UserId,
    reason: Option<&str>,
    admin: Option<&str>,
) -> Result<(), CommandError> {
    let state = connect().await?;
    let user = state.archive().archive_user(id, reason, admin).await?;
    tracing::info!("Archived {} ({})", user.email, user.id);
    print_json(&user)
}

/// Restore one archived user.
///
/// # Errors
///
/// Returns an error if the user is unknown or not archived.
pub async fn restore_user(id: UserId, admin: Option<&str>) -> Result<(), CommandError> {
    let state = connect().await?;
    let user = state.archive().unarchive_user(id, admin).await?;
    tracing::info!("Restored {} ({})", user.email, user.id);
    print_json(&user)
}

/// Print archive statistics.
///
/// # Errors
///
/// Returns an error if the database cannot be reached.
pub async fn stats() -> Result<(), CommandError> {
    let state = connect().await?;
    print_json(&state.archive().get_archive_stats().await)
}
