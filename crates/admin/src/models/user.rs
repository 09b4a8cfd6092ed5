//! Candidate and administrator accounts.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use caseflow_core::UserId;

/// A user account with its lifecycle flags.
///
/// `archived == true` implies `archived_at` is set and `archived_reason`
/// is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Login email address.
    pub email: String,
    /// Name shown in the admin panel.
    pub display_name: String,
    /// Whether the account has administrator rights.
    pub is_admin: bool,
    /// Whether the candidate has finished uploading their docket.
    pub docket_completed: bool,
    /// Whether the account has been soft-retired.
    pub archived: bool,
    /// When the account was archived.
    pub archived_at: Option<DateTime<Utc>>,
    /// Why the account was archived.
    pub archived_reason: Option<String>,
    /// When the account was provisioned.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether the user is in the active (non-archived) set.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.archived
    }

    /// Time elapsed since the account was created.
    #[must_use]
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }
}

/// Parameters for provisioning a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login email address.
    pub email: String,
    /// Name shown in the admin panel.
    pub display_name: String,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Whether the account has administrator rights.
    pub is_admin: bool,
    /// Whether the docket is already marked complete.
    pub docket_completed: bool,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    /// A candidate account created at `created_at`.
    #[must_use]
    pub fn candidate(email: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            email: email.to_owned(),
            display_name: email.split('@').next().unwrap_or(email).to_owned(),
            phone: None,
            is_admin: false,
            docket_completed: false,
            created_at,
        }
    }
}
