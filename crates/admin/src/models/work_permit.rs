//! Work permit applications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use caseflow_core::{UserId, WorkPermitId, WorkPermitStatus};

/// A candidate's work permit workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkPermit {
    pub id: WorkPermitId,
    pub user_id: UserId,
    /// Raw stored status, see [`WorkPermit::parsed_status`].
    pub status: String,
    pub notes: Option<String>,
    pub final_docket_url: Option<String>,
    pub tracking_code: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl WorkPermit {
    /// The status, if it is a member of the vocabulary.
    #[must_use]
    pub fn parsed_status(&self) -> Option<WorkPermitStatus> {
        self.status.parse().ok()
    }
}

/// Parameters for creating a work permit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkPermit {
    pub user_id: UserId,
    pub status: WorkPermitStatus,
}

impl NewWorkPermit {
    /// A work permit still in preparation.
    #[must_use]
    pub fn defaults(user_id: UserId) -> Self {
        Self {
            user_id,
            status: WorkPermitStatus::default(),
        }
    }
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkPermitUpdate {
    pub status: Option<WorkPermitStatus>,
    pub notes: Option<String>,
}
