//! Work visa applications.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use caseflow_core::{UserId, WorkVisaId, WorkVisaStatus};

/// A candidate's work visa workflow, including the embassy interview.
///
/// A visa in `interview_scheduled` must have both `interview_date` and
/// `interview_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkVisa {
    pub id: WorkVisaId,
    pub user_id: UserId,
    /// Raw stored status, see [`WorkVisa::parsed_status`].
    pub status: String,
    pub visa_type: Option<String>,
    pub embassy_location: Option<String>,
    pub application_date: Option<NaiveDate>,
    pub interview_date: Option<NaiveDate>,
    pub interview_time: Option<NaiveTime>,
    pub tracking_code: Option<String>,
    pub notes: Option<String>,
    pub passport_copy_url: Option<String>,
    pub photograph_url: Option<String>,
    pub employment_contract_url: Option<String>,
    pub accommodation_proof_url: Option<String>,
    pub health_insurance_url: Option<String>,
    pub bank_statement_url: Option<String>,
    pub invitation_letter_url: Option<String>,
    pub qualification_url: Option<String>,
    pub supporting_document_url: Option<String>,
    pub final_visa_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl WorkVisa {
    /// The status, if it is a member of the vocabulary.
    #[must_use]
    pub fn parsed_status(&self) -> Option<WorkVisaStatus> {
        self.status.parse().ok()
    }

    /// Whether both halves of the interview appointment are set.
    #[must_use]
    pub const fn has_interview_slot(&self) -> bool {
        self.interview_date.is_some() && self.interview_time.is_some()
    }
}

/// Parameters for creating a work visa.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkVisa {
    pub user_id: UserId,
    pub status: WorkVisaStatus,
}

impl NewWorkVisa {
    /// A work visa still in preparation, with no interview.
    #[must_use]
    pub fn defaults(user_id: UserId) -> Self {
        Self {
            user_id,
            status: WorkVisaStatus::default(),
        }
    }
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkVisaUpdate {
    pub status: Option<WorkVisaStatus>,
    pub interview_date: Option<NaiveDate>,
    pub interview_time: Option<NaiveTime>,
    pub notes: Option<String>,
}
