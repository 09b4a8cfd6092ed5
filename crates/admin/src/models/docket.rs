//! Candidate document bundles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use caseflow_core::{DocketId, UserId};

/// A professional reference listed in a docket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub full_name: String,
    pub company: String,
    pub designation: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// The identity, education and employment documents a candidate submits.
///
/// Exactly one per user. Every document URL is `None` until uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Docket {
    pub id: DocketId,
    pub user_id: UserId,
    pub passport_front_url: Option<String>,
    pub passport_last_url: Option<String>,
    pub passport_photo_url: Option<String>,
    pub offer_letter_url: Option<String>,
    pub current_address_proof_url: Option<String>,
    pub permanent_address_proof_url: Option<String>,
    pub education_certificate_url: Option<String>,
    pub experience_certificate_url: Option<String>,
    pub police_clearance_url: Option<String>,
    pub medical_certificate_url: Option<String>,
    pub references: Vec<Reference>,
    pub last_updated: DateTime<Utc>,
}

impl Docket {
    /// Whether either passport page has been uploaded.
    #[must_use]
    pub const fn has_passport_documents(&self) -> bool {
        self.passport_front_url.is_some() || self.passport_last_url.is_some()
    }
}

/// Parameters for creating a docket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocket {
    pub user_id: UserId,
    pub references: Vec<Reference>,
}

impl NewDocket {
    /// An empty docket: no documents, no references.
    #[must_use]
    pub const fn defaults(user_id: UserId) -> Self {
        Self {
            user_id,
            references: Vec::new(),
        }
    }
}
