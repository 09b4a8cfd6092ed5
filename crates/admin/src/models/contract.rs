//! Employment contracts and job offers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use caseflow_core::{ContractId, ContractStatus, UserId};

/// The two documents a contract record tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractDocument {
    CompanyContract,
    JobOffer,
}

impl ContractDocument {
    /// Both documents, in display order.
    pub const ALL: [Self; 2] = [Self::CompanyContract, Self::JobOffer];

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CompanyContract => "company contract",
            Self::JobOffer => "job offer",
        }
    }
}

/// Original and counter-signed copies of a candidate's contract documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub user_id: UserId,
    pub company_contract_original_url: Option<String>,
    pub company_contract_signed_url: Option<String>,
    pub company_contract_status: String,
    pub job_offer_original_url: Option<String>,
    pub job_offer_signed_url: Option<String>,
    pub job_offer_status: String,
    /// Outcome of the signature heuristic on the signed company contract.
    pub company_contract_signature_valid: Option<bool>,
    /// Outcome of the signature heuristic on the signed job offer.
    pub job_offer_signature_valid: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    /// Raw stored status of one document.
    #[must_use]
    pub fn status_of(&self, document: ContractDocument) -> &str {
        match document {
            ContractDocument::CompanyContract => &self.company_contract_status,
            ContractDocument::JobOffer => &self.job_offer_status,
        }
    }
}

/// Parameters for creating a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContract {
    pub user_id: UserId,
    pub company_contract_status: ContractStatus,
    pub job_offer_status: ContractStatus,
}

impl NewContract {
    /// Both documents pending, nothing uploaded.
    #[must_use]
    pub fn defaults(user_id: UserId) -> Self {
        Self {
            user_id,
            company_contract_status: ContractStatus::default(),
            job_offer_status: ContractStatus::default(),
        }
    }
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractUpdate {
    pub company_contract_status: Option<ContractStatus>,
    pub job_offer_status: Option<ContractStatus>,
}

impl ContractUpdate {
    /// Update setting one document's status.
    #[must_use]
    pub fn status(document: ContractDocument, status: ContractStatus) -> Self {
        match document {
            ContractDocument::CompanyContract => Self {
                company_contract_status: Some(status),
                ..Self::default()
            },
            ContractDocument::JobOffer => Self {
                job_offer_status: Some(status),
                ..Self::default()
            },
        }
    }
}
