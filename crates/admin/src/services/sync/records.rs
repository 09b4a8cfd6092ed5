//! The four per-user sub-records, as seen by the sweep.

use std::convert::Infallible;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};

use caseflow_core::{ContractStatus, EntityType, UserId, WorkPermitStatus, WorkVisaStatus};

use crate::db::{RecordStore, RepositoryError, Upserted};
use crate::models::{
    Contract, ContractDocument, ContractUpdate, Docket, NewContract, NewDocket, NewWorkPermit,
    NewWorkVisa, User, WorkPermit, WorkPermitUpdate, WorkVisa, WorkVisaUpdate,
};

/// A field value the sweep will overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction<U> {
    /// Partial update that applies the correction.
    pub update: U,
    pub field: &'static str,
    pub old: String,
    pub new: &'static str,
}

/// One problem found on a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding<U> {
    pub issue: String,
    /// `None` when only a human can resolve the problem.
    pub correction: Option<Correction<U>>,
}

impl<U> Finding<U> {
    fn flag(issue: impl Into<String>) -> Self {
        Self {
            issue: issue.into(),
            correction: None,
        }
    }

    fn corrected(issue: impl Into<String>, correction: Correction<U>) -> Self {
        Self {
            issue: issue.into(),
            correction: Some(correction),
        }
    }
}

/// Repair made to the owning user right after a record was auto-created.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRepair {
    pub issue: String,
    pub old_values: Value,
    pub new_values: Value,
}

/// A per-user record the sweep keeps present and valid.
#[async_trait]
pub trait SubRecord: Serialize + Send + Sync + Sized {
    /// Entity type used in reports and audit entries.
    const KIND: EntityType;

    /// Partial update used to apply corrections.
    type Update: Send + Sync;

    fn entity_id(&self) -> String;

    async fn fetch(store: &dyn RecordStore, user_id: UserId)
    -> Result<Option<Self>, RepositoryError>;

    /// Create the record with safe defaults, or return the one that already exists.
    async fn create_default(
        store: &dyn RecordStore,
        user_id: UserId,
    ) -> Result<Upserted<Self>, RepositoryError>;

    async fn apply(
        store: &dyn RecordStore,
        user_id: UserId,
        update: &Self::Update,
    ) -> Result<(), RepositoryError>;

    /// Problems with an existing record. Pure.
    fn inspect(&self) -> Vec<Finding<Self::Update>>;

    /// Hook run after `create_default`.
    async fn after_create(
        _store: &dyn RecordStore,
        _user: &User,
    ) -> Result<Option<UserRepair>, RepositoryError> {
        Ok(None)
    }
}

#[async_trait]
impl SubRecord for Docket {
    const KIND: EntityType = EntityType::Docket;
    type Update = Infallible;

    fn entity_id(&self) -> String {
        self.id.to_string()
    }

    async fn fetch(
        store: &dyn RecordStore,
        user_id: UserId,
    ) -> Result<Option<Self>, RepositoryError> {
        store.get_docket(user_id).await
    }

    async fn create_default(
        store: &dyn RecordStore,
        user_id: UserId,
    ) -> Result<Upserted<Self>, RepositoryError> {
        store.create_docket(&NewDocket::defaults(user_id)).await
    }

    async fn apply(
        _store: &dyn RecordStore,
        _user_id: UserId,
        update: &Infallible,
    ) -> Result<(), RepositoryError> {
        match *update {}
    }

    fn inspect(&self) -> Vec<Finding<Infallible>> {
        if self.has_passport_documents() {
            Vec::new()
        } else {
            vec![Finding::flag("No passport documents uploaded yet")]
        }
    }

    /// An empty docket cannot be complete.
    async fn after_create(
        store: &dyn RecordStore,
        user: &User,
    ) -> Result<Option<UserRepair>, RepositoryError> {
        if !user.docket_completed {
            return Ok(None);
        }
        store.set_docket_completed(user.id, false).await?;
        Ok(Some(UserRepair {
            issue: "Docket marked complete without a docket record, completion flag reset"
                .to_owned(),
            old_values: json!({ "docket_completed": true }),
            new_values: json!({ "docket_completed": false }),
        }))
    }
}

#[async_trait]
impl SubRecord for WorkPermit {
    const KIND: EntityType = EntityType::WorkPermit;
    type Update = WorkPermitUpdate;

    fn entity_id(&self) -> String {
        self.id.to_string()
    }

    async fn fetch(
        store: &dyn RecordStore,
        user_id: UserId,
    ) -> Result<Option<Self>, RepositoryError> {
        store.get_work_permit(user_id).await
    }

    async fn create_default(
        store: &dyn RecordStore,
        user_id: UserId,
    ) -> Result<Upserted<Self>, RepositoryError> {
        store
            .create_work_permit(&NewWorkPermit::defaults(user_id))
            .await
    }

    async fn apply(
        store: &dyn RecordStore,
        user_id: UserId,
        update: &WorkPermitUpdate,
    ) -> Result<(), RepositoryError> {
        store.update_work_permit(user_id, update).await.map(|_| ())
    }

    fn inspect(&self) -> Vec<Finding<WorkPermitUpdate>> {
        if self.parsed_status().is_some() {
            return Vec::new();
        }
        let reset = WorkPermitStatus::default();
        vec![Finding::corrected(
            format!(
                "Invalid work permit status {:?}, reset to {reset}",
                self.status
            ),
            Correction {
                update: WorkPermitUpdate {
                    status: Some(reset),
                    ..WorkPermitUpdate::default()
                },
                field: "status",
                old: self.status.clone(),
                new: reset.as_str(),
            },
        )]
    }
}

#[async_trait]
impl SubRecord for WorkVisa {
    const KIND: EntityType = EntityType::WorkVisa;
    type Update = WorkVisaUpdate;

    fn entity_id(&self) -> String {
        self.id.to_string()
    }

    async fn fetch(
        store: &dyn RecordStore,
        user_id: UserId,
    ) -> Result<Option<Self>, RepositoryError> {
        store.get_work_visa(user_id).await
    }

    async fn create_default(
        store: &dyn RecordStore,
        user_id: UserId,
    ) -> Result<Upserted<Self>, RepositoryError> {
        store.create_work_visa(&NewWorkVisa::defaults(user_id)).await
    }

    async fn apply(
        store: &dyn RecordStore,
        user_id: UserId,
        update: &WorkVisaUpdate,
    ) -> Result<(), RepositoryError> {
        store.update_work_visa(user_id, update).await.map(|_| ())
    }

    fn inspect(&self) -> Vec<Finding<WorkVisaUpdate>> {
        let mut findings = Vec::new();
        let mut demoted = false;

        match self.parsed_status() {
            None => {
                let reset = WorkVisaStatus::default();
                findings.push(Finding::corrected(
                    format!(
                        "Invalid work visa status {:?}, reset to {reset}",
                        self.status
                    ),
                    status_correction(&self.status, reset),
                ));
            }
            Some(WorkVisaStatus::InterviewScheduled) if !self.has_interview_slot() => {
                demoted = true;
                findings.push(Finding::corrected(
                    "Interview scheduled without interview date and time, status set to applied",
                    status_correction(&self.status, WorkVisaStatus::Applied),
                ));
            }
            Some(_) => {}
        }

        if !demoted && self.interview_date.is_some() && self.interview_time.is_none() {
            findings.push(Finding::flag(
                "Interview date set without interview time, needs follow-up",
            ));
        }

        findings
    }
}

fn status_correction(old: &str, new: WorkVisaStatus) -> Correction<WorkVisaUpdate> {
    Correction {
        update: WorkVisaUpdate {
            status: Some(new),
            ..WorkVisaUpdate::default()
        },
        field: "status",
        old: old.to_owned(),
        new: new.as_str(),
    }
}

#[async_trait]
impl SubRecord for Contract {
    const KIND: EntityType = EntityType::Contract;
    type Update = ContractUpdate;

    fn entity_id(&self) -> String {
        self.id.to_string()
    }

    async fn fetch(
        store: &dyn RecordStore,
        user_id: UserId,
    ) -> Result<Option<Self>, RepositoryError> {
        store.get_contract(user_id).await
    }

    async fn create_default(
        store: &dyn RecordStore,
        user_id: UserId,
    ) -> Result<Upserted<Self>, RepositoryError> {
        store.create_contract(&NewContract::defaults(user_id)).await
    }

    async fn apply(
        store: &dyn RecordStore,
        user_id: UserId,
        update: &ContractUpdate,
    ) -> Result<(), RepositoryError> {
        store.update_contract(user_id, update).await.map(|_| ())
    }

    fn inspect(&self) -> Vec<Finding<ContractUpdate>> {
        let reset = ContractStatus::default();
        ContractDocument::ALL
            .into_iter()
            .filter(|&document| !ContractStatus::is_valid(self.status_of(document)))
            .map(|document| {
                let current = self.status_of(document);
                Finding::corrected(
                    format!(
                        "Invalid {} status {current:?}, reset to {reset}",
                        document.label()
                    ),
                    Correction {
                        update: ContractUpdate::status(document, reset),
                        field: match document {
                            ContractDocument::CompanyContract => "company_contract_status",
                            ContractDocument::JobOffer => "job_offer_status",
                        },
                        old: current.to_owned(),
                        new: reset.as_str(),
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use caseflow_core::{ContractId, DocketId, WorkVisaId};

    fn visa(status: &str) -> WorkVisa {
        WorkVisa {
            id: WorkVisaId::new(1),
            user_id: UserId::new(1),
            status: status.to_string(),
            visa_type: None,
            embassy_location: None,
            application_date: None,
            interview_date: None,
            interview_time: None,
            tracking_code: None,
            notes: None,
            passport_copy_url: None,
            photograph_url: None,
            employment_contract_url: None,
            accommodation_proof_url: None,
            health_insurance_url: None,
            bank_statement_url: None,
            invitation_letter_url: None,
            qualification_url: None,
            supporting_document_url: None,
            final_visa_url: None,
            updated_at: Utc::now(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 4).unwrap()
    }

    #[test]
    fn test_invalid_visa_status_resets_to_preparation() {
        let findings = visa("bogus_status").inspect();
        assert_eq!(findings.len(), 1);
        let correction = findings[0].correction.as_ref().unwrap();
        assert_eq!(correction.update.status, Some(WorkVisaStatus::Preparation));
        assert_eq!(correction.old, "bogus_status");
        assert_eq!(
            findings[0].issue,
            "Invalid work visa status \"bogus_status\", reset to preparation"
        );
    }

    #[test]
    fn test_interview_without_slot_is_demoted() {
        let mut record = visa("interview_scheduled");
        record.interview_date = Some(date());
        let findings = record.inspect();
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].correction.as_ref().unwrap().update.status,
            Some(WorkVisaStatus::Applied)
        );
    }

    #[test]
    fn test_interview_with_slot_is_clean() {
        let mut record = visa("interview_scheduled");
        record.interview_date = Some(date());
        record.interview_time = NaiveTime::from_hms_opt(9, 30, 0);
        assert!(record.inspect().is_empty());
    }

    #[test]
    fn test_date_without_time_is_flagged_not_fixed() {
        let mut record = visa("applied");
        record.interview_date = Some(date());
        let findings = record.inspect();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].correction.is_none());
    }

    #[test]
    fn test_contract_documents_are_checked_independently() {
        let contract = Contract {
            id: ContractId::new(1),
            user_id: UserId::new(1),
            company_contract_original_url: None,
            company_contract_signed_url: None,
            company_contract_status: "signed".to_string(),
            job_offer_original_url: None,
            job_offer_signed_url: None,
            job_offer_status: "lost".to_string(),
            company_contract_signature_valid: None,
            job_offer_signature_valid: None,
            updated_at: Utc::now(),
        };
        let findings = contract.inspect();
        assert_eq!(findings.len(), 1);
        let correction = findings[0].correction.as_ref().unwrap();
        assert_eq!(correction.field, "job_offer_status");
        assert_eq!(correction.update.job_offer_status, Some(ContractStatus::Pending));
        assert_eq!(correction.update.company_contract_status, None);
    }

    #[test]
    fn test_docket_without_passport_is_flagged() {
        let mut docket = Docket {
            id: DocketId::new(1),
            user_id: UserId::new(1),
            passport_front_url: None,
            passport_last_url: None,
            passport_photo_url: None,
            offer_letter_url: None,
            current_address_proof_url: None,
            permanent_address_proof_url: None,
            education_certificate_url: None,
            experience_certificate_url: None,
            police_clearance_url: None,
            medical_certificate_url: None,
            references: Vec::new(),
            last_updated: Utc::now(),
        };
        assert_eq!(docket.inspect().len(), 1);
        docket.passport_last_url = Some("https://files.example/p.pdf".to_string());
        assert!(docket.inspect().is_empty());
    }
}
