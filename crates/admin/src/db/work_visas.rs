//! Work visa repository for database operations.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;

use caseflow_core::{UserId, WorkVisaId};

use super::{INSERTED_FLAG, RepositoryError, UpsertRow, Upserted};
use crate::models::{NewWorkVisa, WorkVisa, WorkVisaUpdate};

const COLUMNS: &str = "\
    id, user_id, status, visa_type, embassy_location, application_date, \
    interview_date, interview_time, tracking_code, notes, passport_copy_url, \
    photograph_url, employment_contract_url, accommodation_proof_url, \
    health_insurance_url, bank_statement_url, invitation_letter_url, \
    qualification_url, supporting_document_url, final_visa_url, updated_at";

/// Internal row type for `PostgreSQL` work visa queries.
#[derive(Debug, sqlx::FromRow)]
struct WorkVisaRow {
    id: WorkVisaId,
    user_id: UserId,
    status: String,
    visa_type: Option<String>,
    embassy_location: Option<String>,
    application_date: Option<NaiveDate>,
    interview_date: Option<NaiveDate>,
    interview_time: Option<NaiveTime>,
    tracking_code: Option<String>,
    notes: Option<String>,
    passport_copy_url: Option<String>,
    photograph_url: Option<String>,
    employment_contract_url: Option<String>,
    accommodation_proof_url: Option<String>,
    health_insurance_url: Option<String>,
    bank_statement_url: Option<String>,
    invitation_letter_url: Option<String>,
    qualification_url: Option<String>,
    supporting_document_url: Option<String>,
    final_visa_url: Option<String>,
    updated_at: DateTime<Utc>,
}

impl From<WorkVisaRow> for WorkVisa {
    fn from(row: WorkVisaRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            status: row.status,
            visa_type: row.visa_type,
            embassy_location: row.embassy_location,
            application_date: row.application_date,
            interview_date: row.interview_date,
            interview_time: row.interview_time,
            tracking_code: row.tracking_code,
            notes: row.notes,
            passport_copy_url: row.passport_copy_url,
            photograph_url: row.photograph_url,
            employment_contract_url: row.employment_contract_url,
            accommodation_proof_url: row.accommodation_proof_url,
            health_insurance_url: row.health_insurance_url,
            bank_statement_url: row.bank_statement_url,
            invitation_letter_url: row.invitation_letter_url,
            qualification_url: row.qualification_url,
            supporting_document_url: row.supporting_document_url,
            final_visa_url: row.final_visa_url,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for work visa database operations.
pub struct WorkVisaRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WorkVisaRepository<'a> {
    /// Create a new work visa repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the work visa owned by a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_user(&self, user_id: UserId) -> Result<Option<WorkVisa>, RepositoryError> {
        let query = format!("SELECT {COLUMNS} FROM caseflow.work_visas WHERE user_id = $1");
        let row = sqlx::query_as::<_, WorkVisaRow>(&query)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Create a work visa, or return the one the user already has.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        visa: &NewWorkVisa,
    ) -> Result<Upserted<WorkVisa>, RepositoryError> {
        let query = format!(
            "INSERT INTO caseflow.work_visas (user_id, status) \
             VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING {COLUMNS}, {INSERTED_FLAG}"
        );
        let row = sqlx::query_as::<_, UpsertRow<WorkVisaRow>>(&query)
            .bind(visa.user_id)
            .bind(visa.status.as_str())
            .fetch_one(self.pool)
            .await?;

        Ok(row.into_upserted())
    }

    /// Apply the set fields of `update` to the user's work visa.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no work visa.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        user_id: UserId,
        update: &WorkVisaUpdate,
    ) -> Result<WorkVisa, RepositoryError> {
        let query = format!(
            "UPDATE caseflow.work_visas \
             SET status = COALESCE($2, status), \
                 interview_date = COALESCE($3, interview_date), \
                 interview_time = COALESCE($4, interview_time), \
                 notes = COALESCE($5, notes), \
                 updated_at = NOW() \
             WHERE user_id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkVisaRow>(&query)
            .bind(user_id)
            .bind(update.status.map(|s| s.as_str()))
            .bind(update.interview_date)
            .bind(update.interview_time)
            .bind(update.notes.as_deref())
            .fetch_optional(self.pool)
            .await?
            .map(Into::into)
            .ok_or(RepositoryError::NotFound)
    }
}
