//! Docket repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use caseflow_core::{DocketId, UserId};

use super::{INSERTED_FLAG, RepositoryError, UpsertRow, Upserted};
use crate::models::{Docket, NewDocket, Reference};

/// Column list for `dockets` SELECT and RETURNING clauses.
const COLUMNS: &str = "\
    id, user_id, passport_front_url, passport_last_url, passport_photo_url, \
    offer_letter_url, current_address_proof_url, permanent_address_proof_url, \
    education_certificate_url, experience_certificate_url, police_clearance_url, \
    medical_certificate_url, reference_contacts, last_updated";

/// Internal row type for `PostgreSQL` docket queries.
#[derive(Debug, sqlx::FromRow)]
struct DocketRow {
    id: DocketId,
    user_id: UserId,
    passport_front_url: Option<String>,
    passport_last_url: Option<String>,
    passport_photo_url: Option<String>,
    offer_letter_url: Option<String>,
    current_address_proof_url: Option<String>,
    permanent_address_proof_url: Option<String>,
    education_certificate_url: Option<String>,
    experience_certificate_url: Option<String>,
    police_clearance_url: Option<String>,
    medical_certificate_url: Option<String>,
    reference_contacts: Json<Vec<Reference>>,
    last_updated: DateTime<Utc>,
}

impl From<DocketRow> for Docket {
    fn from(row: DocketRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            passport_front_url: row.passport_front_url,
            passport_last_url: row.passport_last_url,
            passport_photo_url: row.passport_photo_url,
            offer_letter_url: row.offer_letter_url,
            current_address_proof_url: row.current_address_proof_url,
            permanent_address_proof_url: row.permanent_address_proof_url,
            education_certificate_url: row.education_certificate_url,
            experience_certificate_url: row.experience_certificate_url,
            police_clearance_url: row.police_clearance_url,
            medical_certificate_url: row.medical_certificate_url,
            references: row.reference_contacts.0,
            last_updated: row.last_updated,
        }
    }
}

/// Repository for docket database operations.
pub struct DocketRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DocketRepository<'a> {
    /// Create a new docket repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the docket owned by a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_user(&self, user_id: UserId) -> Result<Option<Docket>, RepositoryError> {
        let query = format!("SELECT {COLUMNS} FROM caseflow.dockets WHERE user_id = $1");
        let row = sqlx::query_as::<_, DocketRow>(&query)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Create a docket, or return the one the user already has.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails (e.g. unknown user).
    pub async fn create(
        &self,
        docket: &NewDocket,
    ) -> Result<Upserted<Docket>, RepositoryError> {
        let query = format!(
            "INSERT INTO caseflow.dockets (user_id, reference_contacts) \
             VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING {COLUMNS}, {INSERTED_FLAG}"
        );
        let row = sqlx::query_as::<_, UpsertRow<DocketRow>>(&query)
            .bind(docket.user_id)
            .bind(Json(&docket.references))
            .fetch_one(self.pool)
            .await?;

        Ok(row.into_upserted())
    }
}
