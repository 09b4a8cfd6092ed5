//! Contract repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use caseflow_core::{ContractId, UserId};

use super::{INSERTED_FLAG, RepositoryError, UpsertRow, Upserted};
use crate::models::{Contract, ContractUpdate, NewContract};

const COLUMNS: &str = "\
    id, user_id, company_contract_original_url, company_contract_signed_url, \
    company_contract_status, job_offer_original_url, job_offer_signed_url, \
    job_offer_status, company_contract_signature_valid, job_offer_signature_valid, \
    updated_at";

/// Internal row type for `PostgreSQL` contract queries.
#[derive(Debug, sqlx::FromRow)]
struct ContractRow {
    id: ContractId,
    user_id: UserId,
    company_contract_original_url: Option<String>,
    company_contract_signed_url: Option<String>,
    company_contract_status: String,
    job_offer_original_url: Option<String>,
    job_offer_signed_url: Option<String>,
    job_offer_status: String,
    company_contract_signature_valid: Option<bool>,
    job_offer_signature_valid: Option<bool>,
    updated_at: DateTime<Utc>,
}

impl From<ContractRow> for Contract {
    fn from(row: ContractRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            company_contract_original_url: row.company_contract_original_url,
            company_contract_signed_url: row.company_contract_signed_url,
            company_contract_status: row.company_contract_status,
            job_offer_original_url: row.job_offer_original_url,
            job_offer_signed_url: row.job_offer_signed_url,
            job_offer_status: row.job_offer_status,
            company_contract_signature_valid: row.company_contract_signature_valid,
            job_offer_signature_valid: row.job_offer_signature_valid,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for contract database operations.
pub struct ContractRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContractRepository<'a> {
    /// Create a new contract repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the contract record owned by a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_user(&self, user_id: UserId) -> Result<Option<Contract>, RepositoryError> {
        let query = format!("SELECT {COLUMNS} FROM caseflow.contracts WHERE user_id = $1");
        let row = sqlx::query_as::<_, ContractRow>(&query)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Create a contract record, or return the one the user already has.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        contract: &NewContract,
    ) -> Result<Upserted<Contract>, RepositoryError> {
        let query = format!(
            "INSERT INTO caseflow.contracts (user_id, company_contract_status, job_offer_status) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING {COLUMNS}, {INSERTED_FLAG}"
        );
        let row = sqlx::query_as::<_, UpsertRow<ContractRow>>(&query)
            .bind(contract.user_id)
            .bind(contract.company_contract_status.as_str())
            .bind(contract.job_offer_status.as_str())
            .fetch_one(self.pool)
            .await?;

        Ok(row.into_upserted())
    }

    /// Apply the set statuses of `update` to the user's contract record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no contract record.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        user_id: UserId,
        update: &ContractUpdate,
    ) -> Result<Contract, RepositoryError> {
        let query = format!(
            "UPDATE caseflow.contracts \
             SET company_contract_status = COALESCE($2, company_contract_status), \
                 job_offer_status = COALESCE($3, job_offer_status), \
                 updated_at = NOW() \
             WHERE user_id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContractRow>(&query)
            .bind(user_id)
            .bind(update.company_contract_status.map(|s| s.as_str()))
            .bind(update.job_offer_status.map(|s| s.as_str()))
            .fetch_optional(self.pool)
            .await?
            .map(Into::into)
            .ok_or(RepositoryError::NotFound)
    }
}
