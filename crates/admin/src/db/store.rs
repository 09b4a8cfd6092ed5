//! `PostgreSQL` implementation of [`RecordStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use caseflow_core::UserId;

use super::audit_logs::AuditLogRepository;
use super::contracts::ContractRepository;
use super::dockets::DocketRepository;
use super::users::UserRepository;
use super::work_permits::WorkPermitRepository;
use super::work_visas::WorkVisaRepository;
use super::{RecordStore, RepositoryError, Upserted};
use crate::models::{
    AuditLogEntry, AuditLogQuery, Contract, ContractUpdate, Docket, NewAuditLogEntry,
    NewContract, NewDocket, NewWorkPermit, NewWorkVisa, User, WorkPermit, WorkPermitUpdate,
    WorkVisa, WorkVisaUpdate,
};

/// Record store backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        UserRepository::new(&self.pool).get_by_id(id).await
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        UserRepository::new(&self.pool).list_all().await
    }

    async fn list_active_users(&self) -> Result<Vec<User>, RepositoryError> {
        UserRepository::new(&self.pool).list_active().await
    }

    async fn list_archived_users(&self) -> Result<Vec<User>, RepositoryError> {
        UserRepository::new(&self.pool).list_archived().await
    }

    async fn list_active_users_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<User>, RepositoryError> {
        UserRepository::new(&self.pool)
            .list_active_created_before(cutoff)
            .await
    }

    async fn archive_user(
        &self,
        id: UserId,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<User, RepositoryError> {
        UserRepository::new(&self.pool).archive(id, reason, at).await
    }

    async fn unarchive_user(&self, id: UserId) -> Result<User, RepositoryError> {
        UserRepository::new(&self.pool).unarchive(id).await
    }

    async fn set_docket_completed(
        &self,
        id: UserId,
        completed: bool,
    ) -> Result<(), RepositoryError> {
        UserRepository::new(&self.pool)
            .set_docket_completed(id, completed)
            .await
    }

    async fn get_docket(&self, user_id: UserId) -> Result<Option<Docket>, RepositoryError> {
        DocketRepository::new(&self.pool).get_by_user(user_id).await
    }

    async fn create_docket(
        &self,
        docket: &NewDocket,
    ) -> Result<Upserted<Docket>, RepositoryError> {
        DocketRepository::new(&self.pool).create(docket).await
    }

    async fn get_work_permit(
        &self,
        user_id: UserId,
    ) -> Result<Option<WorkPermit>, RepositoryError> {
        WorkPermitRepository::new(&self.pool)
            .get_by_user(user_id)
            .await
    }

    async fn create_work_permit(
        &self,
        permit: &NewWorkPermit,
    ) -> Result<Upserted<WorkPermit>, RepositoryError> {
        WorkPermitRepository::new(&self.pool).create(permit).await
    }

    async fn update_work_permit(
        &self,
        user_id: UserId,
        update: &WorkPermitUpdate,
    ) -> Result<WorkPermit, RepositoryError> {
        WorkPermitRepository::new(&self.pool)
            .update(user_id, update)
            .await
    }

    async fn get_work_visa(&self, user_id: UserId) -> Result<Option<WorkVisa>, RepositoryError> {
        WorkVisaRepository::new(&self.pool).get_by_user(user_id).await
    }

    async fn create_work_visa(
        &self,
        visa: &NewWorkVisa,
    ) -> Result<Upserted<WorkVisa>, RepositoryError> {
        WorkVisaRepository::new(&self.pool).create(visa).await
    }

    async fn update_work_visa(
        &self,
        user_id: UserId,
        update: &WorkVisaUpdate,
    ) -> Result<WorkVisa, RepositoryError> {
        WorkVisaRepository::new(&self.pool)
            .update(user_id, update)
            .await
    }

    async fn get_contract(&self, user_id: UserId) -> Result<Option<Contract>, RepositoryError> {
        ContractRepository::new(&self.pool).get_by_user(user_id).await
    }

    async fn create_contract(
        &self,
        contract: &NewContract,
    ) -> Result<Upserted<Contract>, RepositoryError> {
        ContractRepository::new(&self.pool).create(contract).await
    }

    async fn update_contract(
        &self,
        user_id: UserId,
        update: &ContractUpdate,
    ) -> Result<Contract, RepositoryError> {
        ContractRepository::new(&self.pool)
            .update(user_id, update)
            .await
    }

    async fn insert_audit_log(
        &self,
        entry: &NewAuditLogEntry,
    ) -> Result<AuditLogEntry, RepositoryError> {
        AuditLogRepository::new(&self.pool).insert(entry).await
    }

    async fn query_audit_logs(
        &self,
        query: &AuditLogQuery,
    ) -> Result<(Vec<AuditLogEntry>, u64), RepositoryError> {
        AuditLogRepository::new(&self.pool).query(query).await
    }

    async fn list_audit_logs_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        AuditLogRepository::new(&self.pool).list_since(cutoff).await
    }
}
