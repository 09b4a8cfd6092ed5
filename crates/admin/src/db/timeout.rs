//! Per-call deadline for any [`RecordStore`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use caseflow_core::UserId;

use super::{RecordStore, RepositoryError, Upserted};
use crate::models::{
    AuditLogEntry, AuditLogQuery, Contract, ContractUpdate, Docket, NewAuditLogEntry,
    NewContract, NewDocket, NewWorkPermit, NewWorkVisa, User, WorkPermit, WorkPermitUpdate,
    WorkVisa, WorkVisaUpdate,
};

/// Wraps a store so that no call can hang a background job.
///
/// A call that exceeds the limit is abandoned and reported as
/// [`RepositoryError::Timeout`].
#[derive(Clone)]
pub struct TimedStore {
    inner: Arc<dyn RecordStore>,
    limit: Duration,
}

impl TimedStore {
    #[must_use]
    pub fn new(inner: Arc<dyn RecordStore>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, RepositoryError>> + Send,
    ) -> Result<T, RepositoryError> {
        match tokio::time::timeout(self.limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(operation, limit = ?self.limit, "record store call timed out");
                Err(RepositoryError::Timeout {
                    operation,
                    after: self.limit,
                })
            }
        }
    }
}

#[async_trait]
impl RecordStore for TimedStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        self.bounded("ping", self.inner.ping()).await
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.bounded("get_user", self.inner.get_user(id)).await
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        self.bounded("list_users", self.inner.list_users()).await
    }

    async fn list_active_users(&self) -> Result<Vec<User>, RepositoryError> {
        self.bounded("list_active_users", self.inner.list_active_users())
            .await
    }

    async fn list_archived_users(&self) -> Result<Vec<User>, RepositoryError> {
        self.bounded("list_archived_users", self.inner.list_archived_users())
            .await
    }

    async fn list_active_users_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<User>, RepositoryError> {
        self.bounded(
            "list_active_users_created_before",
            self.inner.list_active_users_created_before(cutoff),
        )
        .await
    }

    async fn archive_user(
        &self,
        id: UserId,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<User, RepositoryError> {
        self.bounded("archive_user", self.inner.archive_user(id, reason, at))
            .await
    }

    async fn unarchive_user(&self, id: UserId) -> Result<User, RepositoryError> {
        self.bounded("unarchive_user", self.inner.unarchive_user(id))
            .await
    }

    async fn set_docket_completed(
        &self,
        id: UserId,
        completed: bool,
    ) -> Result<(), RepositoryError> {
        self.bounded(
            "set_docket_completed",
            self.inner.set_docket_completed(id, completed),
        )
        .await
    }

    async fn get_docket(&self, user_id: UserId) -> Result<Option<Docket>, RepositoryError> {
        self.bounded("get_docket", self.inner.get_docket(user_id))
            .await
    }

    async fn create_docket(
        &self,
        docket: &NewDocket,
    ) -> Result<Upserted<Docket>, RepositoryError> {
        self.bounded("create_docket", self.inner.create_docket(docket))
            .await
    }

    async fn get_work_permit(
        &self,
        user_id: UserId,
    ) -> Result<Option<WorkPermit>, RepositoryError> {
        self.bounded("get_work_permit", self.inner.get_work_permit(user_id))
            .await
    }

    async fn create_work_permit(
        &self,
        permit: &NewWorkPermit,
    ) -> Result<Upserted<WorkPermit>, RepositoryError> {
        self.bounded("create_work_permit", self.inner.create_work_permit(permit))
            .await
    }

    async fn update_work_permit(
        &self,
        user_id: UserId,
        update: &WorkPermitUpdate,
    ) -> Result<WorkPermit, RepositoryError> {
        self.bounded(
            "update_work_permit",
            self.inner.update_work_permit(user_id, update),
        )
        .await
    }

    async fn get_work_visa(&self, user_id: UserId) -> Result<Option<WorkVisa>, RepositoryError> {
        self.bounded("get_work_visa", self.inner.get_work_visa(user_id))
            .await
    }

    async fn create_work_visa(
        &self,
        visa: &NewWorkVisa,
    ) -> Result<Upserted<WorkVisa>, RepositoryError> {
        self.bounded("create_work_visa", self.inner.create_work_visa(visa))
            .await
    }

    async fn update_work_visa(
        &self,
        user_id: UserId,
        update: &WorkVisaUpdate,
    ) -> Result<WorkVisa, RepositoryError> {
        self.bounded(
            "update_work_visa",
            self.inner.update_work_visa(user_id, update),
        )
        .await
    }

    async fn get_contract(&self, user_id: UserId) -> Result<Option<Contract>, RepositoryError> {
        self.bounded("get_contract", self.inner.get_contract(user_id))
            .await
    }

    async fn create_contract(
        &self,
        contract: &NewContract,
    ) -> Result<Upserted<Contract>, RepositoryError> {
        self.bounded("create_contract", self.inner.create_contract(contract))
            .await
    }

    async fn update_contract(
        &self,
        user_id: UserId,
        update: &ContractUpdate,
    ) -> Result<Contract, RepositoryError> {
        self.bounded("update_contract", self.inner.update_contract(user_id, update))
            .await
    }

    async fn insert_audit_log(
        &self,
        entry: &NewAuditLogEntry,
    ) -> Result<AuditLogEntry, RepositoryError> {
        self.bounded("insert_audit_log", self.inner.insert_audit_log(entry))
            .await
    }

    async fn query_audit_logs(
        &self,
        query: &AuditLogQuery,
    ) -> Result<(Vec<AuditLogEntry>, u64), RepositoryError> {
        self.bounded("query_audit_logs", self.inner.query_audit_logs(query))
            .await
    }

    async fn list_audit_logs_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        self.bounded(
            "list_audit_logs_since",
            self.inner.list_audit_logs_since(cutoff),
        )
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryRecordStore;

    /// Store whose user listing never completes.
    struct Stalled;

    #[async_trait]
    impl RecordStore for Stalled {
        async fn ping(&self) -> Result<(), RepositoryError> {
            std::future::pending().await
        }
        async fn get_user(&self, _: UserId) -> Result<Option<User>, RepositoryError> {
            Ok(None)
        }
        async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
            std::future::pending().await
        }
        async fn list_active_users(&self) -> Result<Vec<User>, RepositoryError> {
            std::future::pending().await
        }
        async fn list_archived_users(&self) -> Result<Vec<User>, RepositoryError> {
            Ok(Vec::new())
        }
        async fn list_active_users_created_before(
            &self,
            _: DateTime<Utc>,
        ) -> Result<Vec<User>, RepositoryError> {
            Ok(Vec::new())
        }
        async fn archive_user(
            &self,
            _: UserId,
            _: &str,
            _: DateTime<Utc>,
        ) -> Result<User, RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn unarchive_user(&self, _: UserId) -> Result<User, RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn set_docket_completed(&self, _: UserId, _: bool) -> Result<(), RepositoryError> {
            Ok(())
        }
        async fn get_docket(&self, _: UserId) -> Result<Option<Docket>, RepositoryError> {
            Ok(None)
        }
        async fn create_docket(
            &self,
            _: &NewDocket,
        ) -> Result<Upserted<Docket>, RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn get_work_permit(&self, _: UserId) -> Result<Option<WorkPermit>, RepositoryError> {
            Ok(None)
        }
        async fn create_work_permit(
            &self,
            _: &NewWorkPermit,
        ) -> Result<Upserted<WorkPermit>, RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn update_work_permit(
            &self,
            _: UserId,
            _: &WorkPermitUpdate,
        ) -> Result<WorkPermit, RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn get_work_visa(&self, _: UserId) -> Result<Option<WorkVisa>, RepositoryError> {
            Ok(None)
        }
        async fn create_work_visa(
            &self,
            _: &NewWorkVisa,
        ) -> Result<Upserted<WorkVisa>, RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn update_work_visa(
            &self,
            _: UserId,
            _: &WorkVisaUpdate,
        ) -> Result<WorkVisa, RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn get_contract(&self, _: UserId) -> Result<Option<Contract>, RepositoryError> {
            Ok(None)
        }
        async fn create_contract(
            &self,
            _: &NewContract,
        ) -> Result<Upserted<Contract>, RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn update_contract(
            &self,
            _: UserId,
            _: &ContractUpdate,
        ) -> Result<Contract, RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn insert_audit_log(
            &self,
            _: &NewAuditLogEntry,
        ) -> Result<AuditLogEntry, RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn query_audit_logs(
            &self,
            _: &AuditLogQuery,
        ) -> Result<(Vec<AuditLogEntry>, u64), RepositoryError> {
            Ok((Vec::new(), 0))
        }
        async fn list_audit_logs_since(
            &self,
            _: DateTime<Utc>,
        ) -> Result<Vec<AuditLogEntry>, RepositoryError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_call_times_out() {
        let store = TimedStore::new(Arc::new(Stalled), Duration::from_secs(30));
        let err = store.list_users().await.unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::Timeout {
                operation: "list_users",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let store = TimedStore::new(Arc::new(MemoryRecordStore::new()), Duration::from_secs(30));
        assert!(store.list_users().await.unwrap().is_empty());
    }
}
