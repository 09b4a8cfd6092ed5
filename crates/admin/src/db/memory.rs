//! In-process implementation of [`RecordStore`].
//!
//! Used by tests and dry runs. Supports failure injection so callers can
//! exercise their degraded paths without a database.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use caseflow_core::{ContractId, DocketId, UserId, WorkPermitId, WorkVisaId};

use super::{RecordStore, RepositoryError, Upserted};
use crate::models::{
    AuditLogEntry, AuditLogQuery, Contract, ContractUpdate, Docket, NewAuditLogEntry,
    NewContract, NewDocket, NewUser, NewWorkPermit, NewWorkVisa, User, WorkPermit,
    WorkPermitUpdate, WorkVisa, WorkVisaUpdate,
};

#[derive(Default)]
struct State {
    next_id: i32,
    users: BTreeMap<UserId, User>,
    dockets: BTreeMap<UserId, Docket>,
    work_permits: BTreeMap<UserId, WorkPermit>,
    work_visas: BTreeMap<UserId, WorkVisa>,
    contracts: BTreeMap<UserId, Contract>,
    audit_logs: Vec<AuditLogEntry>,
    failing_users: BTreeSet<UserId>,
    stale_users: BTreeSet<UserId>,
}

impl State {
    const fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn check_user(&self, user_id: UserId) -> Result<(), RepositoryError> {
        if self.failing_users.contains(&user_id) {
            return Err(RepositoryError::Unavailable(format!(
                "injected failure for user {user_id}"
            )));
        }
        Ok(())
    }

    fn sub_record<T: Clone>(&self, user_id: UserId, table: &BTreeMap<UserId, T>) -> Option<T> {
        if self.stale_users.contains(&user_id) {
            return None;
        }
        table.get(&user_id).cloned()
    }
}

/// Record store held entirely in memory.
#[derive(Default)]
pub struct MemoryRecordStore {
    state: RwLock<State>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_audit_writes: AtomicBool,
}

impl MemoryRecordStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user directly, bypassing failure injection.
    pub async fn insert_user(&self, user: NewUser) -> User {
        let mut state = self.state.write().await;
        let id = UserId::new(state.next_id());
        let user = User {
            id,
            phone: user.phone,
            email: user.email,
            display_name: user.display_name,
            is_admin: user.is_admin,
            docket_completed: user.docket_completed,
            archived: false,
            archived_at: None,
            archived_reason: None,
            created_at: user.created_at,
        };
        state.users.insert(id, user.clone());
        user
    }

    /// Insert a default docket for `user_id` after letting `edit` adjust it.
    pub async fn seed_docket(&self, user_id: UserId, edit: impl FnOnce(&mut Docket)) -> Docket {
        let mut state = self.state.write().await;
        let mut docket = new_docket(&mut state, &NewDocket::defaults(user_id));
        edit(&mut docket);
        state.dockets.insert(user_id, docket.clone());
        docket
    }

    /// Insert a default work permit for `user_id` after letting `edit` adjust it.
    pub async fn seed_work_permit(
        &self,
        user_id: UserId,
        edit: impl FnOnce(&mut WorkPermit),
    ) -> WorkPermit {
        let mut state = self.state.write().await;
        let mut permit = new_work_permit(&mut state, &NewWorkPermit::defaults(user_id));
        edit(&mut permit);
        state.work_permits.insert(user_id, permit.clone());
        permit
    }

    /// Insert a default work visa for `user_id` after letting `edit` adjust it.
    pub async fn seed_work_visa(
        &self,
        user_id: UserId,
        edit: impl FnOnce(&mut WorkVisa),
    ) -> WorkVisa {
        let mut state = self.state.write().await;
        let mut visa = new_work_visa(&mut state, &NewWorkVisa::defaults(user_id));
        edit(&mut visa);
        state.work_visas.insert(user_id, visa.clone());
        visa
    }

    /// Insert a default contract record for `user_id` after letting `edit` adjust it.
    pub async fn seed_contract(
        &self,
        user_id: UserId,
        edit: impl FnOnce(&mut Contract),
    ) -> Contract {
        let mut state = self.state.write().await;
        let mut contract = new_contract(&mut state, &NewContract::defaults(user_id));
        edit(&mut contract);
        state.contracts.insert(user_id, contract.clone());
        contract
    }

    /// Every audit entry in insertion order.
    pub async fn audit_entries(&self) -> Vec<AuditLogEntry> {
        self.state.read().await.audit_logs.clone()
    }

    /// Make every read fail until reset.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every record write fail until reset. Audit writes are separate.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make audit log inserts fail until reset.
    pub fn fail_audit_writes(&self, fail: bool) {
        self.fail_audit_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every operation addressed to `user_id` fail.
    pub async fn fail_user(&self, user_id: UserId) {
        self.state.write().await.failing_users.insert(user_id);
    }

    /// Make sub-record lookups for `user_id` miss, like a read that raced a
    /// concurrent insert. Creates still see the stored rows.
    pub async fn serve_stale_reads(&self, user_id: UserId) {
        self.state.write().await.stale_users.insert(user_id);
    }

    fn check_reads(&self) -> Result<(), RepositoryError> {
        injected(&self.fail_reads, "reads")
    }

    fn check_writes(&self) -> Result<(), RepositoryError> {
        injected(&self.fail_writes, "writes")
    }

    async fn update_user(
        &self,
        id: UserId,
        apply: impl FnOnce(&mut User) -> Result<(), RepositoryError> + Send,
    ) -> Result<User, RepositoryError> {
        self.check_writes()?;
        let mut state = self.state.write().await;
        state.check_user(id)?;
        let user = state.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        apply(user)?;
        Ok(user.clone())
    }
}

fn injected(flag: &AtomicBool, what: &str) -> Result<(), RepositoryError> {
    if flag.load(Ordering::SeqCst) {
        return Err(RepositoryError::Unavailable(format!(
            "injected failure for {what}"
        )));
    }
    Ok(())
}

fn new_docket(state: &mut State, docket: &NewDocket) -> Docket {
    Docket {
        id: DocketId::new(state.next_id()),
        user_id: docket.user_id,
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
        references: docket.references.clone(),
        last_updated: Utc::now(),
    }
}

fn new_work_permit(state: &mut State, permit: &NewWorkPermit) -> WorkPermit {
    WorkPermit {
        id: WorkPermitId::new(state.next_id()),
        user_id: permit.user_id,
        status: permit.status.as_str().to_owned(),
        notes: None,
        final_docket_url: None,
        tracking_code: None,
        updated_at: Utc::now(),
    }
}

fn new_work_visa(state: &mut State, visa: &NewWorkVisa) -> WorkVisa {
    WorkVisa {
        id: WorkVisaId::new(state.next_id()),
        user_id: visa.user_id,
        status: visa.status.as_str().to_owned(),
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

fn new_contract(state: &mut State, contract: &NewContract) -> Contract {
    Contract {
        id: ContractId::new(state.next_id()),
        user_id: contract.user_id,
        company_contract_original_url: None,
        company_contract_signed_url: None,
        company_contract_status: contract.company_contract_status.as_str().to_owned(),
        job_offer_original_url: None,
        job_offer_signed_url: None,
        job_offer_status: contract.job_offer_status.as_str().to_owned(),
        company_contract_signature_valid: None,
        job_offer_signature_valid: None,
        updated_at: Utc::now(),
    }
}

/// Sub-record creation shared by the four `create_*` calls.
fn create_record<T: Clone>(
    state: &mut State,
    user_id: UserId,
    table: fn(&mut State) -> &mut BTreeMap<UserId, T>,
    build: impl FnOnce(&mut State) -> T,
) -> Result<Upserted<T>, RepositoryError> {
    state.check_user(user_id)?;
    if !state.users.contains_key(&user_id) {
        return Err(RepositoryError::Conflict(format!(
            "user {user_id} does not exist"
        )));
    }
    if let Some(existing) = table(state).get(&user_id) {
        return Ok(Upserted::existing(existing.clone()));
    }
    let record = build(state);
    table(state).insert(user_id, record.clone());
    Ok(Upserted::created(record))
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        self.check_reads()
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.check_reads()?;
        let state = self.state.read().await;
        state.check_user(id)?;
        Ok(state.users.get(&id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        self.check_reads()?;
        let state = self.state.read().await;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by_key(|u| (u.created_at, u.id));
        Ok(users)
    }

    async fn list_active_users(&self) -> Result<Vec<User>, RepositoryError> {
        let mut users = self.list_users().await?;
        users.retain(User::is_active);
        Ok(users)
    }

    async fn list_archived_users(&self) -> Result<Vec<User>, RepositoryError> {
        let mut users = self.list_users().await?;
        users.retain(|u| u.archived);
        users.sort_by(|a, b| b.archived_at.cmp(&a.archived_at).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn list_active_users_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<User>, RepositoryError> {
        let mut users = self.list_active_users().await?;
        users.retain(|u| u.created_at <= cutoff);
        Ok(users)
    }

    async fn archive_user(
        &self,
        id: UserId,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<User, RepositoryError> {
        let reason = reason.to_owned();
        self.update_user(id, move |user| {
            if user.archived {
                return Err(RepositoryError::Conflict(format!(
                    "user {} is already archived",
                    user.id
                )));
            }
            user.archived = true;
            user.archived_at = Some(at);
            user.archived_reason = Some(reason);
            Ok(())
        })
        .await
    }

    async fn unarchive_user(&self, id: UserId) -> Result<User, RepositoryError> {
        self.update_user(id, |user| {
            if !user.archived {
                return Err(RepositoryError::Conflict(format!(
                    "user {} is not archived",
                    user.id
                )));
            }
            user.archived = false;
            user.archived_at = None;
            user.archived_reason = None;
            Ok(())
        })
        .await
    }

    async fn set_docket_completed(
        &self,
        id: UserId,
        completed: bool,
    ) -> Result<(), RepositoryError> {
        self.update_user(id, |user| {
            user.docket_completed = completed;
            Ok(())
        })
        .await
        .map(|_| ())
    }

    async fn get_docket(&self, user_id: UserId) -> Result<Option<Docket>, RepositoryError> {
        self.check_reads()?;
        let state = self.state.read().await;
        state.check_user(user_id)?;
        Ok(state.sub_record(user_id, &state.dockets))
    }

    async fn create_docket(&self, docket: &NewDocket) -> Result<Upserted<Docket>, RepositoryError> {
        self.check_writes()?;
        let mut state = self.state.write().await;
        create_record(
            &mut state,
            docket.user_id,
            |s| &mut s.dockets,
            |s| new_docket(s, docket),
        )
    }

    async fn get_work_permit(
        &self,
        user_id: UserId,
    ) -> Result<Option<WorkPermit>, RepositoryError> {
        self.check_reads()?;
        let state = self.state.read().await;
        state.check_user(user_id)?;
        Ok(state.sub_record(user_id, &state.work_permits))
    }

    async fn create_work_permit(
        &self,
        permit: &NewWorkPermit,
    ) -> Result<Upserted<WorkPermit>, RepositoryError> {
        self.check_writes()?;
        let mut state = self.state.write().await;
        create_record(
            &mut state,
            permit.user_id,
            |s| &mut s.work_permits,
            |s| new_work_permit(s, permit),
        )
    }

    async fn update_work_permit(
        &self,
        user_id: UserId,
        update: &WorkPermitUpdate,
    ) -> Result<WorkPermit, RepositoryError> {
        self.check_writes()?;
        let mut state = self.state.write().await;
        state.check_user(user_id)?;
        let permit = state
            .work_permits
            .get_mut(&user_id)
            .ok_or(RepositoryError::NotFound)?;
        if let Some(status) = update.status {
            permit.status = status.as_str().to_owned();
        }
        if let Some(notes) = &update.notes {
            permit.notes = Some(notes.clone());
        }
        permit.updated_at = Utc::now();
        Ok(permit.clone())
    }

    async fn get_work_visa(&self, user_id: UserId) -> Result<Option<WorkVisa>, RepositoryError> {
        self.check_reads()?;
        let state = self.state.read().await;
        state.check_user(user_id)?;
        Ok(state.sub_record(user_id, &state.work_visas))
    }

    async fn create_work_visa(&self, visa: &NewWorkVisa) -> Result<Upserted<WorkVisa>, RepositoryError> {
        self.check_writes()?;
        let mut state = self.state.write().await;
        create_record(
            &mut state,
            visa.user_id,
            |s| &mut s.work_visas,
            |s| new_work_visa(s, visa),
        )
    }

    async fn update_work_visa(
        &self,
        user_id: UserId,
        update: &WorkVisaUpdate,
    ) -> Result<WorkVisa, RepositoryError> {
        self.check_writes()?;
        let mut state = self.state.write().await;
        state.check_user(user_id)?;
        let visa = state
            .work_visas
            .get_mut(&user_id)
            .ok_or(RepositoryError::NotFound)?;
        if let Some(status) = update.status {
            visa.status = status.as_str().to_owned();
        }
        if update.interview_date.is_some() {
            visa.interview_date = update.interview_date;
        }
        if update.interview_time.is_some() {
            visa.interview_time = update.interview_time;
        }
        if let Some(notes) = &update.notes {
            visa.notes = Some(notes.clone());
        }
        visa.updated_at = Utc::now();
        Ok(visa.clone())
    }

    async fn get_contract(&self, user_id: UserId) -> Result<Option<Contract>, RepositoryError> {
        self.check_reads()?;
        let state = self.state.read().await;
        state.check_user(user_id)?;
        Ok(state.sub_record(user_id, &state.contracts))
    }

    async fn create_contract(&self, contract: &NewContract) -> Result<Upserted<Contract>, RepositoryError> {
        self.check_writes()?;
        let mut state = self.state.write().await;
        create_record(
            &mut state,
            contract.user_id,
            |s| &mut s.contracts,
            |s| new_contract(s, contract),
        )
    }

    async fn update_contract(
        &self,
        user_id: UserId,
        update: &ContractUpdate,
    ) -> Result<Contract, RepositoryError> {
        self.check_writes()?;
        let mut state = self.state.write().await;
        state.check_user(user_id)?;
        let contract = state
            .contracts
            .get_mut(&user_id)
            .ok_or(RepositoryError::NotFound)?;
        if let Some(status) = update.company_contract_status {
            contract.company_contract_status = status.as_str().to_owned();
        }
        if let Some(status) = update.job_offer_status {
            contract.job_offer_status = status.as_str().to_owned();
        }
        contract.updated_at = Utc::now();
        Ok(contract.clone())
    }

    async fn insert_audit_log(
        &self,
        entry: &NewAuditLogEntry,
    ) -> Result<AuditLogEntry, RepositoryError> {
        injected(&self.fail_audit_writes, "audit writes")?;
        let entry = AuditLogEntry {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            admin_email: entry.admin_email.clone(),
            action: entry.action,
            entity_type: entry.entity_type,
            entity_id: entry.entity_id.clone(),
            old_values: entry.old_values.clone(),
            new_values: entry.new_values.clone(),
            metadata: entry.metadata.clone(),
            ip_address: entry.ip_address.clone(),
            user_agent: entry.user_agent.clone(),
            session_id: entry.session_id.clone(),
            severity: entry.severity,
            description: entry.description.clone(),
            timestamp: entry.timestamp,
        };
        self.state.write().await.audit_logs.push(entry.clone());
        Ok(entry)
    }

    async fn query_audit_logs(
        &self,
        query: &AuditLogQuery,
    ) -> Result<(Vec<AuditLogEntry>, u64), RepositoryError> {
        self.check_reads()?;
        let query = query.normalized();
        let state = self.state.read().await;
        let mut matching: Vec<&AuditLogEntry> = state
            .audit_logs
            .iter()
            .rev()
            .filter(|entry| query.matches(entry))
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(query.limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn list_audit_logs_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        self.check_reads()?;
        let state = self.state.read().await;
        let mut entries: Vec<AuditLogEntry> = state
            .audit_logs
            .iter()
            .filter(|entry| entry.timestamp >= cutoff)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| entry.timestamp);
        Ok(entries)
    }
}
