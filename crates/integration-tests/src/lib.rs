//! Integration tests for Caseflow.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p caseflow-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `reconciliation` - Sweep repairs, flags and idempotence
//! - `archival` - Automatic and manual archival
//! - `audit_log` - Audit writes, queries and statistics
//! - `signature` - PDF signature heuristic against generated PDFs
//!
//! Every test runs against [`MemoryRecordStore`]; no database is needed.

#![allow(clippy::unwrap_used)]

pub mod pdf;

use std::sync::Arc;

use chrono::{Duration, Utc};

use caseflow_admin::config::AdminConfig;
use caseflow_admin::db::{MemoryRecordStore, RecordStore};
use caseflow_admin::models::{NewUser, User};
use caseflow_admin::state::AppState;

/// Services wired over an in-memory store.
pub struct TestContext {
    pub memory: Arc<MemoryRecordStore>,
    pub state: AppState,
}

impl TestContext {
    /// Context with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_env(&[])
    }

    /// Context with configuration overrides, given as environment pairs.
    #[must_use]
    pub fn with_env(vars: &[(&str, &str)]) -> Self {
        let memory = Arc::new(MemoryRecordStore::new());
        let store: Arc<dyn RecordStore> = memory.clone();
        Self {
            state: AppState::new(config(vars), store),
            memory,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        self.state.store()
    }

    /// Insert a candidate created `age` ago.
    pub async fn user(&self, email: &str, age: Duration) -> User {
        self.memory
            .insert_user(NewUser::candidate(email, Utc::now() - age))
            .await
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration with a placeholder database URL plus `vars`.
#[must_use]
pub fn config(vars: &[(&str, &str)]) -> AdminConfig {
    AdminConfig::from_lookup(|key| {
        vars.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| (*v).to_string())
            .or_else(|| (key == "DATABASE_URL").then(|| "postgres://localhost/test".to_string()))
    })
    .unwrap()
}
