//! Command implementations.
//!
//! Every command except `signature check` connects to the admin database
//! using the same configuration as the `caseflow-admin` binary.

pub mod archive;
pub mod audit;
pub mod migrate;
pub mod signature;
pub mod sync;

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use caseflow_admin::config::{AdminConfig, ConfigError};
use caseflow_admin::db::{self, PgRecordStore, RecordStore, RepositoryError, TimedStore};
use caseflow_admin::services::{ArchiveError, SignatureError};
use caseflow_admin::state::AppState;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Store(#[from] RepositoryError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("Signature check failed: {0}")]
    Signature(#[from] SignatureError),

    #[error("Could not read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Could not encode output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Connect to the admin database and wire the services.
async fn connect() -> Result<AppState, CommandError> {
    let config = AdminConfig::from_env()?;

    tracing::info!("Connecting to admin database...");
    let pool = db::create_pool(&config.database_url).await?;
    let store: Arc<dyn RecordStore> = Arc::new(TimedStore::new(
        Arc::new(PgRecordStore::new(pool)),
        config.store_timeout,
    ));
    Ok(AppState::new(config, store))
}

/// Print a value as pretty JSON on stdout.
fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
    let json = serde_json::to_string_pretty(value)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }
    Ok(())
}
