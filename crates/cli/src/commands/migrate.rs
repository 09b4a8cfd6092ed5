//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! caseflow migrate
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! `crates/admin/migrations/`, applied in filename order.

use caseflow_admin::config::AdminConfig;
use caseflow_admin::db;

use super::CommandError;

/// Apply pending migrations to the admin database.
///
/// # Errors
///
/// Returns an error if configuration is missing, the database cannot be
/// reached, or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let config = AdminConfig::from_env()?;

    tracing::info!("Connecting to admin database...");
    let pool = db::create_pool(&config.database_url).await?;

    tracing::info!("Running admin migrations...");
    sqlx::migrate!("../admin/migrations").run(&pool).await?;

    tracing::info!("Admin migrations complete!");
    Ok(())
}
