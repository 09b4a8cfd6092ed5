//! Caseflow CLI - migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! caseflow migrate
//!
//! # Run a reconciliation sweep now
//! caseflow sync
//!
//! # Archive aged accounts now, or one account by hand
//! caseflow archive run
//! caseflow archive user 42 --reason "left the program"
//! caseflow archive restore 42
//! caseflow archive stats
//!
//! # Audit reporting
//! caseflow audit stats --days 7
//! caseflow audit logs --action LOGIN_FAILED --limit 20
//!
//! # Check an uploaded PDF for signs of a signature
//! caseflow signature check contract.pdf
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `sync` - Reconciliation sweep
//! - `archive` - Archival operations and statistics
//! - `audit` - Audit statistics and log listing
//! - `signature` - PDF signature heuristic

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use caseflow_core::{AuditAction, EntityType, Severity, UserId};

mod commands;

#[derive(Parser)]
#[command(name = "caseflow")]
#[command(author, version, about = "Caseflow CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Run a reconciliation sweep and print the report
    Sync,
    /// Archive or restore user accounts
    Archive {
        #[command(subcommand)]
        action: ArchiveAction,
    },
    /// Audit log reports
    Audit {
        #[command(subcommand)]
        action: AuditCommand,
    },
    /// PDF signature heuristic
    Signature {
        #[command(subcommand)]
        action: SignatureAction,
    },
}

#[derive(Subcommand)]
enum ArchiveAction {
    /// Archive every user past the configured age
    Run,
    /// Archive one user
    User {
        /// User ID
        id: UserId,

        /// Reason stored with the archive (default: `manual_archive`)
        #[arg(short, long)]
        reason: Option<String>,

        /// Administrator performing the change
        #[arg(short, long)]
        admin: Option<String>,
    },
    /// Return an archived user to the active set
    Restore {
        /// User ID
        id: UserId,

        /// Administrator performing the change
        #[arg(short, long)]
        admin: Option<String>,
    },
    /// Print user and eligibility counts
    Stats,
}

#[derive(Subcommand)]
enum AuditCommand {
    /// Print aggregate statistics for a trailing window
    Stats {
        /// Window length in days
        #[arg(short, long, default_value_t = 30)]
        days: u32,
    },
    /// Print one page of audit log entries, newest first
    Logs {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 50)]
        limit: u32,

        /// Only entries about this user
        #[arg(long)]
        user: Option<UserId>,

        /// Wire name, e.g. `LOGIN_FAILED`
        #[arg(long)]
        action: Option<AuditAction>,

        /// Wire name, e.g. `work_visa`
        #[arg(long)]
        entity_type: Option<EntityType>,

        #[arg(long)]
        severity: Option<Severity>,

        /// Case-insensitive text search
        #[arg(short, long)]
        search: Option<String>,
    },
}

#[derive(Subcommand)]
enum SignatureAction {
    /// Score a PDF file
    Check {
        /// Path to the PDF
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Load .env first so RUST_LOG from it reaches the subscriber
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Sync => commands::sync::run().await?,
        Commands::Archive { action } => match action {
            ArchiveAction::Run => commands::archive::run().await?,
            ArchiveAction::User { id, reason, admin } => {
                commands::archive::archive_user(id, reason.as_deref(), admin.as_deref()).await?;
            }
            ArchiveAction::Restore { id, admin } => {
                commands::archive::restore_user(id, admin.as_deref()).await?;
            }
            ArchiveAction::Stats => commands::archive::stats().await?,
        },
        Commands::Audit { action } => match action {
            AuditCommand::Stats { days } => commands::audit::stats(days).await?,
            AuditCommand::Logs {
                page,
                limit,
                user,
                action,
                entity_type,
                severity,
                search,
            } => {
                let query = commands::audit::LogFilter {
                    page,
                    limit,
                    user_id: user,
                    action,
                    entity_type,
                    severity,
                    search,
                };
                commands::audit::logs(query).await?;
            }
        },
        Commands::Signature { action } => match action {
            SignatureAction::Check { path } => commands::signature::check(&path)?,
        },
    }
    Ok(())
}
