//! Business logic services.
//!
//! # Services
//!
//! - `audit` - Append-only audit log writer, query and statistics
//! - `signature` - Heuristic check for signatures in uploaded PDFs
//! - `sync` - Reconciliation sweep over per-user case records
//! - `archive` - Age-based archival of user accounts

pub mod archive;
pub mod audit;
pub mod signature;
pub mod sync;

pub use archive::{ArchiveError, ArchivePolicy, ArchiveRun, ArchiveService, ArchiveStats};
pub use audit::{AuditContext, AuditOptions, AuditService, AuditStats};
pub use signature::{SignatureError, SignatureValidation, validate_pdf_signature};
pub use sync::{Inconsistency, SweepTrigger, SyncOptions, SyncReport, SyncService};
