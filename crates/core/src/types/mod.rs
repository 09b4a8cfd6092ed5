//! Core types for Caseflow.
//!
//! Status and audit vocabularies are persisted as plain strings, so every
//! enum here round-trips through the exact wire string stored in the database.

#[macro_use]
mod vocabulary;

pub mod audit;
pub mod id;
pub mod status;

pub use audit::{AuditAction, EntityType, Severity};
pub use id::*;
pub use status::*;
pub use vocabulary::UnknownVariant;
