//! Caseflow Core - Shared types library.
//!
//! This crate provides the vocabulary shared by every Caseflow component:
//! - `admin` - Background consistency, archival, audit and signature services
//! - `cli` - Operator commands for migrations and manual runs
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, case status vocabularies and the audit vocabulary

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
