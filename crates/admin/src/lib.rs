//! Caseflow admin library.
//!
//! Background services for the immigration case-management backend:
//! the audit log, the PDF signature heuristic, the reconciliation sweep
//! and the archival scheduler, over a pluggable record store.
//!
//! The `caseflow-admin` binary wires these into periodic jobs and serves a
//! liveness/readiness endpoint. The `caseflow` CLI drives the same services
//! on demand.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod background;
pub mod config;
pub mod db;
pub mod error;
pub mod health;
pub mod models;
pub mod services;
pub mod state;
