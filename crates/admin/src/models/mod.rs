//! Domain models for case records and the audit log.
//!
//! Status fields are kept as the raw stored string. A value outside the
//! vocabulary is still a readable record; reconciliation is what repairs it.

pub mod audit_log;
pub mod contract;
pub mod docket;
pub mod user;
pub mod work_permit;
pub mod work_visa;

pub use audit_log::{AuditLogEntry, AuditLogPage, AuditLogQuery, NewAuditLogEntry};
pub use contract::{Contract, ContractDocument, ContractUpdate, NewContract};
pub use docket::{Docket, NewDocket, Reference};
pub use user::{NewUser, User};
pub use work_permit::{NewWorkPermit, WorkPermit, WorkPermitUpdate};
pub use work_visa::{NewWorkVisa, WorkVisa, WorkVisaUpdate};
