//! `warden-core` — shared domain primitives (identifiers and errors).
//!
//! No infrastructure or transport concerns live here.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{AuditEntryId, UserId};
