//! Infrastructure layer: storage adapters, the audit worker, outbound mail.

pub mod audit;
pub mod mail;
pub mod users;

pub(crate) mod pg;
