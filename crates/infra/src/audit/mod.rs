//! Audit trail persistence and the fire-and-forget recorder.

pub mod in_memory;
pub mod postgres;
pub mod recorder;

pub use in_memory::InMemoryAuditStore;
pub use postgres::PostgresAuditStore;
pub use recorder::{AuditMetrics, AuditMetricsSnapshot, AuditRecorder};
