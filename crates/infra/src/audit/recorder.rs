//! Audit Recorder.
//!
//! `record` hands the entry to a bounded channel and returns immediately; a
//! single background task drains the channel into the `AuditStore`. Storage
//! failures are counted and logged under the `audit` target, never returned.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use warden_auth::{AuditEntry, AuditStore};

/// Operational counters for the audit path.
#[derive(Debug, Default)]
pub struct AuditMetrics {
    recorded: AtomicU64,
    persisted: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuditMetricsSnapshot {
    /// Entries accepted onto the queue.
    pub recorded: u64,
    pub persisted: u64,
    /// Entries the store refused.
    pub failed: u64,
    /// Entries never queued (queue full or worker gone).
    pub dropped: u64,
}

impl AuditMetricsSnapshot {
    /// Every queued entry has been either persisted or failed.
    pub fn is_drained(&self) -> bool {
        self.persisted + self.failed == self.recorded
    }
}

impl AuditMetrics {
    pub fn snapshot(&self) -> AuditMetricsSnapshot {
        AuditMetricsSnapshot {
            recorded: self.recorded.load(Ordering::Relaxed),
            persisted: self.persisted.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Clone)]
pub struct AuditRecorder {
    tx: mpsc::Sender<AuditEntry>,
    metrics: Arc<AuditMetrics>,
}

impl AuditRecorder {
    /// Start the background writer on the current tokio runtime.
    pub fn spawn(store: Arc<dyn AuditStore>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let metrics = Arc::new(AuditMetrics::default());
        let handle = tokio::spawn(run_worker(store, rx, metrics.clone()));
        (Self { tx, metrics }, handle)
    }

    /// Fire-and-forget: never blocks, never fails the caller.
    pub fn record(&self, entry: AuditEntry) {
        match self.tx.try_send(entry) {
            Ok(()) => {
                self.metrics.recorded.fetch_add(1, Ordering::Relaxed);
            }
            Err(mpsc::error::TrySendError::Full(entry)) => {
                self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(target: "audit", action = %entry.action, "audit queue full; entry dropped");
            }
            Err(mpsc::error::TrySendError::Closed(entry)) => {
                self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(target: "audit", action = %entry.action, "audit worker stopped; entry dropped");
            }
        }
    }

    pub fn metrics(&self) -> AuditMetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl std::fmt::Debug for AuditRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditRecorder")
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}

async fn run_worker(
    store: Arc<dyn AuditStore>,
    mut rx: mpsc::Receiver<AuditEntry>,
    metrics: Arc<AuditMetrics>,
) {
    while let Some(entry) = rx.recv().await {
        let action = entry.action.clone();
        let entry_id = entry.id;
        match store.append(entry).await {
            Ok(()) => {
                metrics.persisted.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                metrics.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(target: "audit", error = %e, %action, entry_id = %entry_id, "audit write failed");
            }
        }
    }
    tracing::debug!(target: "audit", "audit worker exiting");
}
