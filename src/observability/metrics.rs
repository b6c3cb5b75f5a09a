//! Metrics registry for sort resolution and execution
//!
//! - Counters only
//! - Monotonic increase
//! - Thread-safe but lock-minimal

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Metrics registry containing all sort counters
///
/// All counters use atomic operations with Relaxed ordering; a registry may
/// be shared across concurrently executing queries.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// ORDER BY clauses resolved to an ordering
    orderings_resolved: AtomicU64,
    /// ORDER BY clauses rejected during resolution
    resolutions_rejected: AtomicU64,
    /// Rows pulled from upstream into a strategy
    rows_ingested: AtomicU64,
    /// Rows dropped by the bounded top-k strategy
    rows_discarded: AtomicU64,
    /// Sorts that finalized successfully
    sorts_completed: AtomicU64,
    /// Sorts aborted by an error
    sorts_failed: AtomicU64,
    /// Sorts aborted by cancellation
    sorts_cancelled: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Resolution metrics

    pub fn increment_orderings_resolved(&self) {
        self.orderings_resolved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_resolutions_rejected(&self) {
        self.resolutions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    // Execution metrics

    pub fn add_rows_ingested(&self, rows: u64) {
        self.rows_ingested.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn add_rows_discarded(&self, rows: u64) {
        self.rows_discarded.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn increment_sorts_completed(&self) {
        self.sorts_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_sorts_failed(&self) {
        self.sorts_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_sorts_cancelled(&self) {
        self.sorts_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            orderings_resolved: self.orderings_resolved.load(Ordering::Relaxed),
            resolutions_rejected: self.resolutions_rejected.load(Ordering::Relaxed),
            rows_ingested: self.rows_ingested.load(Ordering::Relaxed),
            rows_discarded: self.rows_discarded.load(Ordering::Relaxed),
            sorts_completed: self.sorts_completed.load(Ordering::Relaxed),
            sorts_failed: self.sorts_failed.load(Ordering::Relaxed),
            sorts_cancelled: self.sorts_cancelled.load(Ordering::Relaxed),
        }
    }

    /// Get current snapshot of all metrics as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub orderings_resolved: u64,
    pub resolutions_rejected: u64,
    pub rows_ingested: u64,
    pub rows_discarded: u64,
    pub sorts_completed: u64,
    pub sorts_failed: u64,
    pub sorts_cancelled: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        let snapshot = MetricsRegistry::new().snapshot();
        assert_eq!(snapshot.rows_ingested, 0);
        assert_eq!(snapshot.sorts_completed, 0);
        assert_eq!(snapshot.orderings_resolved, 0);
    }

    #[test]
    fn test_increment_counters() {
        let registry = MetricsRegistry::new();

        registry.increment_orderings_resolved();
        registry.increment_resolutions_rejected();
        registry.add_rows_ingested(10);
        registry.add_rows_ingested(5);
        registry.add_rows_discarded(3);
        registry.increment_sorts_completed();
        registry.increment_sorts_failed();
        registry.increment_sorts_cancelled();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.orderings_resolved, 1);
        assert_eq!(snapshot.resolutions_rejected, 1);
        assert_eq!(snapshot.rows_ingested, 15);
        assert_eq!(snapshot.rows_discarded, 3);
        assert_eq!(snapshot.sorts_completed, 1);
        assert_eq!(snapshot.sorts_failed, 1);
        assert_eq!(snapshot.sorts_cancelled, 1);
    }

    #[test]
    fn test_to_json() {
        let registry = MetricsRegistry::new();
        registry.add_rows_ingested(1234);

        let parsed: serde_json::Value = serde_json::from_str(&registry.to_json()).unwrap();
        assert_eq!(parsed["rows_ingested"], 1234);
        assert_eq!(parsed["sorts_failed"], 0);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(MetricsRegistry::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let reg = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    reg.add_rows_ingested(1);
                    reg.increment_sorts_completed();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.rows_ingested, 1000);
        assert_eq!(snapshot.sorts_completed, 1000);
    }
}
