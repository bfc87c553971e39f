use std::sync::atomic::{AtomicU64, Ordering};

use metrics::{counter, gauge};

const METRIC_SIZE: &str = "state_table.size";
const METRIC_CREATED: &str = "state_table.created_total";
const METRIC_REAPED: &str = "state_table.reaped_total";
const METRIC_REJECTED: &str = "state_table.rejected_total";

/// Internal counters, mirrored out to the global `metrics` recorder at each
/// mutation point (c.f. `QueryStatusCache`'s gauge updates) and kept locally
/// too, since the `metrics` crate has no read-back API and tests need one.
#[derive(Debug, Default)]
pub(crate) struct TableMetrics {
    created_total: AtomicU64,
    reaped_total: AtomicU64,
    rejected_total: AtomicU64,
}

impl TableMetrics {
    pub(crate) fn record_created(&self) {
        self.created_total.fetch_add(1, Ordering::Relaxed);
        counter!(METRIC_CREATED).increment(1);
    }

    pub(crate) fn record_reaped(&self, n: u64) {
        if n == 0 {
            return;
        }
        self.reaped_total.fetch_add(n, Ordering::Relaxed);
        counter!(METRIC_REAPED).increment(n);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected_total.fetch_add(1, Ordering::Relaxed);
        counter!(METRIC_REJECTED).increment(1);
    }

    pub(crate) fn record_size(&self, size: usize) {
        gauge!(METRIC_SIZE).set(size as f64);
    }

    pub(crate) fn snapshot(&self, len: usize, max_sessions: u32) -> TableMetricsSnapshot {
        TableMetricsSnapshot {
            len,
            max_sessions,
            created_total: self.created_total.load(Ordering::Relaxed),
            reaped_total: self.reaped_total.load(Ordering::Relaxed),
            rejected_total: self.rejected_total.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time view of the table's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableMetricsSnapshot {
    pub len: usize,
    pub max_sessions: u32,
    pub created_total: u64,
    pub reaped_total: u64,
    pub rejected_total: u64,
}
