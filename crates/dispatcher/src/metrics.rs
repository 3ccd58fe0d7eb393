//! Per-sink write counters, shown in the end-of-run report

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared between a [`SinkHandle`](crate::SinkHandle) and its worker
#[derive(Debug, Default)]
pub struct SinkMetrics {
    records_written: AtomicU64,
    write_failures: AtomicU64,
}

impl SinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the sink accepted
    pub fn records_written(&self) -> u64 {
        self.records_written.load(Ordering::Relaxed)
    }

    /// Writes the sink rejected (at most one, the worker stops on it)
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    pub(crate) fn record_write(&self, ok: bool) {
        let counter = if ok {
            &self.records_written
        } else {
            &self.write_failures
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_written: self.records_written(),
            write_failures: self.write_failures(),
        }
    }
}

/// Point-in-time copy of [`SinkMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub records_written: u64,
    pub write_failures: u64,
}
