//! Sink metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for a single sink
///
/// Mirrored into the global `metrics` recorder as
/// `vio_align_reports_dispatched_total{sink,status}`.
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Reports waiting in the sink queue
    queue_len: AtomicUsize,
    /// Total successful writes
    write_count: AtomicU64,
    /// Total write failures
    failure_count: AtomicU64,
}

impl SinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    pub fn record_write(&self, sink: &str) {
        self.write_count.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!(
            "vio_align_reports_dispatched_total",
            "sink" => sink.to_string(),
            "status" => "ok"
        )
        .increment(1);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn record_failure(&self, sink: &str) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!(
            "vio_align_reports_dispatched_total",
            "sink" => sink.to_string(),
            "status" => "error"
        )
        .increment(1);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len(),
            write_count: self.write_count(),
            failure_count: self.failure_count(),
        }
    }
}

/// Snapshot of sink metrics (for reporting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub write_count: u64,
    pub failure_count: u64,
}
