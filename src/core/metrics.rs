//! Queue metrics for async handlers
//!
//! Provides counters for monitoring async handler health, including dropped
//! record counts, queue overflow events and worker failures.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters maintained by one async handler
///
/// # Example
///
/// ```
/// use sinklog::QueueMetrics;
///
/// let metrics = QueueMetrics::new();
/// metrics.record_enqueued();
/// metrics.record_dropped();
///
/// assert_eq!(metrics.enqueued(), 1);
/// assert_eq!(metrics.dropped(), 1);
/// ```
#[derive(Debug)]
pub struct QueueMetrics {
    /// Records accepted into the queue
    enqueued: AtomicU64,

    /// Records handed to the wrapped handler by the worker
    processed: AtomicU64,

    /// Records discarded under the drop strategy
    dropped: AtomicU64,

    /// Number of times an emit found the queue full
    queue_full_events: AtomicU64,

    /// Errors and panics the worker caught from the wrapped handler
    worker_errors: AtomicU64,
}

impl QueueMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            processed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            queue_full_events: AtomicU64::new(0),
            worker_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn queue_full_events(&self) -> u64 {
        self.queue_full_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn worker_errors(&self) -> u64 {
        self.worker_errors.load(Ordering::Relaxed)
    }

    /// Record an accepted record, returning the previous count
    #[inline]
    pub fn record_enqueued(&self) -> u64 {
        self.enqueued.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_processed(&self) -> u64 {
        self.processed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_queue_full(&self) -> u64 {
        self.queue_full_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_worker_error(&self) -> u64 {
        self.worker_errors.fetch_add(1, Ordering::Relaxed)
    }

    /// Get drop rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been offered yet.
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped() as f64;
        let total = self.enqueued() as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }
}

impl Default for QueueMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for QueueMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            enqueued: AtomicU64::new(self.enqueued()),
            processed: AtomicU64::new(self.processed()),
            dropped: AtomicU64::new(self.dropped()),
            queue_full_events: AtomicU64::new(self.queue_full_events()),
            worker_errors: AtomicU64::new(self.worker_errors()),
        }
    }
}
