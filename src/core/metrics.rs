//! Delivery counters for fire-and-forget sinks
//!
//! A network sink never reports failures to its caller, so these counters are
//! the only place lost lines become visible.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a best-effort network sink
///
/// # Example
///
/// ```
/// use scaffold_log::core::SinkMetrics;
///
/// let metrics = SinkMetrics::new();
/// metrics.record_sent();
/// metrics.record_dropped();
///
/// assert_eq!(metrics.sent(), 1);
/// assert_eq!(metrics.dropped(), 1);
/// ```
#[derive(Debug)]
pub struct SinkMetrics {
    /// Lines written to the connection
    sent: AtomicU64,

    /// Lines lost to connect or write failures
    dropped: AtomicU64,

    /// Successful connection establishments
    connects: AtomicU64,

    /// Failed connection attempts
    connect_failures: AtomicU64,
}

impl SinkMetrics {
    pub const fn new() -> Self {
        Self {
            sent: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            connects: AtomicU64::new(0),
            connect_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn connects(&self) -> u64 {
        self.connects.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn connect_failures(&self) -> u64 {
        self.connect_failures.load(Ordering::Relaxed)
    }

    /// Record a delivered line, returns the previous count
    #[inline]
    pub fn record_sent(&self) -> u64 {
        self.sent.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_connect(&self) -> u64 {
        self.connects.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_connect_failure(&self) -> u64 {
        self.connect_failures.fetch_add(1, Ordering::Relaxed)
    }

    /// Lines that finished one way or the other
    pub fn completed(&self) -> u64 {
        self.sent() + self.dropped()
    }

    /// Get drop rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been attempted.
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped() as f64;
        let total = self.sent() as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }
}

impl Default for SinkMetrics {
    fn default() -> Self {
        Self::new()
    }
}
