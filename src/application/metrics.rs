//! Observability metrics for a gate.
//!
//! Counts how a gate treated the calls it received, for monitoring and for
//! asserting behavior in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for one gate.
///
/// All counters use relaxed atomics and can be read at any time. Clones share
/// the same counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    /// Calls made to the wrapper
    calls: AtomicU64,
    /// Invocations of the wrapped function, on any edge
    invocations: AtomicU64,
    /// Calls discarded without being buffered
    dropped: AtomicU64,
    /// `cancel()` calls that discarded a pending timer
    cancellations: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    pub(crate) fn record_call(&self) {
        self.inner.calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_invocation(&self) {
        self.inner.invocations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.inner.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cancellation(&self) {
        self.inner.cancellations.fetch_add(1, Ordering::Relaxed);
    }

    /// Total calls made to the wrapper.
    pub fn calls(&self) -> u64 {
        self.inner.calls.load(Ordering::Relaxed)
    }

    /// Total invocations of the wrapped function.
    pub fn invocations(&self) -> u64 {
        self.inner.invocations.load(Ordering::Relaxed)
    }

    /// Total calls discarded without being buffered.
    pub fn dropped(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }

    /// Total cancellations that discarded a pending timer.
    pub fn cancellations(&self) -> u64 {
        self.inner.cancellations.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            calls: self.calls(),
            invocations: self.invocations(),
            dropped: self.dropped(),
            cancellations: self.cancellations(),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.inner.calls.store(0, Ordering::Relaxed);
        self.inner.invocations.store(0, Ordering::Relaxed);
        self.inner.dropped.store(0, Ordering::Relaxed);
        self.inner.cancellations.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of gate counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Calls made to the wrapper
    pub calls: u64,
    /// Invocations of the wrapped function
    pub invocations: u64,
    /// Calls discarded without being buffered
    pub dropped: u64,
    /// Cancellations that discarded a pending timer
    pub cancellations: u64,
}

impl MetricsSnapshot {
    /// Ratio of invocations to calls (0.0 when no calls were made).
    ///
    /// Every invocation consumes the arguments of a distinct call, so this
    /// stays within 0.0..=1.0.
    pub fn invocation_rate(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.invocations as f64 / self.calls as f64
        }
    }

    /// Calls that have not (yet) turned into an invocation.
    pub fn absorbed(&self) -> u64 {
        self.calls.saturating_sub(self.invocations)
    }
}
