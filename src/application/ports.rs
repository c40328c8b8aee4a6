//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use std::fmt::Debug;
use std::time::{Duration, Instant};

/// Port for obtaining current time.
///
/// This abstraction allows the application layer to work with time
/// without depending on system clock implementation details.
/// Infrastructure provides concrete implementations (SystemClock,
/// TokioScheduler, ManualScheduler).
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;
}

/// Handle to a timer registered with a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Wrap a raw id. Schedulers pick ids that are unique among their live timers.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Deferred work handed to a [`Scheduler`].
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// Port for one-shot deferred callbacks.
///
/// A scheduler is also the clock its timers are measured against, so a
/// virtual-time scheduler can move "now" as it fires timers.
pub trait Scheduler: Clock {
    /// Run `task` once `delay` has elapsed.
    ///
    /// Implementations must not run the task before returning, even for a
    /// zero delay: callers may hold locks the task needs.
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> TimerId;

    /// Prevent a scheduled task from running.
    ///
    /// Unknown, fired or already-cancelled ids are ignored.
    fn cancel(&self, id: TimerId);
}
