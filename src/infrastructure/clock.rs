//! Wall-clock time source for real schedulers.
//!
//! Virtual time for tests lives in `ManualScheduler`
//! (`crate::infrastructure::mocks`, `test-helpers` feature).

use crate::application::ports::Clock;
use std::time::{Duration, Instant};

/// Roughly thirty years; far enough to mean "never" for a timer.
pub(crate) const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// Monotonic clock backed by `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock.
    pub fn new() -> Self {
        Self
    }

    /// Instant at which a timer armed now for `delay` falls due.
    ///
    /// Delays too large to represent saturate to a far-future instant
    /// instead of overflowing.
    pub fn deadline_after(&self, delay: Duration) -> Instant {
        let now = self.now();
        now.checked_add(delay)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
