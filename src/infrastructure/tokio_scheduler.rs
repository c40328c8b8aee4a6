//! Scheduler backed by the tokio timer.
//!
//! Each armed timer is a spawned task sleeping until a deadline fixed when
//! the timer was armed.
//! Cancelling aborts the task. Time is read from `tokio::time::Instant`, so
//! gates on this scheduler follow a paused or auto-advanced test clock.

use crate::application::ports::{Clock, Scheduler, TimerId, TimerTask};
use crate::infrastructure::clock::FAR_FUTURE;

use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;

/// Fires timers as tasks on a tokio runtime.
#[derive(Clone)]
pub struct TokioScheduler {
    runtime: Handle,
    tasks: Arc<DashMap<TimerId, AbortHandle>>,
    next_id: Arc<AtomicU64>,
}

impl TokioScheduler {
    /// Schedule onto the given runtime.
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            tasks: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Schedule onto the runtime the caller is running in, if any.
    pub fn try_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }

    /// Number of timers that have neither fired nor been cancelled.
    pub fn pending_timers(&self) -> usize {
        self.tasks.len()
    }
}

impl Clock for TokioScheduler {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> TimerId {
        let id = TimerId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let tasks = Arc::clone(&self.tasks);

        // Measured from now, not from the task's first poll.
        let now = tokio::time::Instant::now();
        let deadline = now
            .checked_add(delay)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        let (registered_tx, registered_rx) = oneshot::channel::<()>();

        let join = self.runtime.spawn(async move {
            // The abort handle must be in the map before the task can remove it.
            let _ = registered_rx.await;
            tokio::time::sleep_until(deadline).await;
            // Deregister first so a cancel racing with the callback is a no-op.
            tasks.remove(&id);
            task();
        });

        self.tasks.insert(id, join.abort_handle());
        let _ = registered_tx.send(());
        id
    }

    fn cancel(&self, id: TimerId) {
        if let Some((_, handle)) = self.tasks.remove(&id) {
            handle.abort();
        }
    }
}

impl fmt::Debug for TokioScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioScheduler")
            .field("pending_timers", &self.tasks.len())
            .finish()
    }
}
