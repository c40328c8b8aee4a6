//! Virtual-time scheduler for testing.

use crate::application::ports::{Clock, Scheduler, TimerId, TimerTask};
use crate::infrastructure::clock::FAR_FUTURE;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Scheduler whose time only moves when the test says so.
///
/// Timers fire from [`advance`](Self::advance) and friends, on the calling
/// thread, in deadline order (registration order breaks ties). The clock is
/// set to each timer's deadline before its task runs, so the task observes
/// exactly the instant it was due. Timers armed by a task fire within the
/// same advance if their deadline falls inside it.
///
/// # Examples
///
/// ```
/// use callgate::infrastructure::mocks::ManualScheduler;
/// use callgate::{Clock, Scheduler};
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let scheduler = ManualScheduler::new();
/// let start = scheduler.now();
/// let fired = Arc::new(AtomicBool::new(false));
/// let flag = Arc::clone(&fired);
///
/// scheduler.schedule_after(
///     Duration::from_millis(100),
///     Box::new(move || flag.store(true, Ordering::SeqCst)),
/// );
///
/// scheduler.advance(Duration::from_millis(99));
/// assert!(!fired.load(Ordering::SeqCst));
///
/// scheduler.advance(Duration::from_millis(1));
/// assert!(fired.load(Ordering::SeqCst));
/// assert_eq!(scheduler.now(), start + Duration::from_millis(100));
/// ```
///
/// # Thread Safety
///
/// `ManualScheduler` is thread-safe and can be cloned to share across threads.
/// All clones share the same time and timer queue.
#[derive(Clone)]
pub struct ManualScheduler {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    start: Instant,
    now: Instant,
    next_id: u64,
    timers: BTreeMap<(Instant, u64), TimerTask>,
    deadlines: HashMap<u64, Instant>,
}

impl ManualScheduler {
    /// Create a scheduler whose virtual time starts at the current instant.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Create a scheduler whose virtual time starts at `start`.
    pub fn starting_at(start: Instant) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                start,
                now: start,
                next_id: 0,
                timers: BTreeMap::new(),
                deadlines: HashMap::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .expect("ManualScheduler mutex poisoned - a test thread panicked while holding the lock")
    }

    /// Virtual time elapsed since the scheduler was created.
    pub fn elapsed(&self) -> Duration {
        let inner = self.lock();
        inner.now - inner.start
    }

    /// Number of timers waiting to fire.
    pub fn pending_timers(&self) -> usize {
        self.lock().timers.len()
    }

    /// Deadline of the earliest waiting timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.lock().timers.keys().next().map(|&(deadline, _)| deadline)
    }

    /// Move time forward by `duration`, firing every timer that falls due.
    ///
    /// Returns the number of timers fired.
    pub fn advance(&self, duration: Duration) -> usize {
        let target = self.lock().now + duration;
        self.advance_to(target)
    }

    /// Move time forward to `target`, firing every timer that falls due.
    ///
    /// Moving backwards is ignored. Returns the number of timers fired.
    pub fn advance_to(&self, target: Instant) -> usize {
        let mut fired = 0;
        loop {
            let mut inner = self.lock();
            let due = inner
                .timers
                .keys()
                .next()
                .copied()
                .filter(|&(deadline, _)| deadline <= target);

            let Some(key) = due else {
                if target > inner.now {
                    inner.now = target;
                }
                return fired;
            };

            let task = inner.timers.remove(&key);
            inner.deadlines.remove(&key.1);
            if key.0 > inner.now {
                inner.now = key.0;
            }
            // Tasks may call back into the scheduler.
            drop(inner);

            if let Some(task) = task {
                task();
                fired += 1;
            }
        }
    }

    /// Fire timers until none are left, jumping time to each deadline.
    ///
    /// Returns the number of timers fired. Panics after a million timers,
    /// which only a self-rearming zero-delay timer can reach.
    pub fn run_until_idle(&self) -> usize {
        let mut fired = 0;
        while let Some(deadline) = self.next_deadline() {
            fired += self.advance_to(deadline);
            assert!(fired < 1_000_000, "ManualScheduler never went idle");
        }
        fired
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("ManualScheduler")
            .field("elapsed", &(inner.now - inner.start))
            .field("pending_timers", &inner.timers.len())
            .finish()
    }
}

impl Clock for ManualScheduler {
    fn now(&self) -> Instant {
        self.lock().now
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> TimerId {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        let now = inner.now;
        let deadline = now
            .checked_add(delay)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        inner.timers.insert((deadline, id), task);
        inner.deadlines.insert(id, deadline);
        TimerId::new(id)
    }

    fn cancel(&self, id: TimerId) {
        let mut inner = self.lock();
        if let Some(deadline) = inner.deadlines.remove(&id.get()) {
            inner.timers.remove(&(deadline, id.get()));
        }
    }
}
