//! Scheduler backed by a dedicated timer thread.
//!
//! For programs without an async runtime. All timers of one scheduler fire on
//! its single worker thread, in deadline order.

use crate::application::ports::{Clock, Scheduler, TimerId, TimerTask};
use crate::infrastructure::clock::SystemClock;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(Default)]
struct Queue {
    timers: BTreeMap<(Instant, u64), TimerTask>,
    deadlines: HashMap<u64, Instant>,
    next_id: u64,
    shutdown: bool,
}

#[derive(Default)]
struct Shared {
    queue: Mutex<Queue>,
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fires timers on a background thread.
///
/// A panic inside a timer task is caught and logged; the worker keeps going.
/// Dropping the scheduler stops the worker and discards unfired timers.
pub struct ThreadScheduler {
    shared: Arc<Shared>,
    clock: SystemClock,
    worker: Option<JoinHandle<()>>,
}

impl ThreadScheduler {
    /// Spawn the worker thread.
    ///
    /// # Errors
    /// Returns the OS error if the thread cannot be spawned.
    pub fn new() -> io::Result<Self> {
        let shared = Arc::new(Shared::default());
        let worker = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("callgate-timer".into())
                .spawn(move || run_worker(&shared))?
        };
        Ok(Self {
            shared,
            clock: SystemClock::new(),
            worker: Some(worker),
        })
    }

    /// Number of timers waiting to fire.
    pub fn pending_timers(&self) -> usize {
        self.shared.lock().timers.len()
    }
}

fn run_worker(shared: &Shared) {
    let mut queue = shared.lock();
    loop {
        if queue.shutdown {
            break;
        }

        let now = Instant::now();
        let next = queue.timers.first_key_value().map(|(&key, _)| key);
        match next {
            Some((deadline, id)) if deadline <= now => {
                let task = queue.timers.remove(&(deadline, id));
                queue.deadlines.remove(&id);
                drop(queue);

                if let Some(task) = task {
                    if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                        tracing::warn!(timer = id, "timer task panicked");
                    }
                }
                queue = shared.lock();
            }
            Some((deadline, _)) => {
                queue = shared
                    .wake
                    .wait_timeout(queue, deadline - now)
                    .map(|(guard, _)| guard)
                    .unwrap_or_else(|poisoned| poisoned.into_inner().0);
            }
            None => {
                queue = shared
                    .wake
                    .wait(queue)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }
    }
}

impl Clock for ThreadScheduler {
    fn now(&self) -> Instant {
        self.clock.now()
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> TimerId {
        let deadline = self.clock.deadline_after(delay);
        let mut queue = self.shared.lock();
        queue.next_id += 1;
        let id = queue.next_id;
        queue.timers.insert((deadline, id), task);
        queue.deadlines.insert(id, deadline);
        drop(queue);

        self.shared.wake.notify_one();
        TimerId::new(id)
    }

    fn cancel(&self, id: TimerId) {
        let mut queue = self.shared.lock();
        if let Some(deadline) = queue.deadlines.remove(&id.get()) {
            queue.timers.remove(&(deadline, id.get()));
        }
    }
}

impl fmt::Debug for ThreadScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadScheduler")
            .field("pending_timers", &self.pending_timers())
            .finish()
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        self.shared.lock().shutdown = true;
        self.shared.wake.notify_all();

        if let Some(worker) = self.worker.take() {
            // The last reference can be released by a task on the worker itself.
            if worker.thread().id() != thread::current().id() {
                let _ = worker.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_fires_after_delay() {
        let scheduler = ThreadScheduler::new().unwrap();
        let (tx, rx) = mpsc::channel();
        let start = scheduler.now();

        scheduler.schedule_after(
            Duration::from_millis(20),
            Box::new(move || tx.send(Instant::now()).unwrap()),
        );

        let fired = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(fired.duration_since(start) >= Duration::from_millis(20));
        assert_eq!(scheduler.pending_timers(), 0);
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let scheduler = ThreadScheduler::new().unwrap();
        let (tx, rx) = mpsc::channel();

        for (label, delay) in [("late", 40), ("early", 10), ("middle", 25)] {
            let tx = tx.clone();
            scheduler.schedule_after(
                Duration::from_millis(delay),
                Box::new(move || tx.send(label).unwrap()),
            );
        }

        let order: Vec<_> = (0..3)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        assert_eq!(order, vec!["early", "middle", "late"]);
    }

    #[test]
    fn test_cancelled_timer_does_not_fire() {
        let scheduler = ThreadScheduler::new().unwrap();
        let (tx, rx) = mpsc::channel::<()>();

        let id = scheduler.schedule_after(
            Duration::from_millis(30),
            Box::new(move || tx.send(()).unwrap()),
        );
        scheduler.cancel(id);
        scheduler.cancel(id);

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_panicking_task_does_not_stop_worker() {
        let scheduler = ThreadScheduler::new().unwrap();
        let (tx, rx) = mpsc::channel();

        scheduler.schedule_after(Duration::ZERO, Box::new(|| panic!("boom")));
        scheduler.schedule_after(
            Duration::from_millis(5),
            Box::new(move || tx.send(()).unwrap()),
        );

        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }
}
