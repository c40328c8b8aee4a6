//! Invocation recorder for testing.

use crate::infrastructure::mocks::ManualScheduler;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Records every invocation of a wrapped function with its virtual time.
///
/// [`sink`](Self::sink) produces a function to hand to a gate builder; each
/// call to it is logged together with the scheduler's elapsed time, so tests
/// can assert both what ran and when.
///
/// # Examples
///
/// ```
/// use callgate::infrastructure::mocks::{ManualScheduler, Recorder};
/// use callgate::Debounced;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let scheduler = ManualScheduler::new();
/// let recorder = Recorder::new(scheduler.clone());
/// let gate = Debounced::builder(Duration::from_millis(10))
///     .with_scheduler(Arc::new(scheduler.clone()))
///     .build(recorder.sink())
///     .unwrap();
///
/// gate.call("x");
/// scheduler.advance(Duration::from_millis(10));
/// assert_eq!(recorder.calls(), vec![(Duration::from_millis(10), "x")]);
/// ```
#[derive(Debug)]
pub struct Recorder<A> {
    scheduler: ManualScheduler,
    calls: Arc<Mutex<Vec<(Duration, A)>>>,
}

impl<A> Clone for Recorder<A> {
    fn clone(&self) -> Self {
        Self {
            scheduler: self.scheduler.clone(),
            calls: Arc::clone(&self.calls),
        }
    }
}

impl<A> Recorder<A> {
    /// Create a recorder timestamping against `scheduler`.
    pub fn new(scheduler: ManualScheduler) -> Self {
        Self {
            scheduler,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(Duration, A)>> {
        self.calls
            .lock()
            .expect("Recorder mutex poisoned - a test thread panicked while holding the lock")
    }

    /// A function that records its argument.
    pub fn sink(&self) -> impl FnMut(A) + Send + 'static
    where
        A: Send + 'static,
    {
        let recorder = self.clone();
        move |args| {
            let at = recorder.scheduler.elapsed();
            recorder.lock().push((at, args));
        }
    }

    /// Number of recorded invocations.
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// Check whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl<A: Clone> Recorder<A> {
    /// All recorded invocations as `(elapsed, args)` pairs.
    pub fn calls(&self) -> Vec<(Duration, A)> {
        self.lock().clone()
    }

    /// Arguments of all recorded invocations.
    pub fn args(&self) -> Vec<A> {
        self.lock().iter().map(|(_, args)| args.clone()).collect()
    }

    /// Elapsed times of all recorded invocations.
    pub fn times(&self) -> Vec<Duration> {
        self.lock().iter().map(|(at, _)| *at).collect()
    }
}
