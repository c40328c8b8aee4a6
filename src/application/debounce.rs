//! Debounced function wrapper.

use crate::application::control::{Flush, Handle, RateControl};
use crate::application::gate::{resolve_scheduler, Gate};
use crate::application::metrics::Metrics;
use crate::application::ports::Scheduler;
use crate::domain::debounce::DebouncePolicy;
use crate::domain::options::{ConfigError, DebounceOptions};

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A function that only runs once calls have stopped arriving for a while.
///
/// Each call buffers its arguments and restarts the quiet period; when the
/// period elapses the wrapped function runs once with the latest arguments.
/// Without `max_wait`, a steady stream of calls holds the invocation back
/// indefinitely.
///
/// Anything the function needs from its caller (a receiver, a request
/// context) travels inside `A`, so it is replayed together with the buffered
/// arguments.
///
/// Clones share the same gate.
///
/// # Example
///
/// ```
/// use callgate::{Debounced, ManualScheduler};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// let scheduler = ManualScheduler::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
///
/// let search = Debounced::builder(Duration::from_millis(100))
///     .with_scheduler(Arc::new(scheduler.clone()))
///     .build(move |query: &'static str| sink.lock().unwrap().push(query))
///     .unwrap();
///
/// search.call("r");
/// scheduler.advance(Duration::from_millis(50));
/// search.call("ru");
/// scheduler.advance(Duration::from_millis(50));
/// search.call("rust");
/// scheduler.advance(Duration::from_millis(100));
///
/// assert_eq!(*seen.lock().unwrap(), vec!["rust"]);
/// ```
pub struct Debounced<A, R> {
    gate: Arc<Gate<DebouncePolicy<A>, A, R>>,
}

impl Debounced<(), ()> {
    /// Start configuring a debounce with the given quiet period.
    ///
    /// The argument and result types are fixed later by
    /// [`build`](DebounceBuilder::build).
    pub fn builder(delay: Duration) -> DebounceBuilder {
        DebounceBuilder::new(delay)
    }
}

impl<A, R> Debounced<A, R>
where
    A: Send + 'static,
    R: 'static,
{
    /// Call the wrapper.
    ///
    /// Returns the wrapped function's result if it ran during this call
    /// (leading edge or max-wait bound), `None` if the arguments were buffered.
    pub fn call(&self, args: A) -> Option<R> {
        self.gate.call(args)
    }

    /// A type-erased handle that can cancel or flush this gate.
    pub fn handle(&self) -> Handle<R> {
        Handle::new(self.gate.clone())
    }

    /// Counters for this gate.
    pub fn metrics(&self) -> &Metrics {
        self.gate.metrics()
    }

    /// Name used in log events.
    pub fn name(&self) -> &str {
        self.gate.name()
    }
}

impl<A, R> RateControl for Debounced<A, R>
where
    A: Send + 'static,
    R: 'static,
{
    type Output = R;

    fn cancel(&self) {
        self.gate.cancel();
    }

    fn flush(&self) -> Flush<R> {
        self.gate.flush()
    }

    fn pending(&self) -> bool {
        self.gate.pending()
    }
}

impl<A, R> Clone for Debounced<A, R> {
    fn clone(&self) -> Self {
        Self {
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<A, R> fmt::Debug for Debounced<A, R>
where
    A: Send + 'static,
    R: 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debounced")
            .field("name", &self.gate.name())
            .field("pending", &self.gate.pending())
            .finish()
    }
}

/// Builder for [`Debounced`].
#[derive(Debug, Clone)]
pub struct DebounceBuilder {
    options: DebounceOptions,
    name: Cow<'static, str>,
    scheduler: Option<Arc<dyn Scheduler>>,
    metrics: Option<Metrics>,
}

impl DebounceBuilder {
    /// Trailing-only debounce with the given quiet period.
    pub fn new(delay: Duration) -> Self {
        Self::from_options(DebounceOptions::new(delay))
    }

    /// Start from complete options, e.g. converted from a [`DebounceConfig`](crate::DebounceConfig).
    pub fn from_options(options: DebounceOptions) -> Self {
        Self {
            options,
            name: Cow::Borrowed("debounce"),
            scheduler: None,
            metrics: None,
        }
    }

    /// Invoke immediately on the first call of a burst.
    ///
    /// Default: disabled
    pub fn with_leading(mut self, leading: bool) -> Self {
        self.options.leading = leading;
        self
    }

    /// Guarantee an invocation at least once per `max_wait` under continuous calls.
    ///
    /// Default: unbounded
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.options.max_wait = Some(max_wait);
        self
    }

    /// Name reported in log events.
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the clock and timer the gate runs on.
    ///
    /// Default: a `TokioScheduler` on the current runtime (`async` feature).
    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Record into existing metrics instead of a fresh set.
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Wrap `func`.
    ///
    /// # Errors
    /// Returns [`ConfigError::NoScheduler`] if no scheduler was set and none
    /// is available.
    pub fn build<A, R, F>(self, func: F) -> Result<Debounced<A, R>, ConfigError>
    where
        A: Send + 'static,
        R: 'static,
        F: FnMut(A) -> R + Send + 'static,
    {
        let scheduler = resolve_scheduler(self.scheduler)?;
        let gate = Gate::new(
            self.name,
            DebouncePolicy::new(self.options),
            func,
            scheduler,
            self.metrics.unwrap_or_default(),
        );
        Ok(Debounced { gate })
    }
}

/// Debounce `func` with the given options on `scheduler`.
///
/// Shorthand for [`DebounceBuilder::from_options`] followed by `build`.
pub fn debounce<A, R, F>(
    func: F,
    options: DebounceOptions,
    scheduler: Arc<dyn Scheduler>,
) -> Result<Debounced<A, R>, ConfigError>
where
    A: Send + 'static,
    R: 'static,
    F: FnMut(A) -> R + Send + 'static,
{
    DebounceBuilder::from_options(options)
        .with_scheduler(scheduler)
        .build(func)
}
