//! Throttled function wrapper.

use crate::application::control::{Flush, Handle, RateControl};
use crate::application::gate::{resolve_scheduler, Gate};
use crate::application::metrics::Metrics;
use crate::application::ports::Scheduler;
use crate::domain::options::{ConfigError, ThrottleOptions};
use crate::domain::throttle::ThrottlePolicy;

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A function that runs at most once per interval.
///
/// With the default leading and trailing edges, an isolated call runs
/// immediately and a dense burst runs once at its start and once at its end,
/// never more often than once per interval in between.
///
/// Clones share the same gate.
///
/// # Example
///
/// ```
/// use callgate::{ManualScheduler, Throttled};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// let scheduler = ManualScheduler::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
///
/// let on_scroll = Throttled::builder(Duration::from_millis(100))
///     .with_scheduler(Arc::new(scheduler.clone()))
///     .build(move |offset: u32| sink.lock().unwrap().push(offset))
///     .unwrap();
///
/// for offset in 0..5 {
///     on_scroll.call(offset);
///     scheduler.advance(Duration::from_millis(20));
/// }
/// scheduler.run_until_idle();
///
/// assert_eq!(*seen.lock().unwrap(), vec![0, 4]);
/// ```
pub struct Throttled<A, R> {
    gate: Arc<Gate<ThrottlePolicy<A>, A, R>>,
}

impl Throttled<(), ()> {
    /// Start configuring a throttle with the given interval.
    ///
    /// The argument and result types are fixed later by
    /// [`build`](ThrottleBuilder::build).
    pub fn builder(interval: Duration) -> ThrottleBuilder {
        ThrottleBuilder::new(interval)
    }
}

impl<A, R> Throttled<A, R>
where
    A: Send + 'static,
    R: 'static,
{
    /// Call the wrapper.
    ///
    /// Returns the wrapped function's result if it ran during this call
    /// (leading edge), `None` if the arguments were buffered for the trailing
    /// edge or dropped.
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

impl<A, R> RateControl for Throttled<A, R>
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

impl<A, R> Clone for Throttled<A, R> {
    fn clone(&self) -> Self {
        Self {
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<A, R> fmt::Debug for Throttled<A, R>
where
    A: Send + 'static,
    R: 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttled")
            .field("name", &self.gate.name())
            .field("pending", &self.gate.pending())
            .finish()
    }
}

/// Builder for [`Throttled`].
#[derive(Debug, Clone)]
pub struct ThrottleBuilder {
    options: ThrottleOptions,
    name: Cow<'static, str>,
    scheduler: Option<Arc<dyn Scheduler>>,
    metrics: Option<Metrics>,
}

impl ThrottleBuilder {
    /// Leading and trailing throttle with the given interval.
    pub fn new(interval: Duration) -> Self {
        Self::from_options(ThrottleOptions::new(interval))
    }

    /// Start from complete options, e.g. converted from a [`ThrottleConfig`](crate::ThrottleConfig).
    pub fn from_options(options: ThrottleOptions) -> Self {
        Self {
            options,
            name: Cow::Borrowed("throttle"),
            scheduler: None,
            metrics: None,
        }
    }

    /// Invoke immediately when a call opens a new window.
    ///
    /// Default: enabled
    pub fn with_leading(mut self, leading: bool) -> Self {
        self.options.leading = leading;
        self
    }

    /// Honour the last call of a burst once the window closes.
    ///
    /// Default: enabled
    pub fn with_trailing(mut self, trailing: bool) -> Self {
        self.options.trailing = trailing;
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
    /// Returns [`ConfigError::ZeroInterval`] or [`ConfigError::NoEdgeEnabled`]
    /// for invalid options and [`ConfigError::NoScheduler`] if no scheduler is
    /// available.
    pub fn build<A, R, F>(self, func: F) -> Result<Throttled<A, R>, ConfigError>
    where
        A: Send + 'static,
        R: 'static,
        F: FnMut(A) -> R + Send + 'static,
    {
        self.options.validate()?;
        let scheduler = resolve_scheduler(self.scheduler)?;
        let gate = Gate::new(
            self.name,
            ThrottlePolicy::new(self.options),
            func,
            scheduler,
            self.metrics.unwrap_or_default(),
        );
        Ok(Throttled { gate })
    }
}

/// Throttle `func` with the given options on `scheduler`.
///
/// Shorthand for [`ThrottleBuilder::from_options`] followed by `build`.
pub fn throttle<A, R, F>(
    func: F,
    options: ThrottleOptions,
    scheduler: Arc<dyn Scheduler>,
) -> Result<Throttled<A, R>, ConfigError>
where
    A: Send + 'static,
    R: 'static,
    F: FnMut(A) -> R + Send + 'static,
{
    ThrottleBuilder::from_options(options)
        .with_scheduler(scheduler)
        .build(func)
}
