//! Gate driver: runs a [`CallPolicy`] against a scheduler and a wrapped function.
//!
//! The policy decides, the gate carries out. Every entry point locks the gate
//! state, asks the policy for a [`Transition`] and applies it in order:
//! cancel the old timer, arm the new one, invoke. The function lock is taken
//! before the state lock is released, so invocations run in the order their
//! transitions were decided even when timers fire on other threads. Policy
//! state is final before the function runs, so a panicking function cannot
//! leave a stale timer or buffered arguments behind.

use crate::application::control::{Flush, RateControl};
use crate::application::metrics::Metrics;
use crate::application::ports::{Scheduler, TimerId};
use crate::domain::policy::{CallPolicy, Invocation, TimerToken, Transition};
use crate::domain::options::ConfigError;

use std::borrow::Cow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, trace};

type WrappedFn<A, R> = Box<dyn FnMut(A) -> R + Send + 'static>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Pick the scheduler for a new gate.
///
/// Falls back to a [`TokioScheduler`](crate::TokioScheduler) on the ambient
/// runtime when the `async` feature is enabled.
pub(crate) fn resolve_scheduler(
    scheduler: Option<Arc<dyn Scheduler>>,
) -> Result<Arc<dyn Scheduler>, ConfigError> {
    if let Some(scheduler) = scheduler {
        return Ok(scheduler);
    }

    #[cfg(feature = "async")]
    {
        crate::infrastructure::tokio_scheduler::TokioScheduler::try_current()
            .map(|scheduler| Arc::new(scheduler) as Arc<dyn Scheduler>)
            .ok_or(ConfigError::NoScheduler)
    }

    #[cfg(not(feature = "async"))]
    {
        Err(ConfigError::NoScheduler)
    }
}

struct GateState<P> {
    policy: P,
    timer: Option<(TimerToken, TimerId)>,
}

/// A policy bound to a wrapped function and a scheduler.
pub(crate) struct Gate<P, A, R> {
    name: Cow<'static, str>,
    state: Mutex<GateState<P>>,
    func: Mutex<WrappedFn<A, R>>,
    scheduler: Arc<dyn Scheduler>,
    metrics: Metrics,
    this: Weak<Self>,
}

impl<P, A, R> Gate<P, A, R>
where
    P: CallPolicy<A> + 'static,
    A: Send + 'static,
    R: 'static,
{
    pub(crate) fn new<F>(
        name: Cow<'static, str>,
        policy: P,
        func: F,
        scheduler: Arc<dyn Scheduler>,
        metrics: Metrics,
    ) -> Arc<Self>
    where
        F: FnMut(A) -> R + Send + 'static,
    {
        Arc::new_cyclic(|this| Self {
            name,
            state: Mutex::new(GateState {
                policy,
                timer: None,
            }),
            func: Mutex::new(Box::new(func)),
            scheduler,
            metrics,
            this: this.clone(),
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub(crate) fn call(&self, args: A) -> Option<R> {
        self.metrics.record_call();
        let mut state = lock(&self.state);
        let now = self.scheduler.now();
        let transition = state.policy.on_call(now, args);
        self.apply(state, transition)
    }

    fn on_timer(&self, token: TimerToken) {
        let mut state = lock(&self.state);
        if matches!(state.timer, Some((pending, _)) if pending == token) {
            state.timer = None;
        }

        let now = self.scheduler.now();
        let transition = state.policy.on_timer(now, token);
        if transition.is_noop() {
            trace!(gate = %self.name, token = token.get(), "timer woke with nothing to do");
            return;
        }

        // Nobody is waiting on a timer-driven result.
        let _ = self.apply(state, transition);
    }

    fn apply(&self, mut state: MutexGuard<'_, GateState<P>>, transition: Transition<A>) -> Option<R> {
        let Transition {
            cancel,
            arm,
            invoke,
            dropped,
        } = transition;

        if dropped {
            self.metrics.record_dropped();
            trace!(gate = %self.name, "call dropped inside window");
        }

        if let Some(token) = cancel {
            match state.timer.take() {
                Some((pending, id)) if pending == token => {
                    self.scheduler.cancel(id);
                    debug!(gate = %self.name, token = token.get(), "cancelled timer");
                }
                other => state.timer = other,
            }
        }

        if let Some(arm) = arm {
            let gate = self.this.clone();
            let token = arm.token;
            let id = self.scheduler.schedule_after(
                arm.delay,
                Box::new(move || {
                    if let Some(gate) = gate.upgrade() {
                        gate.on_timer(token);
                    }
                }),
            );
            state.timer = Some((token, id));
            debug!(
                gate = %self.name,
                token = token.get(),
                delay = ?arm.delay,
                "armed timer"
            );
        }

        let Invocation { args, edge } = invoke?;
        let mut func = lock(&self.func);
        drop(state);

        self.metrics.record_invocation();
        trace!(gate = %self.name, %edge, "invoking wrapped function");
        Some((&mut **func)(args))
    }
}

impl<P, A, R> RateControl for Gate<P, A, R>
where
    P: CallPolicy<A> + 'static,
    A: Send + 'static,
    R: 'static,
{
    type Output = R;

    fn cancel(&self) {
        let mut state = lock(&self.state);
        let transition = state.policy.cancel();
        if transition.cancel.is_some() {
            self.metrics.record_cancellation();
            debug!(gate = %self.name, "cancelled pending invocation");
        }
        let _ = self.apply(state, transition);
    }

    fn flush(&self) -> Flush<R> {
        let mut state = lock(&self.state);
        let now = self.scheduler.now();
        let transition = state.policy.flush(now);
        if transition.is_noop() {
            return Flush::NothingPending;
        }
        debug!(gate = %self.name, "flushing pending invocation");
        Flush::from(self.apply(state, transition))
    }

    fn pending(&self) -> bool {
        lock(&self.state).policy.is_pending()
    }
}

impl<P, A, R> Drop for Gate<P, A, R> {
    fn drop(&mut self) {
        let state = self
            .state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some((_, id)) = state.timer.take() {
            self.scheduler.cancel(id);
        }
    }
}
