//! Throttle policy.
//!
//! Caps invocations of the wrapped function to at most one per interval,
//! measured from the previous actual invocation.

use crate::domain::options::ThrottleOptions;
use crate::domain::policy::{Arm, CallPolicy, Edge, TimerToken, TokenSource, Transition};
use std::time::{Duration, Instant};

/// Throttle state machine.
///
/// # Example
/// ```
/// use callgate::{CallPolicy, ThrottleOptions, ThrottlePolicy};
/// use std::time::{Duration, Instant};
///
/// let mut policy = ThrottlePolicy::new(ThrottleOptions::new(Duration::from_millis(100)));
/// let t0 = Instant::now();
///
/// // The first call opens a window and fires immediately.
/// assert_eq!(policy.on_call(t0, 0).invoke.unwrap().args, 0);
///
/// // Calls inside the window are buffered for the trailing edge.
/// let arm = policy.on_call(t0 + Duration::from_millis(30), 1).arm.unwrap();
/// assert_eq!(arm.delay, Duration::from_millis(70));
/// policy.on_call(t0 + Duration::from_millis(60), 2);
///
/// let fired = policy.on_timer(t0 + Duration::from_millis(100), arm.token);
/// assert_eq!(fired.invoke.unwrap().args, 2);
/// ```
#[derive(Debug, Clone)]
pub struct ThrottlePolicy<A> {
    options: ThrottleOptions,
    pending: Option<TimerToken>,
    buffered: Option<A>,
    last_fire: Option<Instant>,
    tokens: TokenSource,
}

impl<A> ThrottlePolicy<A> {
    /// Create a policy with the given options.
    pub fn new(options: ThrottleOptions) -> Self {
        Self {
            options,
            pending: None,
            buffered: None,
            last_fire: None,
            tokens: TokenSource::default(),
        }
    }

    /// The options this policy runs with.
    pub fn options(&self) -> &ThrottleOptions {
        &self.options
    }

    /// Instant of the most recent invocation, if any.
    pub fn last_fire(&self) -> Option<Instant> {
        self.last_fire
    }

    fn arm(&mut self, delay: Duration) -> Arm {
        let token = self.tokens.next_token();
        self.pending = Some(token);
        Arm { token, delay }
    }
}

impl<A: Send> CallPolicy<A> for ThrottlePolicy<A> {
    fn on_call(&mut self, now: Instant, args: A) -> Transition<A> {
        let interval = self.options.interval;
        let elapsed = self
            .last_fire
            .map(|last| now.saturating_duration_since(last));
        let window_open = elapsed.map_or(true, |elapsed| elapsed >= interval);

        if window_open && self.options.leading {
            self.buffered = None;
            self.last_fire = Some(now);
            return Transition::none()
                .cancelling(self.pending.take())
                .invoking(Some(args), Edge::Leading);
        }

        if !self.options.trailing {
            return Transition::none().dropping();
        }

        self.buffered = Some(args);
        if self.pending.is_some() {
            return Transition::none();
        }

        // Without a leading edge an opening call waits one full interval.
        let delay = match elapsed {
            Some(elapsed) if !window_open => interval - elapsed,
            _ => interval,
        };
        let arm = self.arm(delay);
        Transition::none().arming(arm)
    }

    fn on_timer(&mut self, now: Instant, token: TimerToken) -> Transition<A> {
        if self.pending != Some(token) {
            return Transition::none();
        }
        self.pending = None;

        let args = self.buffered.take();
        if args.is_some() {
            self.last_fire = Some(now);
        }
        Transition::none().invoking(args, Edge::Trailing)
    }

    fn flush(&mut self, now: Instant) -> Transition<A> {
        let Some(token) = self.pending.take() else {
            return Transition::none();
        };
        let args = self.buffered.take();
        if args.is_some() {
            self.last_fire = Some(now);
        }
        Transition::none()
            .cancelling(Some(token))
            .invoking(args, Edge::Flush)
    }

    fn cancel(&mut self) -> Transition<A> {
        self.buffered = None;
        self.last_fire = None;
        Transition::none().cancelling(self.pending.take())
    }

    fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
