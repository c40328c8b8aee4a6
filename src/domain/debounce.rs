//! Debounce policy.
//!
//! Fires the wrapped function only after a quiet period with no new calls,
//! using the arguments of the last call. Optionally fires on the first call of
//! a burst (`leading`) and bounds how long a continuous burst may hold back an
//! invocation (`max_wait`).

use crate::domain::options::DebounceOptions;
use crate::domain::policy::{Arm, CallPolicy, Edge, TimerToken, TokenSource, Transition};
use std::time::{Duration, Instant};

/// Debounce state machine.
///
/// # Example
/// ```
/// use callgate::{CallPolicy, DebounceOptions, DebouncePolicy};
/// use std::time::{Duration, Instant};
///
/// let mut policy = DebouncePolicy::new(DebounceOptions::new(Duration::from_millis(100)));
/// let t0 = Instant::now();
///
/// let first = policy.on_call(t0, "a");
/// let second = policy.on_call(t0 + Duration::from_millis(50), "b");
/// assert!(first.invoke.is_none() && second.invoke.is_none());
///
/// // The second call replaced the first timer; only its token is live.
/// let token = second.arm.unwrap().token;
/// let fired = policy.on_timer(t0 + Duration::from_millis(150), token);
/// assert_eq!(fired.invoke.unwrap().args, "b");
/// ```
#[derive(Debug, Clone)]
pub struct DebouncePolicy<A> {
    options: DebounceOptions,
    pending: Option<TimerToken>,
    buffered: Option<A>,
    burst_start: Option<Instant>,
    last_call: Option<Instant>,
    tokens: TokenSource,
}

impl<A> DebouncePolicy<A> {
    /// Create a policy with the given options.
    pub fn new(options: DebounceOptions) -> Self {
        Self {
            options,
            pending: None,
            buffered: None,
            burst_start: None,
            last_call: None,
            tokens: TokenSource::default(),
        }
    }

    /// The options this policy runs with.
    pub fn options(&self) -> &DebounceOptions {
        &self.options
    }

    /// Whether arguments are waiting for the trailing edge.
    pub fn has_buffered(&self) -> bool {
        self.buffered.is_some()
    }

    fn max_wait_reached(&self, now: Instant) -> bool {
        match (self.options.max_wait, self.burst_start) {
            (Some(max_wait), Some(start)) => now.saturating_duration_since(start) >= max_wait,
            _ => false,
        }
    }

    /// Arm the next timer.
    ///
    /// The deadline is the end of the quiet period, pulled in to the max-wait
    /// deadline while arguments are buffered.
    fn arm(&mut self, now: Instant) -> Arm {
        let since_last = self
            .last_call
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        let quiet = self.options.delay.saturating_sub(since_last);

        let delay = match (self.options.max_wait, self.burst_start) {
            // A max-wait beyond what `Instant` can represent never binds.
            (Some(max_wait), Some(start)) if self.buffered.is_some() => start
                .checked_add(max_wait)
                .map_or(quiet, |deadline| {
                    quiet.min(deadline.saturating_duration_since(now))
                }),
            _ => quiet,
        };

        let token = self.tokens.next_token();
        self.pending = Some(token);
        Arm { token, delay }
    }

    fn reset(&mut self) {
        self.buffered = None;
        self.burst_start = None;
        self.last_call = None;
    }
}

impl<A: Send> CallPolicy<A> for DebouncePolicy<A> {
    fn on_call(&mut self, now: Instant, args: A) -> Transition<A> {
        let previous = self.pending.take();
        let new_burst = previous.is_none();
        let transition = Transition::none().cancelling(previous);

        self.last_call = Some(now);

        if new_burst {
            self.burst_start = Some(now);
            if self.options.leading {
                self.buffered = None;
                let arm = self.arm(now);
                return transition.arming(arm).invoking(Some(args), Edge::Leading);
            }
        }

        if self.max_wait_reached(now) {
            // The burst has been held back long enough; fire now and start
            // measuring the next stretch from here.
            self.buffered = None;
            self.burst_start = Some(now);
            let arm = self.arm(now);
            return transition.arming(arm).invoking(Some(args), Edge::MaxWait);
        }

        self.buffered = Some(args);
        let arm = self.arm(now);
        transition.arming(arm)
    }

    fn on_timer(&mut self, now: Instant, token: TimerToken) -> Transition<A> {
        if self.pending != Some(token) {
            return Transition::none();
        }
        self.pending = None;

        let quiet = self
            .last_call
            .map_or(true, |last| now.saturating_duration_since(last) >= self.options.delay);
        let args = self.buffered.take();

        if quiet {
            self.reset();
            return Transition::none().invoking(args, Edge::Trailing);
        }

        // Woken by the max-wait deadline while calls are still arriving.
        self.burst_start = Some(now);
        let arm = self.arm(now);
        Transition::none()
            .arming(arm)
            .invoking(args, Edge::MaxWait)
    }

    fn flush(&mut self, _now: Instant) -> Transition<A> {
        let Some(token) = self.pending.take() else {
            return Transition::none();
        };
        let args = self.buffered.take();
        self.reset();
        Transition::none()
            .cancelling(Some(token))
            .invoking(args, Edge::Flush)
    }

    fn cancel(&mut self) -> Transition<A> {
        let token = self.pending.take();
        self.reset();
        Transition::none().cancelling(token)
    }

    fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn trailing(delay: u64) -> DebouncePolicy<&'static str> {
        DebouncePolicy::new(DebounceOptions::new(ms(delay)))
    }

    #[test]
    fn test_single_call_fires_after_delay() {
        let mut policy = trailing(100);
        let t0 = Instant::now();

        let t = policy.on_call(t0, "a");
        assert!(t.invoke.is_none());
        assert!(t.cancel.is_none());
        let arm = t.arm.unwrap();
        assert_eq!(arm.delay, ms(100));
        assert!(policy.is_pending());

        let fired = policy.on_timer(t0 + ms(100), arm.token);
        assert_eq!(fired.invoke.unwrap().args, "a");
        assert!(!policy.is_pending());
    }

    #[test]
    fn test_each_call_replaces_timer() {
        let mut policy = trailing(100);
        let t0 = Instant::now();

        let first = policy.on_call(t0, "a").arm.unwrap();
        let second = policy.on_call(t0 + ms(50), "b");
        assert_eq!(second.cancel, Some(first.token));
        let second = second.arm.unwrap();
        assert_ne!(first.token, second.token);

        // The replaced timer is stale.
        assert!(policy.on_timer(t0 + ms(100), first.token).is_noop());
        assert!(policy.is_pending());

        let fired = policy.on_timer(t0 + ms(150), second.token);
        assert_eq!(fired.invoke.unwrap().args, "b");
    }

    #[test]
    fn test_leading_fires_once_for_isolated_call() {
        let mut policy =
            DebouncePolicy::new(DebounceOptions::new(ms(100)).with_leading(true));
        let t0 = Instant::now();

        let t = policy.on_call(t0, "a");
        let invocation = t.invoke.unwrap();
        assert_eq!(invocation.args, "a");
        assert_eq!(invocation.edge, Edge::Leading);

        // The burst timer still runs but has nothing to deliver.
        let fired = policy.on_timer(t0 + ms(100), t.arm.unwrap().token);
        assert!(fired.invoke.is_none());
        assert!(!policy.is_pending());
    }

    #[test]
    fn test_leading_then_trailing_when_burst_continues() {
        let mut policy =
            DebouncePolicy::new(DebounceOptions::new(ms(100)).with_leading(true));
        let t0 = Instant::now();

        assert!(policy.on_call(t0, "a").invoke.is_some());
        let t = policy.on_call(t0 + ms(30), "b");
        assert!(t.invoke.is_none());

        let fired = policy.on_timer(t0 + ms(130), t.arm.unwrap().token);
        let invocation = fired.invoke.unwrap();
        assert_eq!(invocation.args, "b");
        assert_eq!(invocation.edge, Edge::Trailing);
    }

    #[test]
    fn test_max_wait_pulls_in_deadline() {
        let mut policy =
            DebouncePolicy::new(DebounceOptions::new(ms(100)).with_max_wait(ms(150)));
        let t0 = Instant::now();

        assert_eq!(policy.on_call(t0, "a").arm.unwrap().delay, ms(100));
        // 150ms max wait from t0: only 70ms left at t=80.
        let arm = policy.on_call(t0 + ms(80), "b").arm.unwrap();
        assert_eq!(arm.delay, ms(70));

        let fired = policy.on_timer(t0 + ms(150), arm.token);
        let invocation = fired.invoke.unwrap();
        assert_eq!(invocation.args, "b");
        assert_eq!(invocation.edge, Edge::MaxWait);

        // A timer for the remaining quiet period keeps the burst open.
        let rearm = fired.arm.unwrap();
        assert_eq!(rearm.delay, ms(30));
        assert!(policy.is_pending());
        assert!(policy.on_timer(t0 + ms(180), rearm.token).invoke.is_none());
        assert!(!policy.is_pending());
    }

    #[test]
    fn test_max_wait_forces_on_late_call() {
        let mut policy =
            DebouncePolicy::new(DebounceOptions::new(ms(100)).with_max_wait(ms(100)));
        let t0 = Instant::now();

        policy.on_call(t0, "a");
        // Timer delivery lagged; the call itself notices the bound.
        let t = policy.on_call(t0 + ms(100), "b");
        let invocation = t.invoke.unwrap();
        assert_eq!(invocation.args, "b");
        assert_eq!(invocation.edge, Edge::MaxWait);
        assert!(!policy.has_buffered());
    }

    #[test]
    fn test_zero_max_wait_invokes_every_call() {
        let mut policy =
            DebouncePolicy::new(DebounceOptions::new(ms(100)).with_max_wait(Duration::ZERO));
        let t0 = Instant::now();

        for (i, args) in ["a", "b", "c"].into_iter().enumerate() {
            let t = policy.on_call(t0 + ms(i as u64 * 10), args);
            assert_eq!(t.invoke.unwrap().args, args);
        }
    }

    #[test]
    fn test_flush_delivers_buffered() {
        let mut policy = trailing(100);
        let t0 = Instant::now();

        let arm = policy.on_call(t0, "a").arm.unwrap();
        let flushed = policy.flush(t0 + ms(10));
        assert_eq!(flushed.cancel, Some(arm.token));
        let invocation = flushed.invoke.unwrap();
        assert_eq!(invocation.args, "a");
        assert_eq!(invocation.edge, Edge::Flush);
        assert!(!policy.is_pending());

        // Nothing left.
        assert!(policy.flush(t0 + ms(20)).is_noop());
        assert!(policy.on_timer(t0 + ms(100), arm.token).is_noop());
    }

    #[test]
    fn test_flush_after_leading_has_nothing_to_deliver() {
        let mut policy =
            DebouncePolicy::new(DebounceOptions::new(ms(100)).with_leading(true));
        let t0 = Instant::now();

        policy.on_call(t0, "a");
        let flushed = policy.flush(t0 + ms(10));
        assert!(flushed.cancel.is_some());
        assert!(flushed.invoke.is_none());
        assert!(!policy.is_pending());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut policy = trailing(100);
        let t0 = Instant::now();

        let arm = policy.on_call(t0, "a").arm.unwrap();
        assert_eq!(policy.cancel().cancel, Some(arm.token));
        assert!(policy.cancel().is_noop());
        assert!(!policy.is_pending());
        assert!(policy.on_timer(t0 + ms(100), arm.token).is_noop());
    }

    #[test]
    fn test_new_burst_after_cancel() {
        let mut policy =
            DebouncePolicy::new(DebounceOptions::new(ms(100)).with_leading(true));
        let t0 = Instant::now();

        assert!(policy.on_call(t0, "a").invoke.is_some());
        policy.cancel();
        assert!(policy.on_call(t0 + ms(10), "b").invoke.is_some());
    }

    #[test]
    fn test_unrepresentable_max_wait_acts_as_unbounded() {
        let mut policy =
            DebouncePolicy::new(DebounceOptions::new(ms(100)).with_max_wait(Duration::MAX));
        let t0 = Instant::now();

        let first = policy.on_call(t0, "a");
        assert_eq!(first.arm.unwrap().delay, ms(100));

        let second = policy.on_call(t0 + ms(40), "b");
        assert!(second.invoke.is_none());
        assert_eq!(second.arm.unwrap().delay, ms(100));
        assert!(policy.is_pending());
        assert!(policy.has_buffered());
    }
}
