//! Gate policies and the transitions they produce.
//!
//! A policy is a pure state machine. It never reads a clock or touches a timer;
//! it is told the current instant and answers with a [`Transition`] describing
//! what the caller must do: which timer to cancel, which timer to arm and
//! which invocation to perform. The application layer carries those out.

use std::time::{Duration, Instant};

/// Identifies one armed timer of one policy.
///
/// Tokens are never reused within a policy, so a timer that fires after it
/// was cancelled or replaced can be recognised as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

impl TimerToken {
    /// Raw token value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Monotonic source of [`TimerToken`]s.
#[derive(Debug, Clone, Default)]
pub(crate) struct TokenSource {
    next: u64,
}

impl TokenSource {
    pub(crate) fn next_token(&mut self) -> TimerToken {
        self.next = self.next.wrapping_add(1);
        TimerToken(self.next)
    }
}

/// Which path caused an invocation of the wrapped function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Immediate invocation at the start of a burst or window
    Leading,
    /// Deferred invocation once the quiet period or window elapsed
    Trailing,
    /// Debounce invocation forced by the max-wait bound
    MaxWait,
    /// Invocation forced through the control handle
    Flush,
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Edge::Leading => "leading",
            Edge::Trailing => "trailing",
            Edge::MaxWait => "max_wait",
            Edge::Flush => "flush",
        };
        f.write_str(name)
    }
}

/// An invocation the caller must perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation<A> {
    /// Arguments to hand to the wrapped function
    pub args: A,
    /// Why the invocation happens
    pub edge: Edge,
}

/// A timer the caller must arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arm {
    /// Token to report back through [`CallPolicy::on_timer`]
    pub token: TimerToken,
    /// Delay from the instant the transition was computed
    pub delay: Duration,
}

/// Outcome of feeding one event to a policy.
///
/// The caller applies the fields in declaration order: cancel, arm, invoke.
/// Policy state has already been updated when the transition is returned, so
/// the invocation can run after the policy lock is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<A> {
    /// Timer to cancel before anything else
    pub cancel: Option<TimerToken>,
    /// Timer to arm
    pub arm: Option<Arm>,
    /// Invocation to perform
    pub invoke: Option<Invocation<A>>,
    /// The call was discarded without being buffered
    pub dropped: bool,
}

impl<A> Transition<A> {
    /// Nothing to do.
    pub fn none() -> Self {
        Self {
            cancel: None,
            arm: None,
            invoke: None,
            dropped: false,
        }
    }

    /// Check whether the transition asks for nothing at all.
    pub fn is_noop(&self) -> bool {
        self.cancel.is_none() && self.arm.is_none() && self.invoke.is_none()
    }

    pub(crate) fn cancelling(mut self, token: Option<TimerToken>) -> Self {
        self.cancel = token;
        self
    }

    pub(crate) fn arming(mut self, arm: Arm) -> Self {
        self.arm = Some(arm);
        self
    }

    pub(crate) fn invoking(mut self, args: Option<A>, edge: Edge) -> Self {
        self.invoke = args.map(|args| Invocation { args, edge });
        self
    }

    pub(crate) fn dropping(mut self) -> Self {
        self.dropped = true;
        self
    }
}

/// State machine deciding when a wrapped function runs.
///
/// Implementations own all per-gate state: the pending timer token, buffered
/// arguments and whatever timestamps they need. At most one timer is pending
/// per policy at any time.
pub trait CallPolicy<A>: Send {
    /// A caller invoked the wrapper with `args` at `now`.
    fn on_call(&mut self, now: Instant, args: A) -> Transition<A>;

    /// The timer identified by `token` fired at `now`.
    ///
    /// Stale tokens (cancelled or replaced timers) yield a no-op transition.
    fn on_timer(&mut self, now: Instant, token: TimerToken) -> Transition<A>;

    /// Force the pending invocation, if any, to happen now.
    fn flush(&mut self, now: Instant) -> Transition<A>;

    /// Drop the pending invocation and reset the policy.
    fn cancel(&mut self) -> Transition<A>;

    /// Whether a timer is currently armed.
    fn is_pending(&self) -> bool;
}
