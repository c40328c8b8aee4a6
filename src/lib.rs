//! # callgate
//!
//! Debounce and throttle wrappers for ordinary Rust functions, with precise,
//! testable timing.
//!
//! A gate wraps a function `FnMut(A) -> R` and decides, call by call, whether
//! to run it now, later, or not at all. Time and timers come from an injected
//! [`Scheduler`], so the same gate runs on tokio in production and on a
//! virtual clock in tests.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use callgate::{Debounced, RateControl, Throttled};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! // Run the search only once typing pauses for 250ms, but at least once a second.
//! let search = Debounced::builder(Duration::from_millis(250))
//!     .with_max_wait(Duration::from_secs(1))
//!     .build(|query: String| println!("searching for {query}"))
//!     .unwrap();
//!
//! // Report scroll position at most every 100ms, including the final position.
//! let report = Throttled::builder(Duration::from_millis(100))
//!     .build(|offset: u32| println!("scrolled to {offset}"))
//!     .unwrap();
//!
//! search.call("ru".to_string());
//! search.call("rust".to_string());
//! report.call(120);
//!
//! // Force the pending search to run now.
//! search.flush();
//! # }
//! ```
//!
//! Without an explicit scheduler, builders use a [`TokioScheduler`] on the
//! current runtime (requires the default `async` feature). Outside a runtime,
//! pass a [`ThreadScheduler`] or any other [`Scheduler`] with
//! `.with_scheduler(...)`.
//!
//! ## Debounce
//!
//! - Every call buffers its arguments and restarts the quiet period.
//! - When the quiet period elapses, the function runs once with the latest
//!   arguments.
//! - `leading`: also run immediately on the first call of a burst.
//! - `max_wait`: under continuous calls, run at least once per `max_wait`.
//!   Without it, a steady stream of calls postpones the invocation forever.
//!
//! ## Throttle
//!
//! - At most one invocation per interval, measured from the previous
//!   invocation.
//! - `leading` (default on): a call that opens a window runs immediately.
//! - `trailing` (default on): the last call made inside a window runs when
//!   the window closes.
//!
//! ## Control
//!
//! Both wrappers implement [`RateControl`]:
//!
//! - `cancel()` discards the pending invocation. Idempotent.
//! - `flush()` runs the pending invocation now and returns its result, or
//!   [`Flush::NothingPending`].
//! - `pending()` reports whether a timer is armed.
//!
//! ## Deterministic Testing
//!
//! With the `test-helpers` feature, [`ManualScheduler`] provides virtual time:
//!
//! ```rust
//! use callgate::{ManualScheduler, Throttled};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let scheduler = ManualScheduler::new();
//! let gate = Throttled::builder(Duration::from_millis(100))
//!     .with_scheduler(Arc::new(scheduler.clone()))
//!     .build(|n: u32| n)
//!     .unwrap();
//!
//! assert_eq!(gate.call(1), Some(1)); // leading edge
//! assert_eq!(gate.call(2), None); // buffered for the trailing edge
//! scheduler.advance(Duration::from_millis(100));
//! assert_eq!(gate.metrics().invocations(), 2);
//! ```
//!
//! ## Concurrency
//!
//! Gates are `Send + Sync` and cheap to clone. State changes are serialized
//! by a lock, and the wrapped function runs outside it, after the state is
//! final. Invocations of one gate happen in the order their triggering events
//! were processed. The wrapped function must not call back into its own gate.

// Domain layer - pure timing logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    debounce::DebouncePolicy,
    options::{ConfigError, DebounceConfig, DebounceOptions, ThrottleConfig, ThrottleOptions},
    policy::{Arm, CallPolicy, Edge, Invocation, TimerToken, Transition},
    throttle::ThrottlePolicy,
};

pub use application::{
    control::{Flush, Handle, RateControl},
    debounce::{debounce, DebounceBuilder, Debounced},
    metrics::{Metrics, MetricsSnapshot},
    ports::{Clock, Scheduler, TimerId, TimerTask},
    throttle::{throttle, ThrottleBuilder, Throttled},
};

pub use infrastructure::{clock::SystemClock, thread_scheduler::ThreadScheduler};

#[cfg(feature = "async")]
pub use infrastructure::tokio_scheduler::TokioScheduler;

#[cfg(any(test, feature = "test-helpers"))]
pub use infrastructure::mocks::{ManualScheduler, Recorder};
