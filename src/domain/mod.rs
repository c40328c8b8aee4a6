//! Domain layer - pure call-rate-control logic with no external dependencies.
//!
//! This layer contains the state machines that decide when a wrapped function
//! runs:
//! - Debounce policy (quiet period, leading edge, max-wait bound)
//! - Throttle policy (minimum spacing, leading and trailing edges)
//! - Validated options and configuration-file forms
//!
//! Policies never read a clock or schedule a timer themselves. They are fed
//! instants and timer tokens and answer with transitions, which keeps every
//! timing rule testable without waiting.

pub mod debounce;
pub mod options;
pub mod policy;
pub mod throttle;
