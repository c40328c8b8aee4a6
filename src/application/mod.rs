//! Application layer - binds policies to functions and timers.
//!
//! This layer coordinates the domain logic and manages the runtime behavior:
//! - Gate driver (applies policy transitions against a scheduler)
//! - Debounced and throttled wrappers with their builders
//! - Control handle (cancel, flush, pending)
//! - Per-gate metrics
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod control;
pub mod debounce;
pub(crate) mod gate;
pub mod metrics;
pub mod ports;
pub mod throttle;
