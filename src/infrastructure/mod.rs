//! Infrastructure layer - external adapters and integrations.
//!
//! This layer provides adapters for:
//! - Clock abstraction (system time vs virtual time)
//! - Timer scheduling (tokio tasks, a dedicated thread, virtual time)

pub mod clock;
pub mod thread_scheduler;

#[cfg(feature = "async")]
pub mod tokio_scheduler;

/// Mock implementations for testing.
///
/// This module is only available when the `test-helpers` feature is enabled,
/// or during test builds. It provides a virtual-time scheduler and an
/// invocation recorder for testing gate timing without waiting.
///
/// To use these mocks in integration tests, add to your `Cargo.toml`:
/// ```toml
/// [dev-dependencies]
/// callgate = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;
