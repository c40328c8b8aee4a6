//! Mock implementations for testing.
//!
//! This module provides test doubles for infrastructure adapters,
//! enabling deterministic testing of gate timing.

pub mod recorder;
pub mod scheduler;

pub use recorder::Recorder;
pub use scheduler::ManualScheduler;
