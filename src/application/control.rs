//! Control handle shared by every gate.

use std::fmt;
use std::sync::Arc;

/// Result of [`RateControl::flush`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flush<R> {
    /// The pending invocation ran; carries its return value
    Invoked(R),
    /// No invocation was pending
    NothingPending,
}

impl<R> Flush<R> {
    /// Check if the flush ran the wrapped function.
    pub fn is_invoked(&self) -> bool {
        matches!(self, Flush::Invoked(_))
    }

    /// Check if there was nothing to flush.
    pub fn is_nothing_pending(&self) -> bool {
        matches!(self, Flush::NothingPending)
    }

    /// The invocation's return value, if the flush ran one.
    pub fn into_option(self) -> Option<R> {
        match self {
            Flush::Invoked(value) => Some(value),
            Flush::NothingPending => None,
        }
    }
}

impl<R> From<Option<R>> for Flush<R> {
    fn from(value: Option<R>) -> Self {
        value.map_or(Flush::NothingPending, Flush::Invoked)
    }
}

/// Cancel, flush and inspect a gate's pending invocation.
///
/// Implemented by [`Debounced`](crate::Debounced), [`Throttled`](crate::Throttled)
/// and the type-erased [`Handle`].
pub trait RateControl: Send + Sync {
    /// Return type of the wrapped function.
    type Output;

    /// Discard any pending invocation without running it.
    ///
    /// Safe to call at any time and any number of times.
    fn cancel(&self);

    /// Run the pending invocation now, if there is one.
    fn flush(&self) -> Flush<Self::Output>;

    /// Whether a timer is currently armed.
    fn pending(&self) -> bool;
}

/// Type-erased control handle for a gate.
///
/// Lets code cancel or flush a gate without knowing its argument type or
/// being able to call it. Holding a handle keeps the gate alive.
pub struct Handle<R> {
    control: Arc<dyn RateControl<Output = R>>,
}

impl<R> Handle<R> {
    pub(crate) fn new(control: Arc<dyn RateControl<Output = R>>) -> Self {
        Self { control }
    }
}

impl<R> Clone for Handle<R> {
    fn clone(&self) -> Self {
        Self {
            control: Arc::clone(&self.control),
        }
    }
}

impl<R> fmt::Debug for Handle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("pending", &self.control.pending())
            .finish()
    }
}

impl<R> RateControl for Handle<R> {
    type Output = R;

    fn cancel(&self) {
        self.control.cancel();
    }

    fn flush(&self) -> Flush<R> {
        self.control.flush()
    }

    fn pending(&self) -> bool {
        self.control.pending()
    }
}
