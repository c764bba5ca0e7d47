//! Dispatch-cycle context and the typed-argument bag.
//!
//! One [`RadioContext`] is created per `radio` call and shared (via `Arc`)
//! with every handler invoked during that dispatch. It carries the event,
//! the caller-supplied [`Args`] bag, and the [`TraceId`] of the cycle.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::event::{BoxedEvent, TraceId};

// ============================================================================
// Args — the typed-argument bag
// ============================================================================

/// Extra typed values supplied to a `radio` call.
///
/// Handlers pull values out of the bag by declaring an
/// [`Arg<T>`](crate::extract::Arg) parameter; lookup matches on the value's
/// concrete type. When two values of the same type are present, the one
/// inserted **first** wins — insertion order is the deterministic tie-break.
///
/// ```rust,ignore
/// channel.radio(event, Args::new().with(reply_sink).with(42u32)).await;
/// ```
#[derive(Default, Clone)]
pub struct Args {
    values: Vec<Arc<dyn Any + Send + Sync>>,
}

impl Args {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Adds a value (builder form).
    pub fn with<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    /// Adds a value in place.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.values.push(Arc::new(value));
    }

    /// Returns a clone of the first value whose concrete type is `T`.
    pub fn get<T: Any + Send + Sync + Clone>(&self) -> Option<T> {
        self.values
            .iter()
            .find_map(|v| v.downcast_ref::<T>())
            .cloned()
    }

    /// Number of values in the bag.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the bag holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args").field("len", &self.len()).finish()
    }
}

// ============================================================================
// RadioContext
// ============================================================================

/// The context object shared with every handler during one dispatch cycle.
#[derive(Debug)]
pub struct RadioContext {
    event: BoxedEvent,
    args: Args,
    trace: TraceId,
}

impl RadioContext {
    pub(crate) fn new(event: BoxedEvent, args: Args, trace: TraceId) -> Self {
        Self { event, args, trace }
    }

    /// Returns a reference to the dispatched event.
    pub fn event(&self) -> &BoxedEvent {
        &self.event
    }

    /// Returns the caller-supplied argument bag.
    pub fn args(&self) -> &Args {
        &self.args
    }

    /// Returns the trace identifier of this dispatch cycle.
    pub fn trace(&self) -> TraceId {
        self.trace
    }
}
