//! Event system for the Braze framework.
//!
//! This module provides the core event infrastructure:
//!
//! - [`Event`] - Base trait for all events
//! - [`BoxedEvent`] - Type-erased event container with runtime downcasting
//! - [`TraceId`] - Correlation identifier threading one inbound event through
//!   its full processing pipeline
//! - [`LoadComplete`] / [`RadioComplete`] - synthetic lifecycle events raised
//!   by the framework itself
//!
//! # Event Identity
//!
//! An event type's identity **is** its concrete Rust type: handlers register
//! against `TypeId::of::<E>()` and the dispatch bus routes by
//! [`BoxedEvent::key`]. There is no separate string registry to keep in sync
//! with the type system.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

// ============================================================================
// Core Event Trait
// ============================================================================

/// The base trait for all events in the Braze framework.
///
/// Events are type-erased using `dyn Event` and can be downcast to concrete
/// types using `as_any()`. Anything `Send + Sync + 'static` with a name can
/// be an event; implementations are intentionally mechanical:
///
/// ```rust,ignore
/// #[derive(Debug, Clone)]
/// struct Ping { pub payload: String }
///
/// impl Event for Ping {
///     fn event_name(&self) -> &'static str { "ping" }
///     fn as_any(&self) -> &dyn Any { self }
/// }
/// ```
pub trait Event: Any + Send + Sync + 'static {
    /// Returns the human-readable name of this event type.
    fn event_name(&self) -> &'static str;

    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

// ============================================================================
// Boxed Event
// ============================================================================

/// A type-erased container for events that supports runtime downcasting.
///
/// `BoxedEvent` wraps any type implementing [`Event`] in an `Arc`, allowing
/// it to be passed through the dispatch bus without knowing its concrete
/// type. Cloning is cheap (one atomic increment).
#[derive(Clone)]
pub struct BoxedEvent {
    inner: Arc<dyn Event>,
}

impl BoxedEvent {
    /// Creates a new `BoxedEvent` from any type implementing `Event`.
    pub fn new<E: Event>(event: E) -> Self {
        Self {
            inner: Arc::new(event),
        }
    }

    /// Returns the dispatch key of the wrapped event: the `TypeId` of its
    /// concrete type.
    pub fn key(&self) -> TypeId {
        self.inner.as_any().type_id()
    }

    /// Attempts to downcast to a concrete event type.
    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        self.inner.as_any().downcast_ref()
    }

    /// Returns `true` if the wrapped event is of type `E`.
    pub fn is<E: Event>(&self) -> bool {
        self.key() == TypeId::of::<E>()
    }

    /// Returns the inner `Arc<dyn Event>`.
    pub fn inner(&self) -> &Arc<dyn Event> {
        &self.inner
    }
}

impl std::ops::Deref for BoxedEvent {
    type Target = dyn Event;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl fmt::Debug for BoxedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedEvent")
            .field("event_name", &self.event_name())
            .finish()
    }
}

// ============================================================================
// Trace Identifier
// ============================================================================

/// Correlation identifier for one dispatch pipeline run.
///
/// The same `TraceId` is attached to a decoded event, its raw-payload shadow,
/// and the [`RadioComplete`] signal that closes the cycle, so completion
/// listeners can tell which inbound event just finished processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Generates a fresh random trace identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// ============================================================================
// Synthetic Lifecycle Events
// ============================================================================

/// Radioed by the module loader after a module's registrations are installed.
#[derive(Debug, Clone)]
pub struct LoadComplete {
    /// Name of the module that just finished loading.
    pub module: String,
}

impl Event for LoadComplete {
    fn event_name(&self) -> &'static str {
        "load_complete"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Radioed after the processing pipeline finishes phase-1 dispatch of one
/// inbound event.
///
/// `handled` counts the handler invocations that ran during phase 1; a
/// completion listener can use `handled == 0` to drive fallback behaviour
/// ("nothing replied to this message").
#[derive(Debug, Clone)]
pub struct RadioComplete {
    /// Trace of the inbound event this completion belongs to.
    pub trace: TraceId,
    /// Number of handler invocations during phase 1.
    pub handled: usize,
}

impl Event for RadioComplete {
    fn event_name(&self) -> &'static str {
        "radio_complete"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Ping {
        payload: String,
    }

    impl Event for Ping {
        fn event_name(&self) -> &'static str {
            "ping"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn boxed_event_downcasts_to_concrete_type() {
        let boxed = BoxedEvent::new(Ping {
            payload: "hi".into(),
        });

        assert!(boxed.is::<Ping>());
        assert!(!boxed.is::<LoadComplete>());
        assert_eq!(boxed.downcast_ref::<Ping>().unwrap().payload, "hi");
        assert!(boxed.downcast_ref::<RadioComplete>().is_none());
    }

    #[test]
    fn key_is_concrete_type_id() {
        let boxed = BoxedEvent::new(Ping {
            payload: String::new(),
        });
        assert_eq!(boxed.key(), TypeId::of::<Ping>());
    }

    #[test]
    fn trace_ids_are_unique() {
        assert_ne!(TraceId::new(), TraceId::new());
    }
}
