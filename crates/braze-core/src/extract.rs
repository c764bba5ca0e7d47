//! Extractor system for the Braze framework.
//!
//! This module provides the [`FromRadio`] trait and built-in implementations
//! that enable Braze's parameter injection system. Handler functions declare
//! what data they need through their parameter types, and the dispatch bus
//! provides it from the current [`RadioContext`].
//!
//! # Built-in extractors
//!
//! | Parameter type | Provides |
//! |----------------|----------|
//! | [`EventContext<E>`] | the dispatched event, downcast to `E` |
//! | [`BoxedEvent`] | the type-erased event itself |
//! | [`Arg<T>`] | the first radio argument of type `T` |
//! | [`TraceId`] | the trace identifier of this dispatch cycle |
//! | `Option<X>` | any of the above, never failing |
//!
//! # Error Handling
//!
//! If an extractor fails (returns `Err`), the handler is skipped and dispatch
//! continues with the next handler. Optional extractors never fail.

use std::any::Any;

use crate::error::{ExtractError, ExtractResult};
use crate::event::{BoxedEvent, Event, TraceId};
use crate::radio::RadioContext;

/// A trait for types that can be extracted from a [`RadioContext`].
///
/// This is the core abstraction that enables the Braze framework's parameter
/// injection system: any type implementing it can be used directly as a
/// handler function parameter. It is also the plugin ABI — modules rely on
/// the extraction rules staying stable across releases.
pub trait FromRadio: Sized {
    /// Attempts to extract this type from the given context.
    fn from_radio(ctx: &RadioContext) -> ExtractResult<Self>;
}

/// Blanket implementation for extracting the event as a clone of
/// [`BoxedEvent`].
///
/// Useful when a handler wants to inspect any event without committing to a
/// concrete type at compile time.
impl FromRadio for BoxedEvent {
    fn from_radio(ctx: &RadioContext) -> ExtractResult<Self> {
        Ok(ctx.event().clone())
    }
}

/// Implementation for extracting the dispatch cycle's [`TraceId`].
impl FromRadio for TraceId {
    fn from_radio(ctx: &RadioContext) -> ExtractResult<Self> {
        Ok(ctx.trace())
    }
}

/// Implementation for `Option<T>` where `T: FromRadio`.
///
/// This allows handlers to have optional parameters that may or may not
/// be extractable from the context.
impl<T: FromRadio> FromRadio for Option<T> {
    fn from_radio(ctx: &RadioContext) -> ExtractResult<Self> {
        Ok(T::from_radio(ctx).ok())
    }
}

// ============================================================================
// EventContext — typed event extractor
// ============================================================================

/// Context wrapper that provides access to the dispatched event as a
/// concrete type.
///
/// This is the primary way handlers receive events. Use `Deref` to access
/// fields directly on the wrapped type.
///
/// ```rust,ignore
/// async fn on_message(event: EventContext<GroupMessage>) {
///     println!("chat {}: {:?}", event.chat_id, event.text);
/// }
/// ```
#[derive(Clone)]
pub struct EventContext<E: Event + Clone> {
    data: E,
}

impl<E: Event + Clone> EventContext<E> {
    fn new(data: E) -> Self {
        Self { data }
    }

    /// Consumes the wrapper, returning the event value.
    pub fn into_inner(self) -> E {
        self.data
    }
}

impl<E: Event + Clone> std::ops::Deref for EventContext<E> {
    type Target = E;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<E: Event + Clone + std::fmt::Debug> std::fmt::Debug for EventContext<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventContext")
            .field("data", &self.data)
            .finish()
    }
}

impl<E: Event + Clone> FromRadio for EventContext<E> {
    fn from_radio(ctx: &RadioContext) -> ExtractResult<Self> {
        ctx.event()
            .downcast_ref::<E>()
            .cloned()
            .map(EventContext::new)
            .ok_or_else(|| ExtractError::EventTypeMismatch {
                expected: std::any::type_name::<E>(),
                got: ctx.event().event_name(),
            })
    }
}

// ============================================================================
// Arg — typed radio-argument extractor
// ============================================================================

/// Extracts the first radio argument whose concrete type is `T`.
///
/// Radio arguments are the extra values the caller passed alongside the
/// event (see [`Args`](crate::radio::Args)). The match is exact on the
/// runtime type; supply `Option<Arg<T>>` when the argument may be absent.
///
/// ```rust,ignore
/// async fn on_message(event: EventContext<GroupMessage>, retries: Arg<u32>) {
///     println!("retry budget: {}", *retries);
/// }
/// ```
pub struct Arg<T>(pub T);

impl<T> std::ops::Deref for Arg<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> Arg<T> {
    /// Consumes the wrapper, returning the argument value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Any + Send + Sync + Clone> FromRadio for Arg<T> {
    fn from_radio(ctx: &RadioContext) -> ExtractResult<Self> {
        ctx.args()
            .get::<T>()
            .map(Arg)
            .ok_or(ExtractError::ArgNotFound(std::any::type_name::<T>()))
    }
}
