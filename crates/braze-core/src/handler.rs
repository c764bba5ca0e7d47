//! Handler system for the Braze framework.
//!
//! This module defines the [`Handler`] trait that forms the foundation of
//! event handling in Braze. Handlers are plain async functions; the trait is
//! implemented via blanket implementations for functions with different
//! arities, similar to Axum's handler system.
//!
//! # Example
//!
//! ```rust,ignore
//! // Simple handler with no parameters
//! async fn simple_handler() {
//!     println!("Handling event");
//! }
//!
//! // Handler with extractors
//! async fn message_handler(event: EventContext<GroupMessage>, trace: TraceId) {
//!     println!("[{trace}] {:?}", event.text);
//! }
//!
//! // Fallible handler — the error is logged, dispatch continues
//! async fn risky_handler(event: BoxedEvent) -> anyhow::Result<()> {
//!     Err(anyhow::anyhow!("boom"))
//! }
//! ```
//!
//! Synchronous and asynchronous work are modelled uniformly: a handler that
//! never awaits is just an async function whose future completes on first
//! poll.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::{error, trace};

use crate::extract::FromRadio;
use crate::radio::RadioContext;

// ============================================================================
// HandleResponse - Handle handler return values
// ============================================================================

/// A trait for types that can be returned from handlers.
#[async_trait]
pub trait HandleResponse: Send {
    /// Convert this value into a response.
    async fn into_response(self, ctx: Arc<RadioContext>);
}

/// Implementation for `()` - no response needed.
#[async_trait]
impl HandleResponse for () {
    async fn into_response(self, _ctx: Arc<RadioContext>) {
        // No action needed
    }
}

/// Implementation for `Option<T>` where T implements HandleResponse.
///
/// On Some, the inner value's response is handled. On None, no action is taken.
#[async_trait]
impl<T: HandleResponse> HandleResponse for Option<T> {
    async fn into_response(self, ctx: Arc<RadioContext>) {
        if let Some(t) = self {
            t.into_response(ctx).await;
        }
    }
}

/// Implementation for `Result<T, E>` where T implements HandleResponse.
///
/// On Ok, the inner value's response is handled. On Err, the error is logged
/// with the event that triggered the handler; dispatch is never aborted by a
/// failing handler.
#[async_trait]
impl<T: HandleResponse, E: std::fmt::Display + Send> HandleResponse for Result<T, E> {
    async fn into_response(self, ctx: Arc<RadioContext>) {
        match self {
            Ok(t) => t.into_response(ctx).await,
            Err(e) => {
                error!(
                    event = ctx.event().event_name(),
                    trace = %ctx.trace(),
                    error = %e,
                    "Handler returned an error"
                );
            }
        }
    }
}

// ============================================================================
// Handler Trait
// ============================================================================

/// The core trait for event handlers in the Braze framework.
///
/// # Blanket Implementation
///
/// This trait is automatically implemented for async functions that:
/// - Take 0-8 parameters that implement [`FromRadio`]
/// - Return a type that implements [`HandleResponse`]
///
/// If any parameter fails to extract, the handler is skipped for that
/// dispatch (logged at trace level). Use `Option<T>` parameters for values
/// that may legitimately be absent.
#[async_trait]
pub trait Handler<T>: Clone + Send + Sync + 'static {
    /// Call the handler with the given context.
    async fn call(self, ctx: Arc<RadioContext>);
}

// ============================================================================
// BoxedHandler - Type-erased handler stored in the registry
// ============================================================================

/// A type-erased handler that can be stored in collections.
///
/// Internally a closure that captures the original handler and calls it
/// with a cloned copy on each invocation.
pub type BoxedHandler = Arc<dyn Fn(Arc<RadioContext>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Convert a handler function into a boxed handler.
pub fn into_handler<F, T>(f: F) -> BoxedHandler
where
    F: Handler<T> + Send + Sync + 'static,
    T: 'static,
{
    Arc::new(move |ctx| f.clone().call(ctx))
}

// ============================================================================
// Handler implementations for functions (Axum-style)
// ============================================================================

/// Macro to generate Handler implementations for functions with different arities.
macro_rules! impl_handler {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case)]
        #[async_trait]
        impl<F, Fut, Res, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Res> + Send + 'static,
            Res: HandleResponse + 'static,
            $( $ty: FromRadio + Send + 'static, )*
        {
            async fn call(self, ctx: Arc<RadioContext>) {
                $(
                    let $ty = match $ty::from_radio(&ctx) {
                        Ok(value) => value,
                        Err(e) => {
                            trace!(
                                event = ctx.event().event_name(),
                                error = %e,
                                "Extraction failed, skipping handler"
                            );
                            return;
                        }
                    };
                )*

                let res = (self)($($ty,)*).await;
                res.into_response(ctx).await;
            }
        }
    };
}

// Generate implementations for 0-8 parameters
impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{BoxedEvent, LoadComplete, TraceId};
    use crate::extract::{Arg, EventContext};
    use crate::radio::Args;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx(args: Args) -> Arc<RadioContext> {
        Arc::new(RadioContext::new(
            BoxedEvent::new(LoadComplete {
                module: "m".into(),
            }),
            args,
            TraceId::new(),
        ))
    }

    #[tokio::test]
    async fn zero_arity_handler_runs() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        let handler = into_handler(move || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        (handler)(ctx(Args::new())).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn extractors_are_injected() {
        let seen = Arc::new(parking_lot::Mutex::new(None));
        let s = Arc::clone(&seen);
        let handler = into_handler(
            move |event: EventContext<LoadComplete>, tag: Arg<&'static str>| {
                let s = Arc::clone(&s);
                async move {
                    *s.lock() = Some((event.module.clone(), tag.0));
                }
            },
        );

        (handler)(ctx(Args::new().with("tag"))).await;
        assert_eq!(seen.lock().clone(), Some(("m".to_string(), "tag")));
    }

    #[tokio::test]
    async fn failed_extraction_skips_handler() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        let handler = into_handler(move |_missing: Arg<u128>| {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        (handler)(ctx(Args::new())).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn error_results_are_swallowed() {
        let handler = into_handler(|| async { Err::<(), &str>("boom") });
        // Must not panic or propagate.
        (handler)(ctx(Args::new())).await;
    }
}
