//! The dispatch bus ("channel") of the Braze framework.
//!
//! [`Channel`] owns the mapping from event-type key to registered handlers
//! and is responsible for:
//!
//! - Receiving events via [`radio`](Channel::radio) /
//!   [`radio_detached`](Channel::radio_detached)
//! - Resolving pending [`Waiter`]s before handler invocation
//! - Invoking handlers in deterministic registration order
//! - Isolating handlers from one another's failures
//!
//! # Registration layout
//!
//! For each event-type key the channel keeps one bucket per registering
//! module, in module-registration order; within a bucket, handlers keep
//! their own registration order. Dispatch flattens this into
//! module-order-then-handler-order, which is the ordering guarantee modules
//! rely on.
//!
//! # Locking
//!
//! The registry is mutated only on module load/unload. Dispatch takes a
//! snapshot of the relevant handlers under a brief read lock and never holds
//! any lock across an await point, so load/unload can't observe a torn
//! dispatch and dispatches can interleave freely with each other.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{Level, debug, span};

use crate::event::{BoxedEvent, Event, TraceId};
use crate::handler::BoxedHandler;
use crate::radio::{Args, RadioContext};
use crate::waiter::{Waiter, WaiterSlot};

/// One module's handlers for a single event-type key.
struct ModuleBucket {
    module: Arc<str>,
    handlers: Vec<BoxedHandler>,
}

/// The central dispatch bus.
///
/// `Channel` is `Send + Sync`; wrap it in an `Arc` and share it freely.
/// Exactly one channel serves one bot instance (see
/// [`App`](crate::context::App)).
#[derive(Default)]
pub struct Channel {
    buckets: RwLock<HashMap<TypeId, Vec<ModuleBucket>>>,
    waiters: Mutex<Vec<WaiterSlot>>,
}

impl Channel {
    /// Creates a new, empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Registration (driven by the module loader) ──────────────────────────

    /// Registers `handler` for every key in `keys` under `module`.
    ///
    /// Registrations for the same event type are additive across modules; a
    /// module may register many handlers for the same key, and their order
    /// is preserved.
    pub(crate) fn register(&self, module: &Arc<str>, keys: &[TypeId], handler: BoxedHandler) {
        let mut buckets = self.buckets.write();
        for key in keys {
            let entry = buckets.entry(*key).or_default();
            match entry.iter_mut().find(|b| b.module == *module) {
                Some(bucket) => bucket.handlers.push(handler.clone()),
                None => entry.push(ModuleBucket {
                    module: Arc::clone(module),
                    handlers: vec![handler.clone()],
                }),
            }
        }
    }

    /// Removes every registration owned by `module`, across all event types.
    pub(crate) fn remove_module(&self, module: &str) {
        let mut buckets = self.buckets.write();
        for entry in buckets.values_mut() {
            entry.retain(|b| &*b.module != module);
        }
        buckets.retain(|_, entry| !entry.is_empty());
    }

    /// Returns the number of handlers currently registered for `E`.
    pub fn handler_count<E: Event>(&self) -> usize {
        self.buckets
            .read()
            .get(&TypeId::of::<E>())
            .map(|entry| entry.iter().map(|b| b.handlers.len()).sum())
            .unwrap_or(0)
    }

    /// Flattened snapshot of the handlers for one key, in dispatch order.
    fn snapshot(&self, key: TypeId) -> Vec<BoxedHandler> {
        self.buckets
            .read()
            .get(&key)
            .map(|entry| {
                entry
                    .iter()
                    .flat_map(|b| b.handlers.iter().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    // ─── Dispatch ────────────────────────────────────────────────────────────

    /// Dispatches `event`, awaiting every matching handler in registration
    /// order before returning.
    ///
    /// Handler failures are logged and never abort the chain. An event type
    /// with zero registrations is silently dropped. Returns the number of
    /// handlers invoked.
    pub async fn radio<E: Event>(&self, event: E, args: Args) -> usize {
        self.radio_traced(BoxedEvent::new(event), args, TraceId::new())
            .await
    }

    /// Serial dispatch of an already-boxed event under an explicit trace.
    ///
    /// The processing pipeline uses this form to thread one [`TraceId`]
    /// through a typed event, its raw shadow, and the completion signal.
    pub async fn radio_traced(&self, event: BoxedEvent, args: Args, trace: TraceId) -> usize {
        let span = span!(Level::DEBUG, "radio", event = event.event_name(), trace = %trace);
        let _enter = span.enter();

        self.resolve_waiters(&event);

        let handlers = self.snapshot(event.key());
        if handlers.is_empty() {
            debug!("No handlers registered, dropping event");
            return 0;
        }

        let ctx = Arc::new(RadioContext::new(event, args, trace));
        for handler in &handlers {
            (handler)(Arc::clone(&ctx)).await;
        }
        handlers.len()
    }

    /// Dispatches `event` fire-and-forget: every matching handler is spawned
    /// as its own task and `radio_detached` returns immediately.
    ///
    /// Failures (including panics) are confined to the spawned task. Returns
    /// the number of handlers scheduled. Must be called from within a Tokio
    /// runtime.
    pub fn radio_detached<E: Event>(&self, event: E, args: Args) -> usize {
        self.radio_detached_traced(BoxedEvent::new(event), args, TraceId::new())
    }

    /// Fire-and-forget dispatch of an already-boxed event under an explicit
    /// trace.
    pub fn radio_detached_traced(&self, event: BoxedEvent, args: Args, trace: TraceId) -> usize {
        self.resolve_waiters(&event);

        let handlers = self.snapshot(event.key());
        if handlers.is_empty() {
            return 0;
        }

        let ctx = Arc::new(RadioContext::new(event, args, trace));
        for handler in &handlers {
            tokio::spawn((handler)(Arc::clone(&ctx)));
        }
        handlers.len()
    }

    // ─── Waiters ─────────────────────────────────────────────────────────────

    /// Registers a one-shot subscription for the next `E` matching
    /// `predicate`.
    ///
    /// The waiter is resolved by whichever radio call next carries a
    /// matching event, before that event's handlers run. See
    /// [`Waiter::wait`] for the timeout-bounded receive side.
    pub fn wait_for<E, P>(&self, predicate: P) -> Waiter<E>
    where
        E: Event + Clone,
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.waiters.lock().push(WaiterSlot {
            key: TypeId::of::<E>(),
            predicate: Box::new(move |event: &BoxedEvent| {
                event.downcast_ref::<E>().map(&predicate).unwrap_or(false)
            }),
            tx: Some(tx),
        });
        Waiter::new(rx)
    }

    /// Fires and removes every waiter matching `event`; prunes dead slots.
    fn resolve_waiters(&self, event: &BoxedEvent) {
        let mut waiters = self.waiters.lock();
        if waiters.is_empty() {
            return;
        }
        let key = event.key();
        for slot in waiters.iter_mut() {
            if slot.key == key
                && slot.tx.is_some()
                && (slot.predicate)(event)
                && let Some(tx) = slot.tx.take()
            {
                // Receiver may have timed out and dropped; nothing to do then.
                let _ = tx.send(event.clone());
            }
        }
        waiters.retain(|slot| !slot.is_dead());
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("event_types", &self.buckets.read().len())
            .field("waiters", &self.waiters.lock().len())
            .finish()
    }
}
