//! One-shot, predicate-filtered event subscriptions.
//!
//! A [`Waiter`] lets a handler (or any task) block until a *specific*
//! follow-up event arrives — e.g. "the next message from this user in this
//! chat". The dispatch bus resolves the waiter when a matching event is
//! radioed; the caller bounds the wait with an explicit timeout.
//!
//! ```rust,ignore
//! let waiter = channel.wait_for::<GroupMessage>(move |m| m.chat_id == chat);
//! match waiter.wait(Duration::from_secs(30)).await {
//!     Ok(reply) => { /* got the follow-up */ }
//!     Err(WaitError::Timeout) => { /* give up */ }
//!     Err(WaitError::Closed) => { /* bus dropped */ }
//! }
//! ```

use std::marker::PhantomData;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot;

use crate::event::{BoxedEvent, Event};

/// Errors surfaced by [`Waiter::wait`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaitError {
    /// No matching event arrived within the timeout.
    #[error("timed out waiting for a matching event")]
    Timeout,

    /// The dispatch bus was dropped before a matching event arrived.
    #[error("dispatch bus dropped before a matching event arrived")]
    Closed,
}

/// A pending one-shot subscription returned by
/// [`Channel::wait_for`](crate::channel::Channel::wait_for).
///
/// Dropping the waiter cancels the subscription; the bus prunes the dead
/// slot on its next dispatch.
pub struct Waiter<E> {
    rx: oneshot::Receiver<BoxedEvent>,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Event + Clone> Waiter<E> {
    pub(crate) fn new(rx: oneshot::Receiver<BoxedEvent>) -> Self {
        Self {
            rx,
            _marker: PhantomData,
        }
    }

    /// Waits until a matching event is radioed, or until `timeout` elapses.
    pub async fn wait(self, timeout: Duration) -> Result<E, WaitError> {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(event)) => event.downcast_ref::<E>().cloned().ok_or(WaitError::Closed),
            Ok(Err(_)) => Err(WaitError::Closed),
            Err(_) => Err(WaitError::Timeout),
        }
    }
}

/// A registered waiter slot owned by the dispatch bus.
pub(crate) struct WaiterSlot {
    pub(crate) key: std::any::TypeId,
    pub(crate) predicate: Box<dyn Fn(&BoxedEvent) -> bool + Send + Sync>,
    pub(crate) tx: Option<oneshot::Sender<BoxedEvent>>,
}

impl WaiterSlot {
    /// Returns `true` if this slot can never fire again and may be pruned.
    pub(crate) fn is_dead(&self) -> bool {
        match &self.tx {
            Some(tx) => tx.is_closed(),
            None => true,
        }
    }
}
