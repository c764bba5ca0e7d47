//! Application instances and task-scoped "current instance" access.
//!
//! An [`App`] bundles one [`Channel`] with one [`Loader`] — everything one
//! bot instance needs. The primary API is explicit: construct an `App`,
//! pass it (or its channel/loader) to whatever needs it.
//!
//! For embedders that host several isolated bot instances in one process,
//! this module also provides a task-scoped ambient accessor:
//!
//! ```rust,ignore
//! let app = App::new();
//! context::scope(Arc::clone(&app), async {
//!     // context::current() returns `app` here and in everything awaited
//!     // from this future — but not in sibling scopes.
//! }).await;
//! ```
//!
//! Scoping follows Tokio's task-local model: a value installed with
//! [`scope`] is visible to the wrapped future and its descendants, and
//! invisible to siblings. [`current`] never returns a foreign scope's
//! instance. [`current_or_default`] backs the lazy default path: when no
//! scope is installed it creates (once) and returns a process-wide default
//! instance instead of failing.

use std::sync::{Arc, OnceLock};

use thiserror::Error;
use tokio::task_local;

use crate::channel::Channel;
use crate::module::Loader;

/// Errors surfaced by the ambient-context accessors.
#[derive(Debug, Error)]
pub enum ContextError {
    /// `current()` was called outside any [`scope`] and before a process
    /// default was created.
    #[error("no active application context")]
    NoActiveContext,
}

// ============================================================================
// App
// ============================================================================

/// One bot instance: a dispatch channel plus its module loader.
#[derive(Debug)]
pub struct App {
    channel: Arc<Channel>,
    loader: Loader,
}

impl App {
    /// Creates a fresh instance with an empty channel and loader.
    pub fn new() -> Arc<Self> {
        let channel = Arc::new(Channel::new());
        let loader = Loader::new(Arc::clone(&channel));
        Arc::new(Self { channel, loader })
    }

    /// The instance's dispatch channel.
    pub fn channel(&self) -> &Arc<Channel> {
        &self.channel
    }

    /// The instance's module loader.
    pub fn loader(&self) -> &Loader {
        &self.loader
    }
}

// ============================================================================
// Task-scoped current instance
// ============================================================================

task_local! {
    static CURRENT: Arc<App>;
}

static DEFAULT: OnceLock<Arc<App>> = OnceLock::new();

/// Runs `fut` with `app` installed as the current instance.
///
/// The installation covers `fut` and everything it awaits. Tasks spawned
/// with `tokio::spawn` do **not** inherit the scope; re-wrap their futures
/// explicitly when they need it.
pub async fn scope<F>(app: Arc<App>, fut: F) -> F::Output
where
    F: Future,
{
    CURRENT.scope(app, fut).await
}

/// Returns the current instance.
///
/// Resolution order: the innermost task-local [`scope`], then the process
/// default (if one was ever created). Fails with
/// [`ContextError::NoActiveContext`] when neither exists.
pub fn current() -> Result<Arc<App>, ContextError> {
    CURRENT
        .try_with(Arc::clone)
        .ok()
        .or_else(|| DEFAULT.get().cloned())
        .ok_or(ContextError::NoActiveContext)
}

/// Returns the current instance, creating and installing a process-wide
/// default when none exists.
///
/// This is the lazy default-instance path: embedders that only ever run one
/// bot can skip [`scope`] entirely and share the default.
pub fn current_or_default() -> Arc<App> {
    match current() {
        Ok(app) => app,
        Err(_) => Arc::clone(DEFAULT.get_or_init(App::new)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scoped_instances_are_isolated() {
        let app_a = App::new();
        let app_b = App::new();

        let a = Arc::clone(&app_a);
        let b = Arc::clone(&app_b);

        let (got_a, got_b) = tokio::join!(
            scope(Arc::clone(&app_a), async move {
                tokio::task::yield_now().await;
                Arc::ptr_eq(&current().unwrap(), &a)
            }),
            scope(Arc::clone(&app_b), async move {
                tokio::task::yield_now().await;
                Arc::ptr_eq(&current().unwrap(), &b)
            }),
        );

        assert!(got_a);
        assert!(got_b);
    }

    #[tokio::test]
    async fn nested_scope_shadows_outer() {
        let outer = App::new();
        let inner = App::new();

        let inner2 = Arc::clone(&inner);
        let outer2 = Arc::clone(&outer);
        scope(Arc::clone(&outer), async move {
            scope(Arc::clone(&inner2), async {
                assert!(Arc::ptr_eq(&current().unwrap(), &inner2));
            })
            .await;
            assert!(Arc::ptr_eq(&current().unwrap(), &outer2));
        })
        .await;
    }

    #[tokio::test]
    async fn default_instance_is_created_once() {
        // Outside any scope: either a previous test created the default or
        // we create it now; both calls must agree.
        let first = current_or_default();
        let second = current_or_default();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
