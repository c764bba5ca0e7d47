//! Module definitions and the module loader.
//!
//! A *module* is an independently loadable unit owning a set of handler
//! registrations. Modules are declared statically — a name plus a setup
//! function the host registers with the [`Loader`] — and loaded explicitly;
//! there is no dynamic code loading.
//!
//! ```rust,ignore
//! fn setup(scope: &mut ModuleScope) {
//!     scope.on::<GroupMessage>().handler(reply_handler);
//!     scope.on::<ChatKick>().also::<GroupDisband>().handler(audit_handler);
//! }
//!
//! pub static GREETER: ModuleDef = ModuleDef {
//!     name: "greeter",
//!     setup,
//! };
//! ```
//!
//! # Lifecycle
//!
//! - [`Loader::load`] runs the module's setup exactly once, installs its
//!   registrations on the channel, and radios [`LoadComplete`]. Loading an
//!   already-loaded module is a no-op — registrations are never duplicated.
//! - [`Loader::unload`] removes the module's entry from **every** event-type
//!   bucket and purges it from the loaded-module table.

use std::any::TypeId;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info};

use crate::channel::Channel;
use crate::event::{Event, LoadComplete};
use crate::handler::{BoxedHandler, Handler, into_handler};
use crate::radio::Args;

// ============================================================================
// Errors
// ============================================================================

/// Errors surfaced by the module loader.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// No module definition with this name was registered with the loader.
    #[error("module not found: {0}")]
    ModuleNotFound(String),

    /// The module is not currently loaded.
    #[error("module not loaded: {0}")]
    ModuleNotLoaded(String),
}

/// Result type for loader operations.
pub type LoaderResult<T> = Result<T, LoaderError>;

// ============================================================================
// ModuleDef — static descriptor
// ============================================================================

/// A static, `Copy` descriptor that identifies a module and declares its
/// registrations.
///
/// The `setup` function is the module's registration interface: it receives
/// a [`ModuleScope`] and declares `(event-type set, handler)` pairs on it.
/// It runs once per load.
#[derive(Debug, Clone, Copy)]
pub struct ModuleDef {
    /// Module name — the identity used for load/unload and ownership
    /// tracking in the channel.
    pub name: &'static str,

    /// Registration function, invoked once when the module is loaded.
    pub setup: fn(&mut ModuleScope),
}

// ============================================================================
// ModuleScope — registration builder
// ============================================================================

/// The registration surface handed to a module's setup function.
///
/// The owning module is carried explicitly by the scope, so the channel
/// always knows which module a registration belongs to.
pub struct ModuleScope {
    module: Arc<str>,
    registrations: Vec<(Vec<TypeId>, BoxedHandler)>,
}

impl ModuleScope {
    fn new(module: Arc<str>) -> Self {
        Self {
            module,
            registrations: Vec::new(),
        }
    }

    /// Name of the module this scope registers for.
    pub fn module_name(&self) -> &str {
        &self.module
    }

    /// Starts a registration for event type `E`.
    ///
    /// Chain [`also`](Registration::also) to widen the key set and
    /// [`handler`](Registration::handler) (repeatable) to attach handlers.
    pub fn on<E: Event>(&mut self) -> Registration<'_> {
        Registration {
            scope: self,
            keys: vec![TypeId::of::<E>()],
        }
    }
}

/// An in-progress registration: a set of event-type keys awaiting handlers.
pub struct Registration<'a> {
    scope: &'a mut ModuleScope,
    keys: Vec<TypeId>,
}

impl Registration<'_> {
    /// Adds another event type to this registration's key set.
    pub fn also<E: Event>(mut self) -> Self {
        let key = TypeId::of::<E>();
        if !self.keys.contains(&key) {
            self.keys.push(key);
        }
        self
    }

    /// Attaches a handler under every key in the set.
    ///
    /// May be called repeatedly; handlers keep their attachment order.
    pub fn handler<F, T>(self, f: F) -> Self
    where
        F: Handler<T> + Send + Sync + 'static,
        T: 'static,
    {
        let keys = self.keys.clone();
        self.scope.registrations.push((keys, into_handler(f)));
        self
    }
}

// ============================================================================
// Loader
// ============================================================================

/// Loads and unloads modules, keeping the channel's per-module registration
/// index consistent.
///
/// The loader tracks two tables: the *known* module definitions (added via
/// [`add_def`](Self::add_def)) and the *loaded* modules. Load/unload takes
/// exclusive access to the registry; in-flight dispatches observe either the
/// pre- or post-mutation snapshot.
pub struct Loader {
    channel: Arc<Channel>,
    defs: Mutex<Vec<ModuleDef>>,
    loaded: Mutex<Vec<Arc<str>>>,
}

impl Loader {
    /// Creates a loader bound to `channel`.
    pub fn new(channel: Arc<Channel>) -> Self {
        Self {
            channel,
            defs: Mutex::new(Vec::new()),
            loaded: Mutex::new(Vec::new()),
        }
    }

    /// Returns the channel this loader installs registrations on.
    pub fn channel(&self) -> &Arc<Channel> {
        &self.channel
    }

    /// Makes a module definition known to the loader.
    ///
    /// Re-adding a name that is already known replaces nothing — the first
    /// definition wins; the duplicate is ignored with a debug log.
    pub fn add_def(&self, def: ModuleDef) {
        let mut defs = self.defs.lock();
        if defs.iter().any(|d| d.name == def.name) {
            debug!(module = def.name, "Duplicate module definition ignored");
            return;
        }
        defs.push(def);
    }

    /// Returns `true` if the named module is currently loaded.
    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.lock().iter().any(|m| &**m == name)
    }

    /// Names of all currently loaded modules, in load order.
    pub fn loaded(&self) -> Vec<String> {
        self.loaded.lock().iter().map(|m| m.to_string()).collect()
    }

    /// Loads the named module.
    ///
    /// Runs its setup function, installs the declared registrations, records
    /// the module as loaded, then radios [`LoadComplete`]. Loading a module
    /// that is already loaded is a no-op; an unknown name fails with
    /// [`LoaderError::ModuleNotFound`].
    pub async fn load(&self, name: &str) -> LoaderResult<()> {
        if self.is_loaded(name) {
            debug!(module = name, "Module already loaded, skipping");
            return Ok(());
        }

        let def = self
            .defs
            .lock()
            .iter()
            .find(|d| d.name == name)
            .copied()
            .ok_or_else(|| LoaderError::ModuleNotFound(name.to_string()))?;

        let module: Arc<str> = Arc::from(def.name);
        let mut scope = ModuleScope::new(Arc::clone(&module));
        (def.setup)(&mut scope);

        let count = scope.registrations.len();
        for (keys, handler) in scope.registrations {
            self.channel.register(&module, &keys, handler);
        }
        self.loaded.lock().push(module);

        info!(module = def.name, registrations = count, "Module loaded");
        self.channel
            .radio(
                LoadComplete {
                    module: def.name.to_string(),
                },
                Args::new(),
            )
            .await;
        Ok(())
    }

    /// Loads every known module, in the order the definitions were added.
    pub async fn load_all(&self) -> LoaderResult<()> {
        let names: Vec<&'static str> = self.defs.lock().iter().map(|d| d.name).collect();
        for name in names {
            self.load(name).await?;
        }
        Ok(())
    }

    /// Unloads the named module, removing its registrations from every
    /// event-type bucket.
    ///
    /// Fails with [`LoaderError::ModuleNotLoaded`] if the module is not
    /// currently loaded.
    pub fn unload(&self, name: &str) -> LoaderResult<()> {
        {
            let mut loaded = self.loaded.lock();
            let pos = loaded
                .iter()
                .position(|m| &**m == name)
                .ok_or_else(|| LoaderError::ModuleNotLoaded(name.to_string()))?;
            loaded.remove(pos);
        }
        self.channel.remove_module(name);
        info!(module = name, "Module unloaded");
        Ok(())
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("known", &self.defs.lock().len())
            .field("loaded", &self.loaded.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{BoxedEvent, LoadComplete};
    use crate::extract::EventContext;
    use std::any::Any;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone)]
    struct TestMessage;

    impl Event for TestMessage {
        fn event_name(&self) -> &'static str {
            "test_message"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    static HITS: AtomicUsize = AtomicUsize::new(0);

    fn counting_setup(scope: &mut ModuleScope) {
        scope.on::<TestMessage>().handler(|| async {
            HITS.fetch_add(1, Ordering::SeqCst);
        });
    }

    fn loader() -> Loader {
        Loader::new(Arc::new(Channel::new()))
    }

    #[tokio::test]
    async fn unknown_module_fails_to_load() {
        let loader = loader();
        let err = loader.load("ghost").await.unwrap_err();
        assert!(matches!(err, LoaderError::ModuleNotFound(name) if name == "ghost"));
    }

    #[tokio::test]
    async fn reloading_does_not_duplicate_registrations() {
        let loader = loader();
        loader.add_def(ModuleDef {
            name: "counting",
            setup: counting_setup,
        });

        loader.load("counting").await.unwrap();
        loader.load("counting").await.unwrap();

        assert_eq!(loader.channel().handler_count::<TestMessage>(), 1);
        assert_eq!(loader.loaded(), vec!["counting".to_string()]);
    }

    #[tokio::test]
    async fn load_radios_load_complete() {
        let loader = loader();
        let seen = Arc::new(Mutex::new(Vec::new()));

        // A host-level listener module observing LoadComplete for others.
        let observer = Arc::clone(&seen);
        let handler = into_handler(move |event: EventContext<LoadComplete>| {
            let observer = Arc::clone(&observer);
            async move {
                observer.lock().push(event.module.clone());
            }
        });
        let host: Arc<str> = Arc::from("host");
        loader
            .channel()
            .register(&host, &[TypeId::of::<LoadComplete>()], handler);

        loader.add_def(ModuleDef {
            name: "counting",
            setup: counting_setup,
        });
        loader.load("counting").await.unwrap();

        assert_eq!(*seen.lock(), vec!["counting".to_string()]);
    }

    #[tokio::test]
    async fn unload_removes_all_registrations() {
        let loader = loader();
        loader.add_def(ModuleDef {
            name: "counting",
            setup: counting_setup,
        });
        loader.load("counting").await.unwrap();
        assert_eq!(loader.channel().handler_count::<TestMessage>(), 1);

        loader.unload("counting").unwrap();
        assert_eq!(loader.channel().handler_count::<TestMessage>(), 0);
        assert!(!loader.is_loaded("counting"));

        let err = loader.unload("counting").unwrap_err();
        assert!(matches!(err, LoaderError::ModuleNotLoaded(_)));

        // A fresh load works again after unload.
        loader.load("counting").await.unwrap();
        assert_eq!(loader.channel().handler_count::<TestMessage>(), 1);
    }

    #[derive(Debug, Clone)]
    struct OtherMessage;

    impl Event for OtherMessage {
        fn event_name(&self) -> &'static str {
            "other_message"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    static CHAIN: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

    fn chained_setup(scope: &mut ModuleScope) {
        scope
            .on::<TestMessage>()
            .also::<OtherMessage>()
            .handler(|| async {
                CHAIN.lock().push("first");
            })
            .handler(|| async {
                CHAIN.lock().push("second");
            });
    }

    #[tokio::test]
    async fn chained_handlers_keep_order_across_all_keys() {
        let loader = loader();
        loader.add_def(ModuleDef {
            name: "chained",
            setup: chained_setup,
        });
        loader.load("chained").await.unwrap();

        assert_eq!(loader.channel().handler_count::<TestMessage>(), 2);
        assert_eq!(loader.channel().handler_count::<OtherMessage>(), 2);

        CHAIN.lock().clear();
        loader
            .channel()
            .radio(OtherMessage, crate::radio::Args::new())
            .await;
        assert_eq!(*CHAIN.lock(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn event_delivery_uses_boxed_event_key() {
        let loader = loader();
        loader.add_def(ModuleDef {
            name: "counting",
            setup: counting_setup,
        });
        loader.load("counting").await.unwrap();

        let before = HITS.load(Ordering::SeqCst);
        loader
            .channel()
            .radio_traced(
                BoxedEvent::new(TestMessage),
                Args::new(),
                crate::event::TraceId::new(),
            )
            .await;
        assert_eq!(HITS.load(Ordering::SeqCst), before + 1);
    }
}
