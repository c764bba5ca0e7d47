//! # Braze Core
//!
//! The core engine of the Braze bot framework.
//!
//! This crate provides the fundamental building blocks of the framework:
//! the event system, the dispatch bus, the module loader, and the parameter
//! extraction machinery handlers are written against.
//!
//! ## Architecture
//!
//! All events flow through the central [`Channel`]:
//!
//! ```text
//! ┌──────────────┐     ┌───────────┐     ┌───────────┐
//! │   Adapter    │────▶│  Channel  │────▶│  Handler  │
//! │  (decoder)   │     │  (radio)  │────▶│  Handler  │
//! └──────────────┘     └───────────┘────▶│  Handler  │
//!                                        └───────────┘
//! ```
//!
//! - **Events** ([`Event`], [`BoxedEvent`]) are plain typed values; an
//!   event's dispatch key is its concrete type.
//! - **Handlers** are async functions whose parameters implement
//!   [`FromRadio`]; the channel injects the dispatched event, radio
//!   arguments, and the [`TraceId`] by type.
//! - **Modules** ([`ModuleDef`]) own handler registrations and are loaded
//!   and unloaded through the [`Loader`].
//! - **Waiters** ([`Waiter`]) are one-shot, predicate-filtered
//!   subscriptions for awaiting a specific follow-up event.
//!
//! ## Example
//!
//! ```rust,ignore
//! use braze_core::{App, Args, EventContext, ModuleDef, ModuleScope};
//!
//! async fn on_load(event: EventContext<braze_core::LoadComplete>) {
//!     println!("loaded: {}", event.module);
//! }
//!
//! fn setup(scope: &mut ModuleScope) {
//!     scope.on::<braze_core::LoadComplete>().handler(on_load);
//! }
//!
//! # async fn run() {
//! let app = App::new();
//! app.loader().add_def(ModuleDef { name: "greeter", setup });
//! app.loader().load_all().await.unwrap();
//! # }
//! ```

pub mod channel;
pub mod context;
pub mod error;
pub mod event;
pub mod extract;
pub mod handler;
pub mod module;
pub mod radio;
pub mod waiter;

pub use channel::Channel;
pub use context::{App, ContextError};
pub use error::{ExtractError, ExtractResult};
pub use event::{BoxedEvent, Event, LoadComplete, RadioComplete, TraceId};
pub use extract::{Arg, EventContext, FromRadio};
pub use handler::{BoxedHandler, HandleResponse, Handler, into_handler};
pub use module::{Loader, LoaderError, LoaderResult, ModuleDef, ModuleScope, Registration};
pub use radio::{Args, RadioContext};
pub use waiter::{WaitError, Waiter};

/// Prelude for common imports.
pub mod prelude {
    pub use super::{
        App, Arg, Args, BoxedEvent, Channel, Event, EventContext, FromRadio, LoadComplete, Loader,
        ModuleDef, ModuleScope, RadioComplete, RadioContext, TraceId, WaitError, Waiter,
    };
}
