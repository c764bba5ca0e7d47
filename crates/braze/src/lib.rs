//! # Braze
//!
//! A modular, type-safe bot framework for encrypted group-chat callback
//! channels.
//!
//! This crate re-exports the public API of the framework crates:
//!
//! - [`braze_core`] — events, the dispatch channel, modules, extraction
//! - [`braze_runtime`] — configuration, logging, the runtime
//!
//! Platform adapters (e.g. `braze-adapter-wecom`) are separate crates that
//! plug into the core.
//!
//! ## Example
//!
//! ```rust,ignore
//! use braze::prelude::*;
//!
//! async fn on_message(event: EventContext<GroupMessage>) {
//!     println!("{:?}", event.text);
//! }
//!
//! fn setup(scope: &mut ModuleScope) {
//!     scope.on::<GroupMessage>().handler(on_message);
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = BrazeRuntime::new();
//!     runtime.register_module(ModuleDef { name: "echo", setup });
//!     runtime.start().await?;
//!     Ok(())
//! }
//! ```

pub use braze_core;
pub use braze_runtime;

pub use braze_core::{
    App, Arg, Args, BoxedEvent, Channel, ContextError, Event, EventContext, ExtractError,
    FromRadio, LoadComplete, Loader, LoaderError, ModuleDef, ModuleScope, RadioComplete,
    RadioContext, TraceId, WaitError, Waiter, context,
};
pub use braze_runtime::{BrazeConfig, BrazeRuntime, ConfigLoader, RuntimeError};

/// Prelude for common imports.
pub mod prelude {
    pub use braze_core::prelude::*;
    pub use braze_runtime::{BrazeConfig, BrazeRuntime, ConfigLoader};
}
