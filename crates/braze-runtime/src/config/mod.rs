//! Configuration loading and schema.
//!
//! See [`ConfigLoader`] for the source merge order and
//! [`BrazeConfig`] for the schema.

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use schema::{BrazeConfig, CallbackConfig, LogFormat, LoggingConfig};
