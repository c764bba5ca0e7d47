//! # Braze Runtime
//!
//! Runtime orchestration layer for the Braze bot framework:
//!
//! - **Configuration**: figment-based loading from `braze.toml` and
//!   `BRAZE_*` environment variables ([`config`])
//! - **Logging**: configuration-driven `tracing` setup ([`logging`])
//! - **Orchestration**: [`BrazeRuntime`], owning one application instance
//!   and driving module loading

pub mod config;
pub mod error;
pub mod logging;
mod runtime;

pub use config::{BrazeConfig, CallbackConfig, ConfigError, ConfigLoader, LogFormat, LoggingConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use runtime::BrazeRuntime;
