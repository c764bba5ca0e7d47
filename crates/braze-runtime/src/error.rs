//! Runtime error types.

use thiserror::Error;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration loading failed.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// A module failed to load or unload.
    #[error(transparent)]
    Loader(#[from] braze_core::LoaderError),

    /// The callback channel is not configured.
    #[error("callback credentials missing: set callback.token, callback.aes_key, callback.app_id")]
    CallbackUnconfigured,
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
