//! Error types for the Braze core.

use thiserror::Error;

/// Errors that can occur during handler parameter extraction.
///
/// A failed extraction is not fatal: the dispatch bus skips the handler and
/// continues with the rest of the chain.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// The dispatched event is not of the type the handler asked for.
    #[error("event type mismatch: expected '{expected}', got '{got}'")]
    EventTypeMismatch {
        /// Expected type name.
        expected: &'static str,
        /// Name of the event that was actually dispatched.
        got: &'static str,
    },

    /// No radio argument of the requested type was supplied.
    #[error("no radio argument of type '{0}'")]
    ArgNotFound(&'static str),
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;
