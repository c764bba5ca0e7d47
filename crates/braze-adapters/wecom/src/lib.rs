//! # Braze WeCom Adapter
//!
//! WeCom group-bot callback adapter for the Braze framework.
//!
//! The platform delivers group-chat events over an encrypted webhook
//! channel. This crate provides everything between the raw envelope the
//! HTTP layer receives and the typed events handlers consume:
//!
//! - [`CallbackCrypto`] — AES-256-CBC + SHA-1-signature codec for the
//!   callback channel, both directions.
//! - [`CallbackEnvelope`] / [`ReplyEnvelope`] — the wire JSON models.
//! - Event decoding ([`decode`]) — `EventType`/`MsgType` dispatch into
//!   [`GroupMessage`], [`ChatQuit`], [`ChatKick`], [`GroupNameChange`],
//!   [`GroupDisband`], with a [`BasicEvent`] raw shadow.
//! - [`CallbackPipeline`] — the per-request flow: decrypt, decode, radio
//!   (two phases), acknowledge.
//!
//! ## Example
//!
//! ```rust,ignore
//! let crypto = CallbackCrypto::new(&cfg.aes_key, &cfg.token, &cfg.app_id)?;
//! let pipeline = CallbackPipeline::new(crypto, app);
//!
//! // In your HTTP handler:
//! let reply = pipeline.handle(&envelope).await?;
//! ```

pub mod crypto;
pub mod envelope;
pub mod event;
pub mod pipeline;
pub mod store;

pub use crypto::{CallbackCrypto, CryptoError, Sealed};
pub use envelope::{CallbackEnvelope, ReplyEnvelope};
pub use event::{
    BasicEvent, ChatKick, ChatQuit, Decoded, GroupDisband, GroupMessage, GroupNameChange, decode,
};
pub use pipeline::{CallbackPipeline, PipelineError};
pub use store::{GroupMetaStore, NoopMetaStore};
