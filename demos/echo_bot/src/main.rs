//! Echo Bot Demo
//!
//! End-to-end demonstration of the Braze framework without an HTTP server:
//! the demo plays both sides of the callback channel. It registers a module
//! with a few handlers, seals an inbound payload the way the platform
//! would, runs it through the [`CallbackPipeline`], and prints what the
//! handlers observed plus the decrypted acknowledgement.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package echo-bot
//! ```

use std::sync::Arc;

use anyhow::Result;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::json;
use tracing::info;

use braze::prelude::*;
use braze_adapter_wecom::{
    CallbackCrypto, CallbackEnvelope, CallbackPipeline, GroupMessage, GroupNameChange,
};

// ============================================================================
// Handler Functions
// ============================================================================

/// Logs every group message.
async fn logging_handler(event: EventContext<GroupMessage>) {
    info!(
        chat = %event.chat_id,
        sender = %event.sender,
        text = event.text.as_deref().unwrap_or("<non-text>"),
        "Message received"
    );
}

/// Echoes text messages back (here: to the log, since the demo has no
/// outbound transport).
async fn echo_handler(event: EventContext<GroupMessage>, trace: TraceId) {
    if let Some(text) = &event.text {
        info!(%trace, "Would reply: {text}");
    }
}

/// Watches for chat renames.
async fn rename_handler(event: EventContext<GroupNameChange>) {
    info!(
        chat = %event.chat_id,
        title = %event.new_title,
        "Chat renamed"
    );
}

/// Fallback driven by the completion signal: fires when nothing else
/// handled the inbound event.
async fn fallback_handler(event: EventContext<RadioComplete>) {
    if event.handled == 0 {
        info!(trace = %event.trace, "Nothing replied to this event");
    }
}

fn setup(scope: &mut ModuleScope) {
    scope
        .on::<GroupMessage>()
        .handler(logging_handler)
        .handler(echo_handler);
    scope.on::<GroupNameChange>().handler(rename_handler);
    scope.on::<RadioComplete>().handler(fallback_handler);
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let runtime = BrazeRuntime::new();
    runtime.register_module(ModuleDef {
        name: "echo",
        setup,
    });
    runtime.start().await?;

    // Demo credentials. A real deployment reads these from braze.toml
    // (callback.token / callback.aes_key / callback.app_id).
    let encoded_key = BASE64.encode([13u8; 32]);
    let crypto = CallbackCrypto::new(
        encoded_key.trim_end_matches('='),
        "demo-token",
        "ww-demo-app",
    )?;
    let pipeline = CallbackPipeline::new(crypto.clone(), Arc::clone(runtime.app()));

    // Play the platform: seal an inbound message the way its webhook would.
    let payload = json!({
        "MsgType": "text",
        "MsgId": "msg-1",
        "ChatId": "chat-42",
        "From": {"UserId": "alice"},
        "Text": {"Content": "hello braze"}
    });
    let sealed = crypto.encrypt(payload.to_string().as_bytes());
    let envelope = CallbackEnvelope {
        msg_signature: sealed.signature,
        time_stamp: sealed.timestamp,
        nonce: sealed.nonce,
        encrypt: sealed.ciphertext,
    };

    let reply = pipeline.handle(&envelope).await?;
    let ack = crypto.decrypt(
        &reply.msg_signature,
        &reply.time_stamp,
        &reply.nonce,
        &reply.encrypt,
    )?;
    info!(ack = %String::from_utf8_lossy(&ack), "Acknowledgement verified");

    Ok(())
}
