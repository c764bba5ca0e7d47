//! The inbound processing pipeline.
//!
//! Glues the codec, the decoder, and the dispatch channel into the
//! per-request flow:
//!
//! ```text
//! CallbackEnvelope ─▶ decrypt/verify ─▶ decode ─▶ phase 1: radio(specific),
//! radio(basic) ─▶ phase 2: radio(RadioComplete) ─▶ encrypted "success" ack
//! ```
//!
//! Phase 1 and phase 2 share one [`TraceId`]; `RadioComplete.handled` counts
//! the phase-1 handler invocations so completion listeners can implement
//! "nothing replied" fallbacks. Handler failures never fail the request —
//! only crypto and JSON failures do.

use std::sync::Arc;

use thiserror::Error;
use tracing::{Level, debug, span};

use braze_core::{App, Args, BoxedEvent, RadioComplete};

use crate::crypto::{CallbackCrypto, CryptoError};
use crate::envelope::{CallbackEnvelope, ReplyEnvelope};
use crate::event::{GroupNameChange, decode};
use crate::store::{GroupMetaStore, NoopMetaStore};

/// Errors that reject an inbound webhook request.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Decryption or signature verification failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The decrypted body is not valid JSON.
    #[error("malformed event payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}

/// Per-channel pipeline instance.
///
/// Construct once per bot and hand [`handle`](Self::handle) the envelopes
/// your HTTP layer receives.
pub struct CallbackPipeline {
    crypto: CallbackCrypto,
    app: Arc<App>,
    store: Arc<dyn GroupMetaStore>,
}

impl CallbackPipeline {
    /// Creates a pipeline dispatching onto `app`'s channel.
    pub fn new(crypto: CallbackCrypto, app: Arc<App>) -> Self {
        Self {
            crypto,
            app,
            store: Arc::new(NoopMetaStore),
        }
    }

    /// Replaces the group-metadata store seam.
    pub fn with_store(mut self, store: Arc<dyn GroupMetaStore>) -> Self {
        self.store = store;
        self
    }

    /// The crypto session this pipeline verifies against.
    pub fn crypto(&self) -> &CallbackCrypto {
        &self.crypto
    }

    /// Processes one inbound envelope end to end.
    ///
    /// Returns the encrypted `"success"` acknowledgement for the HTTP layer
    /// to send back. Crypto and JSON failures propagate; handler outcomes
    /// never do.
    pub async fn handle(&self, envelope: &CallbackEnvelope) -> Result<ReplyEnvelope, PipelineError> {
        let plain = self.crypto.decrypt(
            &envelope.msg_signature,
            &envelope.time_stamp,
            &envelope.nonce,
            &envelope.encrypt,
        )?;
        let payload: serde_json::Value = serde_json::from_slice(&plain)?;
        let decoded = decode(payload);

        let span = span!(Level::DEBUG, "callback", trace = %decoded.trace);
        let _enter = span.enter();

        let channel = self.app.channel();
        let mut handled = 0;

        // Phase 1: the specific event, then its raw shadow.
        if let Some(specific) = &decoded.specific {
            if let Some(rename) = specific.downcast_ref::<GroupNameChange>() {
                self.store
                    .upsert_title(&rename.chat_id, &rename.new_title)
                    .await;
            }
            handled += channel
                .radio_traced(specific.clone(), Args::new(), decoded.trace)
                .await;
        }
        handled += channel
            .radio_traced(
                BoxedEvent::new(decoded.basic.clone()),
                Args::new(),
                decoded.trace,
            )
            .await;

        // Phase 2: completion signal, once phase 1 has settled.
        channel
            .radio_traced(
                BoxedEvent::new(RadioComplete {
                    trace: decoded.trace,
                    handled,
                }),
                Args::new(),
                decoded.trace,
            )
            .await;

        debug!(handled, "Callback processed");
        Ok(self.crypto.ack().into())
    }
}

impl std::fmt::Debug for CallbackPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackPipeline")
            .field("crypto", &self.crypto)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{BasicEvent, GroupMessage};
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use braze_core::{EventContext, ModuleDef, ModuleScope, TraceId};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn crypto() -> CallbackCrypto {
        let encoded = BASE64.encode([42u8; 32]);
        CallbackCrypto::new(encoded.trim_end_matches('='), "token", "ww123").unwrap()
    }

    fn envelope_for(crypto: &CallbackCrypto, payload: serde_json::Value) -> CallbackEnvelope {
        let sealed = crypto.encrypt_at(payload.to_string().as_bytes(), "1700000000", "n0");
        CallbackEnvelope {
            msg_signature: sealed.signature,
            time_stamp: sealed.timestamp,
            nonce: sealed.nonce,
            encrypt: sealed.ciphertext,
        }
    }

    // Each test loads its own module over its own app, and each module
    // touches only its own statics — tests run in parallel.
    static SEEN_TEXT: Mutex<Vec<String>> = Mutex::new(Vec::new());
    static COMPLETIONS: Mutex<Vec<(TraceId, usize)>> = Mutex::new(Vec::new());
    static BASIC_HITS: AtomicUsize = AtomicUsize::new(0);

    fn echo_setup(scope: &mut ModuleScope) {
        scope
            .on::<GroupMessage>()
            .handler(|event: EventContext<GroupMessage>| async move {
                SEEN_TEXT
                    .lock()
                    .push(event.text.clone().unwrap_or_default());
            });
        // Raw-shadow handler so the completion count covers both phases
        // of phase-1 dispatch.
        scope.on::<BasicEvent>().handler(|| async {});
        scope
            .on::<RadioComplete>()
            .handler(|event: EventContext<RadioComplete>| async move {
                COMPLETIONS.lock().push((event.trace, event.handled));
            });
    }

    fn basic_setup(scope: &mut ModuleScope) {
        scope.on::<BasicEvent>().handler(|| async {
            BASIC_HITS.fetch_add(1, Ordering::SeqCst);
        });
    }

    struct RecordingStore(Mutex<Vec<(String, String)>>);

    #[async_trait::async_trait]
    impl GroupMetaStore for RecordingStore {
        async fn upsert_title(&self, chat_id: &str, title: &str) {
            self.0.lock().push((chat_id.to_string(), title.to_string()));
        }
    }

    async fn pipeline_with_module() -> CallbackPipeline {
        let app = App::new();
        app.loader().add_def(ModuleDef {
            name: "echo",
            setup: echo_setup,
        });
        app.loader().load_all().await.unwrap();
        CallbackPipeline::new(crypto(), app)
    }

    #[tokio::test]
    async fn message_reaches_handler_exactly_once() {
        let pipeline = pipeline_with_module().await;
        let envelope = envelope_for(
            pipeline.crypto(),
            json!({
                "MsgType": "text",
                "ChatId": "c1",
                "From": {"UserId": "alice"},
                "Text": {"Content": "hello"}
            }),
        );

        SEEN_TEXT.lock().clear();
        COMPLETIONS.lock().clear();
        let reply = pipeline.handle(&envelope).await.unwrap();

        assert_eq!(*SEEN_TEXT.lock(), vec!["hello".to_string()]);

        // Phase 2 observed the phase-1 count (message handler + basic handler).
        let completions = COMPLETIONS.lock().clone();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].1, 2);

        // The ack decrypts back to the literal "success".
        let plain = pipeline
            .crypto()
            .decrypt(
                &reply.msg_signature,
                &reply.time_stamp,
                &reply.nonce,
                &reply.encrypt,
            )
            .unwrap();
        assert_eq!(plain, b"success");
    }

    #[tokio::test]
    async fn unrecognised_payload_is_still_dispatched_as_basic() {
        let app = App::new();
        app.loader().add_def(ModuleDef {
            name: "basic",
            setup: basic_setup,
        });
        app.loader().load_all().await.unwrap();
        let pipeline = CallbackPipeline::new(crypto(), app);
        let envelope = envelope_for(pipeline.crypto(), json!({"Whatever": 1}));

        pipeline.handle(&envelope).await.unwrap();
        assert_eq!(BASIC_HITS.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rename_upserts_title_through_store_seam() {
        let store = Arc::new(RecordingStore(Mutex::new(Vec::new())));
        let app = App::new();
        let store_dyn: Arc<dyn GroupMetaStore> = store.clone();
        let pipeline = CallbackPipeline::new(crypto(), app).with_store(store_dyn);

        let envelope = envelope_for(
            pipeline.crypto(),
            json!({
                "EventType": "chat_update_title",
                "ChatId": "c7",
                "Operator": "boss",
                "ChatName": "release party"
            }),
        );
        pipeline.handle(&envelope).await.unwrap();

        assert_eq!(
            *store.0.lock(),
            vec![("c7".to_string(), "release party".to_string())]
        );
    }

    #[tokio::test]
    async fn tampered_envelope_is_rejected_before_dispatch() {
        let pipeline = pipeline_with_module().await;
        let mut envelope = envelope_for(pipeline.crypto(), json!({"MsgType": "text"}));
        envelope.nonce.push('x');

        let err = pipeline.handle(&envelope).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Crypto(CryptoError::SignatureMismatch)
        ));
    }

    #[tokio::test]
    async fn non_json_plaintext_is_rejected() {
        let app = App::new();
        let pipeline = CallbackPipeline::new(crypto(), app);
        let sealed = pipeline
            .crypto()
            .encrypt_at(b"not json at all", "1700000000", "n1");
        let envelope = CallbackEnvelope {
            msg_signature: sealed.signature,
            time_stamp: sealed.timestamp,
            nonce: sealed.nonce,
            encrypt: sealed.ciphertext,
        };

        let err = pipeline.handle(&envelope).await.unwrap_err();
        assert!(matches!(err, PipelineError::MalformedPayload(_)));
    }
}
