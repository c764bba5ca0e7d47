//! Wire envelopes for the webhook callback channel.
//!
//! The HTTP layer (an external collaborator) hands the adapter a parsed
//! [`CallbackEnvelope`] and sends back the [`ReplyEnvelope`] the pipeline
//! produces. Field spelling follows the platform's JSON exactly — note the
//! camel-case `timeStamp` among snake-case siblings.

use serde::{Deserialize, Serialize};

use crate::crypto::Sealed;

/// Inbound webhook body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackEnvelope {
    /// Signature over the sorted token/timestamp/nonce/ciphertext.
    pub msg_signature: String,
    /// Unix timestamp (seconds) as a decimal string.
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
    /// Request nonce.
    pub nonce: String,
    /// Base64 AES-CBC ciphertext of the event payload.
    pub encrypt: String,
}

/// Outbound acknowledgement body, wrapping an encrypted `"success"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    /// Signature over the sorted token/timestamp/nonce/ciphertext.
    pub msg_signature: String,
    /// Base64 AES-CBC ciphertext of the reply body.
    pub encrypt: String,
    /// Unix timestamp (seconds) as a decimal string.
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
    /// Reply nonce.
    pub nonce: String,
}

impl From<Sealed> for ReplyEnvelope {
    fn from(sealed: Sealed) -> Self {
        Self {
            msg_signature: sealed.signature,
            encrypt: sealed.ciphertext,
            time_stamp: sealed.timestamp,
            nonce: sealed.nonce,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_envelope_uses_wire_field_names() {
        let json = r#"{
            "msg_signature": "abc",
            "timeStamp": "1700000000",
            "nonce": "42",
            "encrypt": "b64=="
        }"#;
        let envelope: CallbackEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.msg_signature, "abc");
        assert_eq!(envelope.time_stamp, "1700000000");
        assert_eq!(envelope.nonce, "42");
        assert_eq!(envelope.encrypt, "b64==");
    }

    #[test]
    fn reply_envelope_serialises_camel_case_timestamp() {
        let reply = ReplyEnvelope {
            msg_signature: "sig".into(),
            encrypt: "ct".into(),
            time_stamp: "1".into(),
            nonce: "n".into(),
        };
        let value = serde_json::to_value(&reply).unwrap();
        assert!(value.get("timeStamp").is_some());
        assert!(value.get("time_stamp").is_none());
    }
}
