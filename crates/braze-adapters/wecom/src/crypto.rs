//! Callback-channel crypto codec.
//!
//! The platform secures its webhook callbacks with AES-256-CBC plus a SHA-1
//! signature over the sorted request parameters. This module implements both
//! directions: verifying/decrypting an inbound payload and producing the
//! encrypted acknowledgement envelope.
//!
//! # Wire conventions (fixed by the platform, do not change)
//!
//! - The configured key is base64 with its final `=` stripped; append it
//!   back before decoding. The decoded key must be exactly 32 bytes.
//! - The CBC IV is the **first 16 bytes of the key**, not a random IV. This
//!   weakens the cipher but is required for interoperability.
//! - `msg_signature = hex(sha1(concat(sort(token, timestamp, nonce, ct))))`
//!   where the four strings are byte-sorted and joined with no separator.
//! - Plaintext framing: `[16 random bytes][u32 BE message length][message]
//!   [app id]`, padded PKCS#7-style to a 32-byte boundary.

use aes::Aes256;
use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use rand::rngs::OsRng;
use sha1::{Digest, Sha1};
use thiserror::Error;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Padding is applied to a 32-byte boundary (twice the AES block size) —
/// a quirk of the platform's reference implementation.
const PAD_BLOCK: usize = 32;

/// Errors produced by the callback codec.
///
/// All of these are fatal for the request that triggered them: the webhook
/// call is rejected and no event is dispatched.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The configured key does not decode as base64.
    #[error("callback key is not valid base64: {0}")]
    KeyEncoding(base64::DecodeError),

    /// The configured key does not decode to exactly 32 bytes.
    #[error("callback key must decode to 32 bytes")]
    KeyLength,

    /// The computed request signature does not match the supplied one.
    #[error("callback signature mismatch")]
    SignatureMismatch,

    /// The ciphertext is not valid base64 or not a whole number of blocks.
    #[error("malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    /// The padding length byte is zero or exceeds the 32-byte pad block.
    #[error("invalid padding length {0}")]
    PaddingError(u8),

    /// The decrypted frame is shorter than its header or declared length.
    #[error("decrypted frame is truncated")]
    Truncated,

    /// The trailing bytes of the frame do not equal the configured app id.
    #[error("callback app id mismatch")]
    AppIdMismatch,
}

/// A sealed outbound payload, ready to be wrapped in a reply envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    /// Request signature over the sorted parameters.
    pub signature: String,
    /// Base64-encoded AES-CBC ciphertext.
    pub ciphertext: String,
    /// Unix timestamp (seconds) as a decimal string.
    pub timestamp: String,
    /// Random nonce.
    pub nonce: String,
}

/// Key material and identity for one callback channel.
///
/// Immutable once constructed; used for both directions (decrypt inbound,
/// encrypt outbound acknowledgements).
#[derive(Clone)]
pub struct CallbackCrypto {
    key: [u8; 32],
    iv: [u8; 16],
    token: String,
    app_id: String,
}

impl CallbackCrypto {
    /// Derives the session from the configured secret.
    ///
    /// `encoded_key` is the base64 secret as handed out by the platform,
    /// i.e. with its trailing `=` already stripped.
    pub fn new(
        encoded_key: &str,
        token: impl Into<String>,
        app_id: impl Into<String>,
    ) -> Result<Self, CryptoError> {
        let raw = BASE64
            .decode(format!("{encoded_key}="))
            .map_err(CryptoError::KeyEncoding)?;
        let key: [u8; 32] = raw.try_into().map_err(|_| CryptoError::KeyLength)?;
        let mut iv = [0u8; 16];
        iv.copy_from_slice(&key[..16]);
        Ok(Self {
            key,
            iv,
            token: token.into(),
            app_id: app_id.into(),
        })
    }

    /// The app id used as the frame integrity tag.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Computes the request signature for the given parameters.
    pub fn signature(&self, timestamp: &str, nonce: &str, ciphertext: &str) -> String {
        let mut parts = [self.token.as_str(), timestamp, nonce, ciphertext];
        parts.sort_unstable();

        let mut hasher = Sha1::new();
        for part in parts {
            hasher.update(part.as_bytes());
        }
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    // ─── Decrypt ─────────────────────────────────────────────────────────────

    /// Verifies `signature` and decrypts `ciphertext`, returning the framed
    /// message bytes (a JSON-encoded event payload).
    pub fn decrypt(
        &self,
        signature: &str,
        timestamp: &str,
        nonce: &str,
        ciphertext: &str,
    ) -> Result<Vec<u8>, CryptoError> {
        if self.signature(timestamp, nonce, ciphertext) != signature {
            return Err(CryptoError::SignatureMismatch);
        }

        let data = BASE64
            .decode(ciphertext)
            .map_err(|e| CryptoError::MalformedCiphertext(e.to_string()))?;

        let cipher = Aes256CbcDec::new(&self.key.into(), &self.iv.into());
        let plain = cipher
            .decrypt_padded_vec_mut::<NoPadding>(&data)
            .map_err(|_| {
                CryptoError::MalformedCiphertext(format!(
                    "ciphertext length {} is not a whole number of blocks",
                    data.len()
                ))
            })?;
        let frame = strip_padding(&plain)?;

        // [16B random][u32 BE length][message][app id]
        if frame.len() < 20 {
            return Err(CryptoError::Truncated);
        }
        let mut len_buf = [0u8; 4];
        len_buf.copy_from_slice(&frame[16..20]);
        let msg_len = u32::from_be_bytes(len_buf) as usize;

        let msg_end = match 20usize.checked_add(msg_len) {
            Some(end) if end <= frame.len() => end,
            _ => return Err(CryptoError::Truncated),
        };

        if &frame[msg_end..] != self.app_id.as_bytes() {
            return Err(CryptoError::AppIdMismatch);
        }

        Ok(frame[20..msg_end].to_vec())
    }

    // ─── Encrypt ─────────────────────────────────────────────────────────────

    /// Seals `message` with a fresh random nonce and the current time.
    pub fn encrypt(&self, message: &[u8]) -> Sealed {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
            .to_string();

        let mut nonce_bytes = [0u8; 8];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce: String = nonce_bytes.iter().map(|b| format!("{b:02x}")).collect();

        self.encrypt_at(message, &timestamp, &nonce)
    }

    /// Seals `message` under a caller-chosen timestamp and nonce.
    ///
    /// The random frame prefix still varies per call, so two seals of the
    /// same message differ in ciphertext; round-trip tests pair this with
    /// [`decrypt`](Self::decrypt) rather than pinning ciphertext bytes.
    pub fn encrypt_at(&self, message: &[u8], timestamp: &str, nonce: &str) -> Sealed {
        let mut frame =
            Vec::with_capacity(20 + message.len() + self.app_id.len() + PAD_BLOCK);

        let mut random = [0u8; 16];
        OsRng.fill_bytes(&mut random);
        frame.extend_from_slice(&random);
        frame.extend_from_slice(&(message.len() as u32).to_be_bytes());
        frame.extend_from_slice(message);
        frame.extend_from_slice(self.app_id.as_bytes());

        let pad = PAD_BLOCK - frame.len() % PAD_BLOCK;
        frame.extend(std::iter::repeat_n(pad as u8, pad));

        let cipher = Aes256CbcEnc::new(&self.key.into(), &self.iv.into());
        let encrypted = cipher.encrypt_padded_vec_mut::<NoPadding>(&frame);
        let ciphertext = BASE64.encode(&encrypted);
        let signature = self.signature(timestamp, nonce, &ciphertext);

        Sealed {
            signature,
            ciphertext,
            timestamp: timestamp.to_string(),
            nonce: nonce.to_string(),
        }
    }

    /// Seals the literal `"success"` acknowledgement body.
    pub fn ack(&self) -> Sealed {
        self.encrypt(b"success")
    }
}

impl std::fmt::Debug for CallbackCrypto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material is deliberately not printed.
        f.debug_struct("CallbackCrypto")
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

/// Strips the 32-byte-block PKCS#7 padding.
fn strip_padding(data: &[u8]) -> Result<&[u8], CryptoError> {
    let pad = *data.last().ok_or(CryptoError::Truncated)? as usize;
    if pad == 0 || pad > PAD_BLOCK {
        return Err(CryptoError::PaddingError(pad as u8));
    }
    if pad > data.len() {
        return Err(CryptoError::Truncated);
    }
    Ok(&data[..data.len() - pad])
}
