//! Configuration schema definitions.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BrazeConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Callback-channel credentials.
    #[serde(default)]
    pub callback: CallbackConfig,

    /// Per-module config sections, keyed by module name.
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level directive (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Log file path; stdout when absent.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact single-line output.
    #[default]
    Compact,
    /// Default tracing formatter.
    Full,
    /// Multi-line human-friendly output.
    Pretty,
}

/// Credentials for the encrypted callback channel.
///
/// All three values come from the platform's bot registration page. The
/// `aes_key` is the base64 secret as displayed there, i.e. without its
/// trailing `=`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CallbackConfig {
    /// Shared token mixed into the request signature.
    #[serde(default)]
    pub token: String,

    /// Base64-encoded AES key, trailing padding stripped.
    #[serde(default)]
    pub aes_key: String,

    /// Application identifier used as the frame integrity tag.
    #[serde(default)]
    pub app_id: String,
}

impl CallbackConfig {
    /// Returns `true` when all credentials are present.
    pub fn is_configured(&self) -> bool {
        !self.token.is_empty() && !self.aes_key.is_empty() && !self.app_id.is_empty()
    }
}
