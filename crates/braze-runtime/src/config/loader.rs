//! Configuration loader using figment.
//!
//! Sources are merged lowest-priority first:
//!
//! 1. Built-in defaults
//! 2. Config file (`braze.toml` / `config.toml`, searched in the current
//!    directory and the user config directory, or an explicit path)
//! 3. Environment variables (`BRAZE_*`)
//!
//! # Environment Variable Mapping
//!
//! Variables use the `BRAZE_` prefix with `__` as the nesting separator:
//!
//! - `BRAZE_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `BRAZE_CALLBACK__TOKEN=xxx` → `callback.token = "xxx"`

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use tracing::{debug, info, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::BrazeConfig;

/// Configuration loader with figment-based multi-source support.
///
/// # Example
///
/// ```rust,ignore
/// let config = ConfigLoader::new()
///     .file("braze.toml")
///     .load()?;
/// ```
pub struct ConfigLoader {
    /// Search paths for configuration files.
    search_paths: Vec<PathBuf>,
    /// Whether to load environment variables.
    load_env: bool,
    /// Specific config file to load (overrides search).
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new configuration loader with defaults.
    pub fn new() -> Self {
        Self {
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds the current directory to the search paths.
    pub fn with_current_dir(self) -> Self {
        if let Ok(cwd) = std::env::current_dir() {
            self.search_path(cwd)
        } else {
            self
        }
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<BrazeConfig> {
        let figment = self.build_figment()?;

        let config: BrazeConfig = figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!(
            logging_level = %config.logging.level,
            callback_configured = config.callback.is_configured(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Builds the figment instance with all sources.
    fn build_figment(self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(BrazeConfig::default()));

        if let Some(path) = self.config_file {
            if path.exists() {
                info!(path = %path.display(), "Loading configuration file");
                figment = figment.merge(Toml::file(path));
            } else {
                return Err(ConfigError::FileNotFound(path));
            }
        } else {
            let mut found = false;
            for search_path in self.resolve_search_paths() {
                for base_name in ["braze.toml", "config.toml"] {
                    let candidate = search_path.join(base_name);
                    if candidate.exists() {
                        info!(path = %candidate.display(), "Loading configuration file");
                        figment = figment.merge(Toml::file(candidate));
                        found = true;
                        break;
                    }
                }
                if found {
                    break;
                }
            }
            if !found {
                warn!("No configuration file found, using defaults");
            }
        }

        if self.load_env {
            figment = figment.merge(
                Env::prefixed("BRAZE_")
                    .split("__")
                    .map(|key| key.as_str().replace("__", ".").into()),
            );
        }

        Ok(figment)
    }

    /// Resolves the effective list of search paths.
    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if self.search_paths.is_empty() {
            let mut paths = Vec::new();
            if let Ok(cwd) = std::env::current_dir() {
                paths.push(cwd);
            }
            if let Some(config_dir) = dirs::config_dir() {
                paths.push(config_dir.join("braze"));
            }
            paths
        } else {
            self.search_paths.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_extracts() {
        let config = ConfigLoader::new()
            .search_path("/nonexistent")
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.logging.level, "info");
        assert!(!config.callback.is_configured());
        assert!(config.modules.is_empty());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = ConfigLoader::new()
            .file("/nonexistent/braze.toml")
            .without_env()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
