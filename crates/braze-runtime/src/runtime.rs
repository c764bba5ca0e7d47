//! Main runtime orchestration.
//!
//! [`BrazeRuntime`] ties the pieces together: it loads configuration,
//! initialises logging, owns one [`App`] (channel + loader), and drives
//! module loading at startup.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use braze_runtime::BrazeRuntime;
//!
//! // Simplest way — auto-loads config from the current directory
//! let runtime = BrazeRuntime::new();
//! runtime.register_module(GREETER);
//! runtime.start().await?;
//! ```

use std::sync::Arc;

use tracing::info;

use braze_core::{App, ModuleDef, context};

use crate::config::{BrazeConfig, ConfigLoader};
use crate::error::RuntimeResult;
use crate::logging;

/// The main Braze runtime: configuration plus one application instance.
pub struct BrazeRuntime {
    config: BrazeConfig,
    app: Arc<App>,
}

impl BrazeRuntime {
    /// Creates a new runtime with automatic configuration loading.
    ///
    /// Searches for `braze.toml` in the current directory (and the user
    /// config directory), merges `BRAZE_*` environment variables, and falls
    /// back to defaults when nothing is found.
    pub fn new() -> Self {
        let config = ConfigLoader::new().load().unwrap_or_else(|e| {
            eprintln!("Warning: failed to load config ({e}), using defaults");
            BrazeConfig::default()
        });
        Self::from_config(&config)
    }

    /// Creates a runtime from a pre-loaded configuration.
    ///
    /// Initialises logging as a side effect (tolerant of an already
    /// installed subscriber).
    pub fn from_config(config: &BrazeConfig) -> Self {
        logging::init_from_config(&config.logging);

        info!(
            log_level = %config.logging.level,
            "Runtime initialized from configuration"
        );

        Self {
            config: config.clone(),
            app: App::new(),
        }
    }

    /// The runtime's application instance.
    pub fn app(&self) -> &Arc<App> {
        &self.app
    }

    /// The loaded configuration.
    pub fn config(&self) -> &BrazeConfig {
        &self.config
    }

    /// The config section for the named module, when present.
    pub fn module_config(&self, name: &str) -> Option<&serde_json::Value> {
        self.config.modules.get(name)
    }

    /// Makes a module definition known to the loader.
    pub fn register_module(&self, def: ModuleDef) {
        self.app.loader().add_def(def);
    }

    /// Loads every registered module, in registration order.
    pub async fn start(&self) -> RuntimeResult<()> {
        self.app.loader().load_all().await?;
        info!(
            modules = self.app.loader().loaded().len(),
            "Runtime started"
        );
        Ok(())
    }

    /// Runs `fut` with this runtime's [`App`] installed as the task-scoped
    /// current instance.
    ///
    /// Inside the future, `braze_core::context::current()` resolves to this
    /// runtime's instance — without touching any other runtime hosted in
    /// the same process.
    pub async fn scoped<F>(&self, fut: F) -> F::Output
    where
        F: Future,
    {
        context::scope(Arc::clone(&self.app), fut).await
    }
}

impl Default for BrazeRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BrazeRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrazeRuntime")
            .field("app", &self.app)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use braze_core::ModuleScope;

    fn empty_setup(_scope: &mut ModuleScope) {}

    #[tokio::test]
    async fn start_loads_registered_modules() {
        let runtime = BrazeRuntime::from_config(&BrazeConfig::default());
        runtime.register_module(ModuleDef {
            name: "empty",
            setup: empty_setup,
        });

        runtime.start().await.unwrap();
        assert_eq!(runtime.app().loader().loaded(), vec!["empty".to_string()]);
    }

    #[tokio::test]
    async fn scoped_installs_current_instance() {
        let runtime = BrazeRuntime::from_config(&BrazeConfig::default());
        let app = Arc::clone(runtime.app());

        let same = runtime
            .scoped(async move { Arc::ptr_eq(&context::current().unwrap(), &app) })
            .await;
        assert!(same);
    }
}
