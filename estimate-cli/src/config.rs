//! Optional TOML configuration for the `estimates` binary.
//!
//! ```toml
//! save_delay_ms = 500
//!
//! [store]
//! backend = "sqlite"
//! connection_string = "estimates.db"
//! ```
//!
//! Command line flags override whatever the file sets.

use std::path::Path;
use std::time::Duration;

use estimate_core::PanelConfig;
use estimate_core::db::StoreConfig;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_BACKEND: &str = "sqlite";
pub const DEFAULT_DATABASE: &str = "estimates.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub save_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                backend: DEFAULT_BACKEND.to_string(),
                connection_string: DEFAULT_DATABASE.to_string(),
            },
            save_delay_ms: PanelConfig::default().save_delay.as_millis() as u64,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(
        source: &str,
        path: &str,
    ) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        Self::from_toml_str(&source, &display)
    }

    /// Applies command line overrides on top of the file values.
    pub fn with_overrides(
        mut self,
        backend: Option<String>,
        database: Option<String>,
    ) -> Self {
        if let Some(backend) = backend {
            self.store.backend = backend;
        }
        if let Some(database) = database {
            self.store.connection_string = database;
        }
        self
    }

    /// Panel settings for a one-shot edit: saving is on from the start.
    pub fn panel_config(&self) -> PanelConfig {
        PanelConfig {
            save_delay: Duration::from_millis(self.save_delay_ms),
            editing: true,
        }
    }
}
