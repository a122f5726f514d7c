//! Configuration loading from files and environment variables

use crate::error::{Error, Result};
use config::{Config as ConfigLib, Environment, File};
use std::path::Path;

use super::{global_config_path, Config};

/// Shortcut variable for the caption bearer token
const CAPTIONS_TOKEN_ENV: &str = "KEYHOIST_CAPTIONS_TOKEN";

impl Config {
    /// Loads configuration from a TOML file with environment variable overrides
    ///
    /// Environment variables are prefixed with `KEYHOIST_` and use double underscores
    /// for nested values. For example:
    /// - `KEYHOIST_EXTRACT__CATEGORY=Inspection`
    /// - `KEYHOIST_REGISTRY__TIMEOUT_SECS=10`
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut builder = ConfigLib::builder();

        // Add the config file if it exists
        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("KEYHOIST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Ok(token) = std::env::var(CAPTIONS_TOKEN_ENV) {
            builder = builder
                .set_override("captions.token", token)
                .map_err(|e| Error::config(format!("Failed to set {CAPTIONS_TOKEN_ENV}: {e}")))?;
        }

        let config = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize config: {e}")))
    }

    /// Creates a config from a TOML string (useful for testing)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from a single file
    ///
    /// Precedence (lowest to highest):
    /// 1. Hardcoded defaults
    /// 2. Config file (~/.keyhoist/config.toml or custom --config path)
    /// 3. Environment variables (KEYHOIST_*)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => global_config_path()?,
        };
        Self::from_file(&path)
    }
}
