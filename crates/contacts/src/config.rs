//! Configuration management for the contact book.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default configuration directory name.
const CONFIG_DIR_NAME: &str = "contacts";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "CONTACTS_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `CONTACTS_`, nested keys joined
///    with `__`, e.g. `CONTACTS_STORAGE__PATH`)
/// 2. TOML config file at `~/.config/contacts/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Contacts file used when none is given on the command line.
    /// Unset means the book is not saved.
    pub path: Option<PathBuf>,
    /// Create the contacts file when it does not exist yet.
    pub create_if_missing: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            create_if_missing: true,
        }
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing, or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.storage.path {
            if path.as_os_str().is_empty() {
                return Err(Error::ConfigValidation {
                    message: "storage.path must not be empty".to_string(),
                });
            }
            if path.is_dir() {
                return Err(Error::ConfigValidation {
                    message: format!("storage.path {} is a directory", path.display()),
                });
            }
        }
        Ok(())
    }

    /// Pick the contacts file for this run.
    ///
    /// A path given on the command line wins over the configured one.
    #[must_use]
    pub fn persistence_target(&self, cli_path: Option<PathBuf>) -> Option<PathBuf> {
        cli_path.or_else(|| self.storage.path.clone())
    }
}
