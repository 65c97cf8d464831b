//! core::config
//!
//! Configuration schema and loading.
//!
//! # Locations
//!
//! Searched in order, first hit wins:
//! 1. An explicit path (the CLI's `--config`)
//! 2. `$SSO_BRIDGE_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/sso-bridge/config.toml`
//! 4. `~/.sso-bridge/config.toml` (canonical write location)
//!
//! A missing file is not an error; defaults are used.
//!
//! # Example
//!
//! ```no_run
//! use sso_bridge::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("credential key: {}", config.file.storage.credentials_key);
//! ```

pub mod schema;

pub use schema::{
    BridgeConfig, EndpointConfig, LoginConfig, RedirectConfig, RouteConfig, StorageConfig,
    TimingConfig,
};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "SSO_BRIDGE_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Loaded configuration plus where it came from.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed and validated file contents (defaults when no file exists)
    pub file: BridgeConfig,
    /// Path the configuration was loaded from, if any
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Wrap an in-memory configuration.
    pub fn from_file_config(file: BridgeConfig) -> Self {
        Self {
            file,
            loaded_from: None,
        }
    }

    /// Load configuration, preferring `explicit` over the standard locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed,
    /// or validated. An explicit path that does not exist is a read error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        match Self::discover() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load and validate a specific config file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: BridgeConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        Ok(Self {
            file,
            loaded_from: Some(path.to_path_buf()),
        })
    }

    /// Find the first existing config file in the standard locations.
    fn discover() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("sso-bridge/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        let path = dirs::home_dir()?.join(".sso-bridge/config.toml");
        path.exists().then_some(path)
    }

    /// Get the canonical path for the config file, `~/.sso-bridge/config.toml`.
    pub fn canonical_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".sso-bridge/config.toml"))
    }

    /// Write a config file atomically (temp file + rename).
    pub fn write(path: &Path, config: &BridgeConfig) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;
        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;
        file.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the path the configuration was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }

    /// Render the effective configuration as TOML with the secret redacted.
    pub fn render_redacted(&self) -> Result<String, ConfigError> {
        let mut shown = self.file.clone();
        if !shown.login.secret.is_empty() {
            shown.login.secret = "[REDACTED]".to_string();
        }
        toml::to_string_pretty(&shown).map_err(|e| ConfigError::InvalidValue(e.to_string()))
    }
}
