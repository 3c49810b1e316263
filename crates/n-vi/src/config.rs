//! Interpreter configuration, loaded from TOML.
//!
//! ```toml
//! jumplist_limit = 100
//! macro_depth_limit = 16
//!
//! [options]
//! number = true
//! ignorecase = true
//! ```
//!
//! Every key is optional; missing keys take the defaults below.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::options::Options;

/// Configuration for one interpreter session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Initial `:set` option values.
    #[serde(default)]
    pub options: Options,

    /// Maximum jump-list entries (`0` = unbounded).
    #[serde(default = "default_jumplist_limit")]
    pub jumplist_limit: usize,

    /// How deeply macro playback may nest (`@a` inside `@b` inside ...).
    #[serde(default = "default_macro_depth_limit")]
    pub macro_depth_limit: usize,
}

const fn default_jumplist_limit() -> usize {
    100
}

const fn default_macro_depth_limit() -> usize {
    16
}

impl Default for Config {
    fn default() -> Self {
        Self {
            options: Options::default(),
            jumplist_limit: default_jumplist_limit(),
            macro_depth_limit: default_macro_depth_limit(),
        }
    }
}

/// Failure to read or parse a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Config {
    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] on malformed TOML or mistyped values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Parse`]
    /// if its contents are invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }
}
