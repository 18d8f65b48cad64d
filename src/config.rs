//! Alias file for the command-line tool.
//!
//! ```toml
//! [aliases]
//! ll = "ls -l"
//! sudo = "sudo "
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid alias definition '{0}', expected NAME=VALUE")]
    Alias(String),
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Alias table, in definition order.
    #[serde(default)]
    pub aliases: IndexMap<String, String>,
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        log::debug!(
            "loaded {} aliases from {}",
            config.aliases.len(),
            path.display()
        );
        Ok(config)
    }

    /// Add a `NAME=VALUE` definition, replacing any earlier one.
    pub fn define(&mut self, definition: &str) -> Result<(), ConfigError> {
        match definition.split_once('=') {
            Some((name, value)) if !name.is_empty() => {
                self.aliases.insert(name.to_string(), value.to_string());
                Ok(())
            }
            _ => Err(ConfigError::Alias(definition.to_string())),
        }
    }
}
