//! Loading [`CacheConfig`] from INI files.

use std::path::Path;

use ini::Ini;
use thiserror::Error;

use super::settings::CacheConfig;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or parse the config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl CacheConfig {
    /// Load configuration from an INI file.
    ///
    /// A missing file yields the defaults; keys absent from the file keep
    /// their default values.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No cache config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Parse configuration from INI text.
    pub fn from_ini_str(content: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(content)
            .map_err(|e| ConfigError::ReadError(ini::Error::Parse(e)))?;
        super::parser::parse_ini(&ini)
    }
}
