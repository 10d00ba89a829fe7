//! Configuration file management.
//!
//! Reads and validates the optional `config.toml` holding defaults for the
//! secret store connection and for rendering. Command-line flags and
//! environment variables override anything set here.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::constants::{self, DEFAULT_MAX_VALUE_LENGTH};
use crate::core::render::Format;
use crate::error::{ConfigError, Result};

/// User settings stored in `config.toml`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Secret store connection
    #[serde(default)]
    pub vault: VaultSettings,
    /// Rendering defaults
    #[serde(default)]
    pub output: OutputSettings,
}

/// Connection settings. The token is deliberately not configurable here.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct VaultSettings {
    /// Server address, e.g. `https://vault.example.com:8200`
    pub address: Option<String>,
    /// Enterprise namespace sent as `X-Vault-Namespace`
    pub namespace: Option<String>,
}

/// Rendering defaults.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    /// One of `native`, `json`, `yaml`, `export`
    pub format: Option<String>,
    /// Mask length; `-1` disables masking
    pub max_value_length: Option<i64>,
    /// Show values unmasked
    pub show_values: Option<bool>,
}

impl Settings {
    /// Default location: `<config dir>/kvport/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(constants::APP_DIR).join(constants::CONFIG_FILE))
    }

    /// Load settings.
    ///
    /// An explicit path must exist. Without one the default location is
    /// tried and silently skipped when absent.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadFile`, `ConfigError::Parse` or a validation
    /// error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("no config file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        debug!(path = %path.display(), "loading config");
        let contents = std::fs::read_to_string(&path).map_err(ConfigError::ReadFile)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let settings: Self = toml::from_str(contents).map_err(ConfigError::Parse)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the loaded values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an unknown format, a mask
    /// length below -1, or an empty address.
    pub fn validate(&self) -> Result<()> {
        self.format()?;

        if let Some(length) = self.output.max_value_length {
            if length < constants::UNMASKED {
                return Err(ConfigError::InvalidValue {
                    field: "output.max_value_length",
                    reason: format!("must be at least 0, or -1 to disable masking (got {})", length),
                }
                .into());
            }
        }

        if let Some(address) = &self.vault.address {
            if address.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "vault.address",
                    reason: "cannot be empty".to_string(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Configured output format, native when unset.
    pub fn format(&self) -> Result<Format> {
        match &self.output.format {
            Some(name) => Ok(name.parse()?),
            None => Ok(Format::default()),
        }
    }

    /// Configured mask length.
    pub fn max_value_length(&self) -> i64 {
        self.output.max_value_length.unwrap_or(DEFAULT_MAX_VALUE_LENGTH)
    }

    /// Whether values are shown unmasked by default.
    pub fn show_values(&self) -> bool {
        self.output.show_values.unwrap_or(false)
    }
}
