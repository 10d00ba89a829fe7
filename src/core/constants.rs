//! Constants used throughout kvport.
//!
//! Centralizes magic strings and configuration values.

/// Separator between path segments (`secret/app/db`).
pub const DELIMITER: &str = "/";

/// Character used to mask secret values.
pub const MASK_CHAR: char = '*';

/// Default maximum length of a masked value.
pub const DEFAULT_MAX_VALUE_LENGTH: i64 = 12;

/// Mask length that disables masking.
pub const UNMASKED: i64 = -1;

/// Config file name inside the user's config directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Application directory name under the platform config directory.
pub const APP_DIR: &str = "kvport";

/// Environment variable selecting the log filter.
pub const LOG_ENV: &str = "KVPORT_LOG";
