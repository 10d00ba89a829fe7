//! Command-line interface.

pub mod completions;
pub mod export;
pub mod import;
pub mod output;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use zeroize::Zeroizing;

use crate::core::backend::{Backend, FileBackend, VaultClient};
use crate::core::config::Settings;
use crate::core::render::Format;
use crate::error::{ConfigError, Result};

/// kvport - Browse, export and re-import trees of secrets.
#[derive(Parser)]
#[command(
    name = "kvport",
    about = "Browse, export and re-import trees of secrets from a KV v2 secret store",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub store: StoreArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Where secrets live and how to reach them.
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Config file (default: <config dir>/kvport/config.toml)
    #[arg(long, global = true, env = "KVPORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Secret store address
    #[arg(long, global = true, env = "VAULT_ADDR")]
    pub address: Option<String>,

    /// Secret store token
    #[arg(long, global = true, env = "VAULT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Namespace sent with every request
    #[arg(long, global = true, env = "VAULT_NAMESPACE")]
    pub namespace: Option<String>,

    /// Use a JSON file as the secret store instead of a server
    #[arg(long, global = true, env = "KVPORT_BACKEND_FILE")]
    pub backend_file: Option<PathBuf>,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Import secrets from kvport's JSON or YAML output
    Import(ImportArgs),

    /// Render the secrets below a path
    Export(ExportArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments of `kvport import`.
#[derive(Args, Debug, Default)]
pub struct ImportArgs {
    /// Destination path; its first segment is the engine mount
    #[arg(short, long, env = "KVPORT_IMPORT_PATH")]
    pub path: Option<String>,

    /// Engine mount, for mounts containing "/"; --path is appended to it
    #[arg(short, long, env = "KVPORT_IMPORT_ENGINE_PATH")]
    pub engine_path: Option<String>,

    /// File containing kvport YAML or JSON output (default: STDIN)
    #[arg(short, long, env = "KVPORT_IMPORT_FILE")]
    pub file: Option<PathBuf>,

    /// Write into an engine that is already enabled
    #[arg(long, env = "KVPORT_IMPORT_FORCE")]
    pub force: bool,

    /// Preview the resulting secrets without writing
    #[arg(short, long, env = "KVPORT_IMPORT_DRY_RUN")]
    pub dry_run: bool,

    /// Do not print the imported secrets
    #[arg(short, long, env = "KVPORT_IMPORT_SILENT")]
    pub silent: bool,

    /// Do not mask values
    #[arg(long, env = "KVPORT_IMPORT_SHOW_VALUES")]
    pub show_values: bool,

    /// Maximum length of masked values, -1 to disable masking
    #[arg(long, env = "KVPORT_IMPORT_MAX_VALUE_LENGTH", allow_negative_numbers = true)]
    pub max_value_length: Option<i64>,

    /// Pass "-" to read from STDIN explicitly
    pub source: Option<String>,
}

/// Arguments of `kvport export`.
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Path to export; its first segment is the engine mount
    #[arg(short, long, env = "KVPORT_EXPORT_PATH")]
    pub path: Option<String>,

    /// Engine mount, for mounts containing "/"; --path is appended to it
    #[arg(short, long, env = "KVPORT_EXPORT_ENGINE_PATH")]
    pub engine_path: Option<String>,

    /// Output format: native, json, yaml or export
    #[arg(short, long, env = "KVPORT_EXPORT_FORMAT")]
    pub format: Option<Format>,

    /// Show only keys
    #[arg(long, env = "KVPORT_EXPORT_ONLY_KEYS", conflicts_with = "only_paths")]
    pub only_keys: bool,

    /// Show only paths
    #[arg(long, env = "KVPORT_EXPORT_ONLY_PATHS")]
    pub only_paths: bool,

    /// Do not mask values
    #[arg(long, env = "KVPORT_EXPORT_SHOW_VALUES")]
    pub show_values: bool,

    /// Maximum length of masked values, -1 to disable masking
    #[arg(long, env = "KVPORT_EXPORT_MAX_VALUE_LENGTH", allow_negative_numbers = true)]
    pub max_value_length: Option<i64>,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Execute a command.
pub fn execute(command: Command, store: StoreArgs) -> Result<()> {
    match command {
        Command::Import(args) => import::execute(args, &store),
        Command::Export(args) => export::execute(args, &store),
        Command::Completions { shell } => completions::execute(shell),
    }
}

/// Pick the backend: a file when one is given, a server otherwise.
///
/// # Errors
///
/// Returns `ConfigError::MissingAddress` or `ConfigError::MissingToken` when
/// no server is fully configured.
pub(crate) fn open_backend(store: &StoreArgs, settings: &Settings) -> Result<Box<dyn Backend>> {
    if let Some(path) = &store.backend_file {
        debug!(path = %path.display(), "using file backend");
        return Ok(Box::new(FileBackend::new(path)));
    }

    let address = store
        .address
        .clone()
        .or_else(|| settings.vault.address.clone())
        .filter(|a| !a.trim().is_empty())
        .ok_or(ConfigError::MissingAddress)?;
    let token = store
        .token
        .clone()
        .filter(|t| !t.is_empty())
        .map(Zeroizing::new)
        .ok_or(ConfigError::MissingToken)?;
    let namespace = store
        .namespace
        .clone()
        .or_else(|| settings.vault.namespace.clone());

    debug!(address = %address, "using vault backend");
    Ok(Box::new(VaultClient::new(&address, token, namespace)?))
}
