//! kvport - Browse, export and re-import trees of secrets.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kvport::cli::output;
use kvport::cli::{execute, Cli};
use kvport::core::constants::LOG_ENV;
use kvport::error::{BackendError, ConfigError, Error, TreeError};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("kvport=debug")
        } else {
            EnvFilter::new("kvport=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(e) = execute(cli.command, cli.store) {
        // Format error with suggestion if available
        let suggestion = match &e {
            Error::Tree(TreeError::AmbiguousRoot { .. }) => {
                Some("try specifying a destination path using -p/-e")
            }
            Error::Backend(BackendError::EngineExists(_)) => {
                Some("use --force to write into an existing engine")
            }
            Error::Config(ConfigError::MissingAddress) => {
                Some("set VAULT_ADDR, pass --address, or use --backend-file")
            }
            Error::Config(ConfigError::MissingToken) => Some("set VAULT_TOKEN or pass --token"),
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
