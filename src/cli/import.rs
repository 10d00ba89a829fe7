//! Import command - write secrets from kvport JSON/YAML output into a store.

use std::io::{self, Read};
use std::path::Path;
use tracing::info;

use crate::cli::{output, ImportArgs, StoreArgs};
use crate::core::config::Settings;
use crate::core::import::{ImportOptions, ImportOutcome, Importer};
use crate::core::input;
use crate::core::render::{Format, RenderOptions};
use crate::core::root::Destination;
use crate::error::{ConfigError, Result};

/// Import secrets from a file or STDIN.
pub fn execute(args: ImportArgs, store: &StoreArgs) -> Result<()> {
    if args.file.is_some() && args.source.as_deref() == Some("-") {
        return Err(ConfigError::InvalidFlagCombination(
            "cannot specify both --file and read from STDIN",
        )
        .into());
    }

    let settings = Settings::load(store.config.as_deref())?;

    let options = ImportOptions {
        destination: Destination::new(
            args.engine_path.unwrap_or_default(),
            args.path.unwrap_or_default(),
        ),
        force: args.force,
        dry_run: args.dry_run,
        silent: args.silent,
        render: RenderOptions {
            format: Format::Native,
            mask_values: !(args.show_values || settings.show_values()),
            mask_length: args
                .max_value_length
                .unwrap_or_else(|| settings.max_value_length()),
            ..Default::default()
        },
    };
    options.validate()?;

    let bytes = read_input(args.file.as_deref())?;
    let (secrets, format) = input::parse_input(&bytes)?;
    output::dimmed(&format!("parsing secrets from {}", format));

    let backend = super::open_backend(store, &settings)?;
    let stdout = io::stdout();
    let mut importer = Importer::new(backend.as_ref(), stdout.lock(), options)?;

    match importer.run(&secrets)? {
        ImportOutcome::Imported { written } => info!(written, "import finished"),
        outcome => info!(?outcome, "dry run finished"),
    }

    Ok(())
}

fn read_input(file: Option<&Path>) -> Result<Vec<u8>> {
    match file {
        Some(path) => {
            let bytes = std::fs::read(path)?;
            let shown = output::path(&path.display().to_string());
            output::dimmed(&format!("reading secrets from {}", shown));
            Ok(bytes)
        }
        None => {
            let mut bytes = Vec::new();
            io::stdin().lock().read_to_end(&mut bytes)?;
            output::dimmed("reading secrets from STDIN");
            Ok(bytes)
        }
    }
}
