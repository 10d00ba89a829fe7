//! Export command - render the secrets below a path.

use std::io;
use tracing::info;

use crate::cli::{output, ExportArgs, StoreArgs};
use crate::core::config::Settings;
use crate::core::export::{ExportOptions, Exporter};
use crate::core::render::{Format, RenderOptions};
use crate::core::root::Destination;
use crate::error::Result;

/// Export secrets to stdout.
pub fn execute(args: ExportArgs, store: &StoreArgs) -> Result<()> {
    let settings = Settings::load(store.config.as_deref())?;
    let format = match args.format {
        Some(format) => format,
        None => settings.format()?,
    };

    let options = ExportOptions {
        destination: Destination::new(
            args.engine_path.unwrap_or_default(),
            args.path.unwrap_or_default(),
        ),
        render: RenderOptions {
            format,
            // Shell exports are meant to be eval'd, so they carry real values.
            mask_values: format != Format::Export && !(args.show_values || settings.show_values()),
            mask_length: args
                .max_value_length
                .unwrap_or_else(|| settings.max_value_length()),
            only_keys: args.only_keys,
            only_paths: args.only_paths,
        },
    };

    let backend = super::open_backend(store, &settings)?;
    let stdout = io::stdout();
    let mut exporter = Exporter::new(backend.as_ref(), stdout.lock(), options)?;

    let count = exporter.run()?;
    if count == 0 {
        output::warn("no secrets found");
    }
    info!(count, "export finished");

    Ok(())
}
