//! Import flow.
//!
//! Writes a parsed secret tree into a backend, or previews what such a write
//! would change. The backend and the output sink are passed in, so the flow
//! runs the same against a live server, a file or memory.

use std::io::Write;
use tracing::{debug, info};

use crate::core::backend::Backend;
use crate::core::merge::deep_merge;
use crate::core::path::{self, flatten, normalize_path, strip_path_prefix, unflatten};
use crate::core::render::{RenderOptions, Renderer};
use crate::core::root::{resolve_root, Destination};
use crate::core::tree::{FlatSecretSet, SecretTree};
use crate::error::{BackendError, ConfigError, Error, Result, TreeError};

/// Options for a single import.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Where to write. Inferred from the input's root element when empty.
    pub destination: Destination,
    /// Write into an engine that is already enabled.
    pub force: bool,
    /// Preview the merged result without writing.
    pub dry_run: bool,
    /// Skip rendering the result after writing.
    pub silent: bool,
    /// How previews and results are rendered.
    pub render: RenderOptions,
}

impl ImportOptions {
    /// Reject flag combinations that make no sense together.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.force && self.dry_run {
            return Err(ConfigError::InvalidFlagCombination(
                "cannot specify both --force and --dry-run",
            ));
        }
        if self.silent && self.dry_run {
            return Err(ConfigError::InvalidFlagCombination(
                "cannot specify both --silent and --dry-run",
            ));
        }
        self.render.validate()
    }
}

/// What an import did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// Dry run: the input already matches the store.
    NoChanges,
    /// Dry run: a merged preview was rendered.
    Preview,
    /// Secrets were written.
    Imported { written: usize },
}

/// Map every leaf of `secrets` to its destination path.
///
/// If the input has a single root element it is replaced by
/// `engine/sub_path`; otherwise all top-level keys are placed beneath it.
///
/// # Errors
///
/// Returns `TreeError::Malformed` if a secret would land on the engine mount
/// itself or the tree cannot be flattened.
pub fn plan_writes(secrets: &SecretTree, engine: &str, sub_path: &str) -> Result<FlatSecretSet> {
    let input_root = resolve_root(secrets).ok();
    let engine = normalize_path(engine);
    let mut targets = FlatSecretSet::new();

    for (source, leaf) in flatten(secrets, "")? {
        let relative = input_root
            .as_deref()
            .and_then(|root| strip_path_prefix(&source, root))
            .unwrap_or_else(|| source.clone());

        let target = path::join([engine.as_str(), sub_path, relative.as_str()]);
        if target == engine {
            return Err(TreeError::malformed(
                source,
                format!("secret would be written at the engine mount \"{}\" itself", engine),
            )
            .into());
        }
        if targets.insert(target.clone(), leaf).is_some() {
            return Err(TreeError::malformed(target, "path appears more than once").into());
        }
    }

    Ok(targets)
}

/// Runs imports against a backend, reporting progress to `out`.
pub struct Importer<'a, B: Backend + ?Sized, W: Write> {
    backend: &'a B,
    out: W,
    options: ImportOptions,
    renderer: Renderer,
}

impl<'a, B: Backend + ?Sized, W: Write> Importer<'a, B, W> {
    /// Validate `options` and build an importer.
    pub fn new(backend: &'a B, out: W, options: ImportOptions) -> Result<Self> {
        options.validate()?;
        let renderer = Renderer::new(options.render.clone())?;
        Ok(Self {
            backend,
            out,
            options,
            renderer,
        })
    }

    /// Give back the output sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Import `secrets`.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::AmbiguousRoot` if no destination was given and
    /// none can be inferred, `BackendError::EngineExists` if the engine is
    /// enabled and `force` is not set, and any backend or render error. The
    /// first failed write aborts the import.
    pub fn run(&mut self, secrets: &SecretTree) -> Result<ImportOutcome> {
        let destination = self.destination(secrets)?;
        let (engine, sub_path) = destination.split();
        let prefix = destination.prefix();

        let targets = plan_writes(secrets, &engine, &sub_path)?;
        debug!(engine = %engine, sub_path = %sub_path, count = targets.len(), "planned writes");

        if self.options.dry_run {
            return self.dry_run(&engine, &sub_path, &prefix, &targets);
        }

        match self.backend.enable_engine(&engine) {
            Ok(()) => info!(engine = %engine, "enabled KV engine"),
            Err(Error::Backend(BackendError::EngineExists(_))) if self.options.force => {
                debug!(engine = %engine, "engine exists, continuing because of --force");
            }
            Err(e) => return Err(e),
        }

        let written = self.write_secrets(&engine, &targets)?;

        if !self.options.silent {
            self.print_result(&engine, &sub_path, &prefix)?;
        }

        Ok(ImportOutcome::Imported { written })
    }

    fn destination(&mut self, secrets: &SecretTree) -> Result<Destination> {
        if !self.options.destination.is_empty() {
            return Ok(self.options.destination.clone());
        }

        writeln!(
            self.out,
            "no path specified, trying to determine root path from the provided input"
        )?;
        let destination = Destination::infer(secrets)?;
        writeln!(self.out, "using \"{}\" as KV engine path", destination.prefix())?;
        Ok(destination)
    }

    fn dry_run(
        &mut self,
        engine: &str,
        sub_path: &str,
        prefix: &str,
        targets: &FlatSecretSet,
    ) -> Result<ImportOutcome> {
        writeln!(self.out, "fetching KV secrets from \"{}\" (if any)", prefix)?;

        let existing_flat = self.backend.read_tree_recursive(engine, sub_path, true)?;
        if existing_flat.is_empty() {
            writeln!(self.out, "no secrets found - nothing to compare with")?;
        }

        let incoming = unflatten(prefix, targets, engine)?;
        let existing = unflatten(prefix, &existing_flat, engine)?;

        if incoming == existing {
            writeln!(self.out)?;
            writeln!(self.out, "input matches secrets - no changes needed:")?;
            writeln!(self.out)?;
            self.renderer.write_to(&existing, &mut self.out)?;
            return Ok(ImportOutcome::NoChanges);
        }

        writeln!(
            self.out,
            "deep merging provided secrets with existing secrets read from \"{}\"",
            prefix
        )?;
        writeln!(self.out)?;
        writeln!(self.out, "preview:")?;
        writeln!(self.out)?;
        self.renderer
            .write_to(&deep_merge(&incoming, &existing), &mut self.out)?;
        writeln!(self.out)?;
        writeln!(self.out, "apply changes by using the --force flag")?;

        Ok(ImportOutcome::Preview)
    }

    fn write_secrets(&mut self, engine: &str, targets: &FlatSecretSet) -> Result<usize> {
        for (target, leaf) in targets {
            let relative = strip_path_prefix(target, engine).unwrap_or_else(|| target.clone());

            if let Err(e) = self.backend.write_leaf(engine, &relative, leaf) {
                return Err(match e {
                    Error::Backend(source) => BackendError::WriteFailed {
                        path: target.clone(),
                        source: Box::new(source),
                    }
                    .into(),
                    other => other,
                });
            }

            info!(path = %target, "wrote secret");
            writeln!(self.out, "writing secret \"{}\"", target)?;
        }

        writeln!(self.out, "successfully imported all secrets")?;
        Ok(targets.len())
    }

    fn print_result(&mut self, engine: &str, sub_path: &str, prefix: &str) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "result:")?;
        writeln!(self.out)?;

        let flat = self.backend.read_tree_recursive(engine, sub_path, false)?;
        let result = unflatten(prefix, &flat, engine)?;
        self.renderer.write_to(&result, &mut self.out)
    }
}
