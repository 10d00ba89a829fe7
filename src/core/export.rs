//! Export flow.
//!
//! Reads a subtree from a backend and renders it. The output of the JSON and
//! YAML formats can be fed back into an import.

use std::io::Write;
use tracing::{debug, warn};

use crate::core::backend::Backend;
use crate::core::path::unflatten;
use crate::core::render::{RenderOptions, Renderer};
use crate::core::root::Destination;
use crate::core::tree::SecretTree;
use crate::error::{ConfigError, Result};

/// Options for a single export.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub destination: Destination,
    pub render: RenderOptions,
}

/// Reads secrets from a backend and renders them to `out`.
pub struct Exporter<'a, B: Backend + ?Sized, W: Write> {
    backend: &'a B,
    out: W,
    destination: Destination,
    renderer: Renderer,
}

impl<'a, B: Backend + ?Sized, W: Write> Exporter<'a, B, W> {
    /// Validate `options` and build an exporter.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if no location is given or the render options
    /// are inconsistent.
    pub fn new(backend: &'a B, out: W, options: ExportOptions) -> Result<Self> {
        if options.destination.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "path",
                reason: "a path or engine path is required".to_string(),
            }
            .into());
        }

        Ok(Self {
            backend,
            out,
            destination: options.destination,
            renderer: Renderer::new(options.render)?,
        })
    }

    /// Give back the output sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Read the tree below the destination, rooted at its engine mount.
    pub fn read(&self) -> Result<SecretTree> {
        let (engine, sub_path) = self.destination.split();
        let flat = self.backend.read_tree_recursive(&engine, &sub_path, false)?;
        debug!(engine = %engine, sub_path = %sub_path, count = flat.len(), "read secrets for export");

        Ok(unflatten(&self.destination.prefix(), &flat, &engine)?)
    }

    /// Read and render. Returns the number of secrets rendered.
    pub fn run(&mut self) -> Result<usize> {
        let tree = self.read()?;
        if tree.is_empty() {
            warn!(path = %self.destination.prefix(), "no secrets found");
        }

        self.renderer.write_to(&tree, &mut self.out)?;
        Ok(tree.leaf_count())
    }
}
