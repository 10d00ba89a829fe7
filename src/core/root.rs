//! Root path inference.
//!
//! Exported trees carry their location as a single top-level key. When the
//! user gives no destination, that key decides where an import goes.

use tracing::debug;

use crate::core::path::{self, handle_engine_path, normalize_path};
use crate::core::tree::SecretTree;
use crate::error::TreeError;

/// The single top-level key of a tree, normalized.
///
/// # Errors
///
/// Returns `TreeError::AmbiguousRoot` if the tree has zero or several
/// top-level keys, or its only key is nothing but delimiters.
pub fn resolve_root(tree: &SecretTree) -> Result<String, TreeError> {
    let mut keys = tree.keys();

    if let (Some(root), None) = (keys.next(), keys.next()) {
        let normalized = normalize_path(root);
        if !normalized.is_empty() {
            return Ok(normalized);
        }
    }

    Err(TreeError::AmbiguousRoot {
        candidates: tree.keys().cloned().collect(),
    })
}

/// How an inferred root should be interpreted.
///
/// A root made of several segments (`kv/prod`) can only be a mount whose
/// name contains the delimiter, so it is used as the engine path. A single
/// segment is used as a plain path, whose first segment then names the
/// mount anyway. This is a heuristic: a nested path like `secret/app`
/// exported as one key is indistinguishable from a two-segment mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    EnginePath,
    SubPath,
}

impl RootKind {
    /// Classify a root by counting its segments.
    pub fn classify(root: &str) -> Self {
        if path::segments(root).len() > 1 {
            RootKind::EnginePath
        } else {
            RootKind::SubPath
        }
    }
}

/// Where secrets are read from or written to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Destination {
    /// Explicit engine mount, may contain delimiters.
    pub engine_path: String,
    /// Path, below the engine if one is given.
    pub path: String,
}

impl Destination {
    pub fn new(engine_path: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            engine_path: engine_path.into(),
            path: path.into(),
        }
    }

    /// Derive a destination from a tree's root element.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::AmbiguousRoot` if the tree has no single root.
    pub fn infer(tree: &SecretTree) -> Result<Self, TreeError> {
        let root = resolve_root(tree)?;
        let kind = RootKind::classify(&root);
        debug!(root = %root, ?kind, "inferred root path");

        Ok(match kind {
            RootKind::EnginePath => Self::new(root, ""),
            RootKind::SubPath => Self::new("", root),
        })
    }

    /// Whether neither part is set.
    pub fn is_empty(&self) -> bool {
        normalize_path(&self.engine_path).is_empty() && normalize_path(&self.path).is_empty()
    }

    /// Engine mount and sub-path.
    pub fn split(&self) -> (String, String) {
        handle_engine_path(&self.engine_path, &self.path)
    }

    /// Full path of the destination.
    pub fn prefix(&self) -> String {
        let (root, sub) = self.split();
        path::join([root, sub])
    }
}
