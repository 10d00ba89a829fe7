//! In-memory backend.
//!
//! Also provides [`Mounts`], the engine table shared with the file backend.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::Backend;
use crate::core::path::{self, normalize_path, strip_path_prefix};
use crate::core::tree::{FlatSecretSet, SecretLeaf};
use crate::error::{BackendError, Result};

/// Mounted engines and the secrets stored in each, keyed by path relative to
/// the mount.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Mounts {
    #[serde(default)]
    engines: BTreeMap<String, FlatSecretSet>,
}

impl Mounts {
    pub(crate) fn enable(&mut self, path: &str) -> std::result::Result<(), BackendError> {
        let engine = normalize_path(path);
        if self.engines.contains_key(&engine) {
            return Err(BackendError::EngineExists(engine));
        }
        self.engines.insert(engine, FlatSecretSet::new());
        Ok(())
    }

    pub(crate) fn write(
        &mut self,
        engine_path: &str,
        path: &str,
        leaf: &SecretLeaf,
    ) -> std::result::Result<(), BackendError> {
        let engine = normalize_path(engine_path);
        let secrets = self
            .engines
            .get_mut(&engine)
            .ok_or(BackendError::EngineNotFound(engine))?;
        secrets.insert(normalize_path(path), leaf.clone());
        Ok(())
    }

    pub(crate) fn read(&self, engine_path: &str, sub_path: &str) -> FlatSecretSet {
        let engine = normalize_path(engine_path);
        let Some(secrets) = self.engines.get(&engine) else {
            return FlatSecretSet::new();
        };

        secrets
            .iter()
            .filter(|(relative, _)| strip_path_prefix(relative, sub_path).is_some())
            .map(|(relative, leaf)| (path::join([engine.as_str(), relative.as_str()]), leaf.clone()))
            .collect()
    }
}

/// Backend holding everything in memory.
///
/// Counts writes, which makes it convenient for checking what an import
/// actually did.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    mounts: Mutex<Mounts>,
    writes: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `write_leaf` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn mounts(&self) -> std::sync::MutexGuard<'_, Mounts> {
        self.mounts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Backend for MemoryBackend {
    fn enable_engine(&self, path: &str) -> Result<()> {
        self.mounts().enable(path)?;
        Ok(())
    }

    fn write_leaf(&self, engine_path: &str, path: &str, leaf: &SecretLeaf) -> Result<()> {
        self.mounts().write(engine_path, path, leaf)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn read_tree_recursive(
        &self,
        engine_path: &str,
        sub_path: &str,
        _include_metadata: bool,
    ) -> Result<FlatSecretSet> {
        Ok(self.mounts().read(engine_path, sub_path))
    }
}
