//! File-based backend.
//!
//! Stores mounted engines and their secrets in a single JSON document, for
//! offline mirrors of a store and for testing.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::memory::Mounts;
use super::Backend;
use crate::core::tree::{FlatSecretSet, SecretLeaf};
use crate::error::{BackendError, Result};

/// Backend persisted to a JSON file.
///
/// The file is read on every call and rewritten after every change. A
/// missing file is an empty store.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> std::result::Result<Mounts, BackendError> {
        if !self.path.exists() {
            return Ok(Mounts::default());
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Mounts::default());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, mounts: &Mounts) -> std::result::Result<(), BackendError> {
        debug!(path = %self.path.display(), "saving backend file");
        let mut content = serde_json::to_string_pretty(mounts)?;
        content.push('\n');

        #[cfg(unix)]
        {
            use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

            let mut file = fs::OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .mode(0o600)
                .open(&self.path)?;
            file.write_all(content.as_bytes())?;
            file.flush()?;

            // Tighten permissions on files that existed before.
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        #[cfg(not(unix))]
        {
            let mut file = fs::File::create(&self.path)?;
            file.write_all(content.as_bytes())?;
        }

        Ok(())
    }
}

impl Backend for FileBackend {
    fn enable_engine(&self, path: &str) -> Result<()> {
        let mut mounts = self.load()?;
        mounts.enable(path)?;
        self.save(&mounts)?;
        Ok(())
    }

    fn write_leaf(&self, engine_path: &str, path: &str, leaf: &SecretLeaf) -> Result<()> {
        let mut mounts = self.load()?;
        mounts.write(engine_path, path, leaf)?;
        self.save(&mounts)?;
        Ok(())
    }

    fn read_tree_recursive(
        &self,
        engine_path: &str,
        sub_path: &str,
        _include_metadata: bool,
    ) -> Result<FlatSecretSet> {
        Ok(self.load()?.read(engine_path, sub_path))
    }
}
