//! Secret-store backends.
//!
//! The import and export flows only talk to a store through the [`Backend`]
//! trait, so they can run against a real KV v2 server, a JSON file on disk or
//! an in-memory map.
//!
//! ## Adding a New Backend
//!
//! 1. Implement the `Backend` trait
//! 2. Add the implementation in a new file (e.g., `consul.rs`)
//! 3. Re-export from this module

use crate::core::tree::{FlatSecretSet, SecretLeaf};
use crate::error::Result;

mod file;
mod memory;
mod vault;

pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use vault::VaultClient;

/// Operations the import/export flows need from a KV store.
pub trait Backend {
    /// Mount a KV v2 engine at `path`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::EngineExists` if something is already mounted
    /// there.
    fn enable_engine(&self, path: &str) -> Result<()>;

    /// Write `leaf` at `path` below the engine mounted at `engine_path`,
    /// replacing whatever was stored there.
    fn write_leaf(&self, engine_path: &str, path: &str, leaf: &SecretLeaf) -> Result<()>;

    /// Read every secret below `engine_path/sub_path`.
    ///
    /// Keys of the result are full paths including the engine path. A
    /// location that does not exist yields an empty set. `include_metadata`
    /// asks the backend to consult version metadata where it has any.
    fn read_tree_recursive(
        &self,
        engine_path: &str,
        sub_path: &str,
        include_metadata: bool,
    ) -> Result<FlatSecretSet>;
}
