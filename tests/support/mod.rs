//! Test support utilities for kvport integration tests.
//!
//! Provides an isolated environment backed by a store file, plus helpers
//! for running the binary against it.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test environment with isolated temp directories.
///
/// Each test gets its own working dir, home dir and store file. No
/// process-global state is mutated, so tests can run in parallel.
pub struct Test {
    /// Temporary working directory, also holds the store file
    pub dir: TempDir,
    /// Temporary home directory, keeps user config out of the way
    pub home: TempDir,
}

impl Test {
    /// Create a new environment with an empty store.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let home = TempDir::new().expect("failed to create temp home");

        Self { dir, home }
    }

    /// Create an environment whose store already holds `engines`.
    ///
    /// `engines` maps each mount to its secrets, keyed by path relative to
    /// the mount.
    pub fn with_store(engines: Value) -> Self {
        let t = Self::new();
        let doc = serde_json::json!({ "engines": engines });
        std::fs::write(t.store_path(), serde_json::to_string_pretty(&doc).unwrap())
            .expect("failed to seed store");
        t
    }

    /// Path of the JSON store file.
    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join("store.json")
    }

    /// Current store contents.
    pub fn store(&self) -> Value {
        let contents = std::fs::read_to_string(self.store_path()).expect("store file missing");
        serde_json::from_str(&contents).expect("store file is not JSON")
    }

    /// Write a file into the working directory and return its path.
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).expect("failed to write file");
        path
    }
}
