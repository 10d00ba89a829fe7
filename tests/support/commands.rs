//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::path::Path;
use std::process::Output;

impl Test {
    /// Create a kvport command bound to this environment.
    ///
    /// Returns a Command configured with:
    /// - HOME and XDG_CONFIG_HOME inside the temporary home directory
    /// - the store file as backend
    /// - no server settings or kvport variables inherited from the caller
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("kvport").expect("failed to find kvport binary");
        for var in ["VAULT_ADDR", "VAULT_TOKEN", "VAULT_NAMESPACE", "KVPORT_CONFIG", "KVPORT_LOG"] {
            cmd.env_remove(var);
        }
        cmd.env("HOME", self.home.path());
        cmd.env("XDG_CONFIG_HOME", self.home.path().join(".config"));
        cmd.env("NO_COLOR", "1");
        cmd.env("KVPORT_BACKEND_FILE", self.store_path());
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Like [`Test::cmd`], without a store file.
    pub fn cmd_without_store(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.env_remove("KVPORT_BACKEND_FILE");
        cmd
    }

    /// Shortcut for `kvport import --file <path>`.
    pub fn import_file(&self, file: &Path, args: &[&str]) -> Output {
        self.cmd()
            .arg("import")
            .arg("--file")
            .arg(file)
            .args(args)
            .output()
            .expect("failed to run kvport import")
    }

    /// Shortcut for `kvport import` reading `input` from STDIN.
    pub fn import_stdin(&self, input: &str, args: &[&str]) -> Output {
        self.cmd()
            .arg("import")
            .args(args)
            .write_stdin(input)
            .output()
            .expect("failed to run kvport import")
    }

    /// Shortcut for `kvport export`.
    pub fn export(&self, args: &[&str]) -> Output {
        self.cmd()
            .arg("export")
            .args(args)
            .output()
            .expect("failed to run kvport export")
    }
}
