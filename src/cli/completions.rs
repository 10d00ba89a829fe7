//! Completions command.

use clap::CommandFactory;
use clap_complete::Shell as CompletionShell;
use std::io::{self, Write};

use crate::cli::{Cli, Shell};
use crate::error::Result;

impl From<Shell> for CompletionShell {
    fn from(shell: Shell) -> Self {
        match shell {
            Shell::Bash => CompletionShell::Bash,
            Shell::Zsh => CompletionShell::Zsh,
            Shell::Fish => CompletionShell::Fish,
            Shell::PowerShell => CompletionShell::PowerShell,
        }
    }
}

/// Write the completion script for `shell` to `out`.
pub fn write_script<W: Write>(shell: Shell, out: &mut W) {
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();
    clap_complete::generate(CompletionShell::from(shell), &mut cmd, bin, out);
}

/// Print the completion script to stdout.
pub fn execute(shell: Shell) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_script(shell, &mut out);
    out.flush()?;
    Ok(())
}
