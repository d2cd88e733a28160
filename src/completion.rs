//! Shell completion scripts for `cloak`.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::Shell as CompletionShell;

use crate::cli::{AppContext, Cli, CompletionsArgs, Shell};

fn completion_shell(shell: &Shell) -> CompletionShell {
    match shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    }
}

/// Binary name baked into the scripts; follows `#[command(name)]`.
fn bin_name() -> String {
    Cli::command()
        .get_name()
        .to_string()
}

/// Write the script for `shell` to `out`.
pub fn render(shell: &Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    clap_complete::generate(completion_shell(shell), &mut cmd, bin_name(), out);
}

/// Write the script for `shell` into `dir` (created if missing); returns its path.
pub fn write_to_dir(shell: &Shell, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut cmd = Cli::command();
    clap_complete::generate_to(completion_shell(shell), &mut cmd, bin_name(), dir)
        .with_context(|| format!("Failed to write completion into {}", dir.display()))
}

pub fn run(args: CompletionsArgs, ctx: &AppContext) -> Result<()> {
    if args.stdout {
        render(&args.shell, &mut std::io::stdout());
        return Ok(());
    }

    let Some(dir) = args.out_dir else {
        anyhow::bail!("--out-dir is required unless --stdout is set");
    };

    if ctx.dry_run {
        eprintln!("Would write {:?} completion into {}", args.shell, dir.display());
        return Ok(());
    }

    let path = write_to_dir(&args.shell, &dir)?;
    if !ctx.quiet {
        eprintln!("Wrote completion to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_names_the_binary_and_subcommands() {
        let mut out = Vec::new();
        render(&Shell::Bash, &mut out);
        let script = String::from_utf8(out).unwrap();

        assert!(script.contains("cloak"));
        assert!(script.contains("patterns"));
        assert!(script.contains("--rename-functions"));
    }

    #[test]
    fn test_write_to_dir_creates_file() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let nested = dir.path().join("completions");

        let path = write_to_dir(&Shell::Zsh, &nested)?;

        assert!(path.starts_with(&nested));
        assert!(std::fs::metadata(&path)?.len() > 0);
        Ok(())
    }
}
