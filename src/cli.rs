use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::hasher::DigestKind;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub dry_run: bool,  // global --dry-run
}

#[derive(Parser)]
#[command(name = "cloak")]
#[command(about = "Obfuscate a PHP source tree by hashing variable, function and class names")]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress progress and non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Show what would be done without executing
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Emit info-level logs on stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Copy the source tree and obfuscate the selected files
    Run(RunArgs),

    /// Print the active recognizer patterns
    Patterns(PatternsArgs),

    /// Initialize a phpcloak.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Config file (defaults to phpcloak.toml in the working directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory to copy from
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Directory to create; deleted first if it exists
    #[arg(short, long)]
    pub target: Option<PathBuf>,

    /// Globs relative to the source directory selecting files to obfuscate
    #[arg(short, long = "files", value_name = "GLOB")]
    pub files: Vec<String>,

    /// Strip line comments and collapse tabs/newlines
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true", action = ArgAction::Set)]
    pub remove_whitespace: Option<bool>,

    /// Replace variables with hashed tokens
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true", action = ArgAction::Set)]
    pub rename_variables: Option<bool>,

    /// Replace declared functions and classes with hashed tokens
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true", action = ArgAction::Set)]
    pub rename_functions: Option<bool>,

    /// Variable never renamed (repeatable; `$` optional)
    #[arg(long = "exclude-variable", value_name = "NAME")]
    pub exclude_variables: Vec<String>,

    /// Function never renamed (repeatable)
    #[arg(long = "exclude-function", value_name = "NAME")]
    pub exclude_functions: Vec<String>,

    /// Digest behind replacement tokens
    #[arg(long, value_enum)]
    pub digest: Option<DigestKind>,

    /// Run the pipeline on a background worker thread
    #[arg(long)]
    pub background: bool,
}

#[derive(Debug, Parser)]
pub struct PatternsArgs {
    /// Config file (defaults to phpcloak.toml in the working directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}
