//! **phpcloak** - PHP source tree obfuscator
//!
//! Copies a source tree and rewrites every selected PHP file: comments and
//! whitespace stripped, variables hashed, and (optionally) user-declared
//! functions and classes hashed consistently across all files.

use tracing_subscriber::EnvFilter;

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Obfuscation engine - recognizers, rewrites and the two-pass pipeline
pub mod core {
    /// Configurable regex recognizers for strings, variables, functions, classes
    pub mod patterns;
    pub use patterns::{Match, PatternConfig, PatternKind, PatternSet};

    /// Role-prefixed replacement tokens (MD5 or XXH3)
    pub mod hasher;
    pub use hasher::{DigestKind, NameHasher, Role};

    /// Substring search that ignores hits inside string literals
    pub mod exclusion;
    pub use exclusion::{Anchor, ExclusionIndex};

    /// Discovery and splicing of `<? ... ?>` code regions
    pub mod scanner;
    pub use scanner::{CodeBlockScanner, CodeRegion};

    /// Function and class names harvested by the first pass
    pub mod ledger;
    pub use ledger::{SealedLedger, SymbolLedger};

    /// PHP built-ins that are never renamed
    pub mod reserved;

    /// First pass: comments, whitespace, variables, name harvesting
    pub mod rewriter;
    pub use rewriter::{BlockRewriter, NameRules, RewriteOptions};

    /// Second pass: function and class renaming
    pub mod rename;
    pub use rename::FunctionRenamePass;

    /// Copy, first pass, seal, second pass
    pub mod pipeline;
    pub use pipeline::{Obfuscator, ObfuscatorUi, Stage};
}

/// Infrastructure - Configuration, I/O, and tree walking
pub mod infra {
    /// Layered configuration (file, environment, defaults)
    pub mod config;
    pub use config::{Config, init as config_init, load_config};

    /// Encoding-preserving file load/save, mmap for large files
    pub mod io;
    pub use io::{SourceFile, TextEncoding};

    /// Unfiltered tree walking with skip globs, target-file selection
    pub mod walk;
    pub use walk::{FileSelector, FileWalker};
}

/// Command handlers
pub mod cli_ext {
    pub mod console;
    pub mod patterns_cmd;
    pub mod run_cmd;
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli, Commands};
pub use core::{Obfuscator, ObfuscatorUi, Stage};
pub use infra::{Config, load_config};

/// Install the global stderr subscriber. `RUST_LOG` wins when set.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "phpcloak=info" } else { "phpcloak=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
