//! Terminal collaborators for the obfuscation pipeline.
//!
//! `ConsoleUi` drives an indicatif spinner during a run and prints the
//! outcome; `LineUi` prints each status update as a plain line (pattern
//! listings, dry-run plans).

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use crate::cli::AppContext;
use crate::core::pipeline::ObfuscatorUi;

pub struct ConsoleUi {
    spinner: ProgressBar,
    quiet: bool,
    color: bool,
    updates: usize,
}

impl ConsoleUi {
    pub fn new(ctx: &AppContext) -> Self {
        // Hidden in --quiet mode
        let spinner = if ctx.quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new_spinner();
            let style = ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            pb.set_style(style);
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        };

        Self {
            spinner,
            quiet: ctx.quiet,
            color: !ctx.no_color,
            updates: 0,
        }
    }

    /// Status updates received so far.
    pub fn updates(&self) -> usize {
        self.updates
    }
}

impl ObfuscatorUi for ConsoleUi {
    fn status_update(&mut self, message: &str) {
        self.updates += 1;
        self.spinner.set_message(message.to_string());
    }

    fn error(&mut self, message: &str) {
        self.spinner.abandon_with_message("Obfuscation failed");
        if self.color {
            eprintln!("{} {}", "error:".red().bold(), message);
        } else {
            eprintln!("error: {message}");
        }
    }

    fn done(&mut self) {
        self.spinner.finish_and_clear();
        if self.quiet {
            return;
        }

        let summary = format!("Obfuscation complete ({} steps)", self.updates);
        if self.color {
            println!("{} {}", "✓".green(), summary);
        } else {
            println!("{summary}");
        }
    }
}

/// Prints every status update on its own stdout line.
#[derive(Debug, Default)]
pub struct LineUi {
    pub color: bool,
}

impl ObfuscatorUi for LineUi {
    fn status_update(&mut self, message: &str) {
        match message.split_once(": ") {
            Some((label, rest)) if self.color => println!("{}: {}", label.cyan(), rest),
            _ => println!("{message}"),
        }
    }

    fn error(&mut self, message: &str) {
        eprintln!("error: {message}");
    }

    fn done(&mut self) {}
}
