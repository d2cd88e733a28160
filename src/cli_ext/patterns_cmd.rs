//! `cloak patterns`: print the recognizer patterns a run would use.

use anyhow::{Context, Result};

use crate::cli::{AppContext, PatternsArgs};
use crate::cli_ext::console::LineUi;
use crate::core::pipeline::Obfuscator;
use crate::infra::config::load_config;

pub fn run(args: PatternsArgs, ctx: &AppContext) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let obfuscator = Obfuscator::from_config(&config).context("Invalid configuration")?;

    let mut ui = LineUi { color: !ctx.no_color };
    obfuscator.output_patterns(&mut ui);
    Ok(())
}
