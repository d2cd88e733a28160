//! `cloak run`: load config, apply flag overrides, drive the pipeline.

use anyhow::{Context, Result, anyhow};
use owo_colors::OwoColorize;
use tracing::debug;

use crate::cli::{AppContext, RunArgs};
use crate::cli_ext::console::ConsoleUi;
use crate::core::pipeline::{Obfuscator, Stage};
use crate::infra::config::{Config, load_config};

pub fn run(args: RunArgs, ctx: &AppContext) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, &args);
    debug!(?config, "effective configuration");

    let obfuscator = Obfuscator::from_config(&config).context("Invalid configuration")?;

    if ctx.dry_run {
        return print_plan(&obfuscator, &config, ctx);
    }

    let stage = if args.background {
        let handle = obfuscator
            .spawn(ConsoleUi::new(ctx))
            .context("Failed to start obfuscation worker")?;
        handle
            .join()
            .map_err(|_| anyhow!("Obfuscation worker panicked"))?
    } else {
        let mut ui = ConsoleUi::new(ctx);
        obfuscator.run(&mut ui)
    };

    if stage == Stage::Error {
        anyhow::bail!("Obfuscation failed");
    }
    Ok(())
}

/// Command-line values win over config for this run; exclusion lists extend.
pub fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(source) = &args.source {
        config.source_dir = source.clone();
    }
    if let Some(target) = &args.target {
        config.target_dir = target.clone();
    }
    if !args.files.is_empty() {
        config.files = args.files.clone();
    }
    if let Some(on) = args.remove_whitespace {
        config.remove_whitespace = on;
    }
    if let Some(on) = args.rename_variables {
        config.rename_variables = on;
    }
    if let Some(on) = args.rename_functions {
        config.rename_functions = on;
    }
    if let Some(digest) = args.digest {
        config.digest = digest;
    }

    config
        .exclude_variables
        .extend(args.exclude_variables.iter().cloned());
    config
        .exclude_functions
        .extend(args.exclude_functions.iter().cloned());
}

fn print_plan(obfuscator: &Obfuscator, config: &Config, ctx: &AppContext) -> Result<()> {
    let plan = obfuscator
        .plan()
        .context("Failed to plan obfuscation")?;

    if ctx.quiet {
        return Ok(());
    }

    println!(
        "Would copy {} files from {} to {}",
        plan.copies.len(),
        config.source_dir.display(),
        config.target_dir.display()
    );

    for (rel, regions) in &plan.targets {
        let path = rel.display().to_string();
        let path = if ctx.no_color { path } else { path.cyan().to_string() };

        match regions {
            Some(n) => println!("  obfuscate {path} ({n} code regions)"),
            None => println!("  skip {path} (not a .{} file)", config.extension),
        }
    }

    let options = obfuscator.options();
    println!(
        "remove whitespace: {}, rename variables: {}, rename functions: {}",
        options.remove_whitespace, options.rename_variables, options.rename_functions
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::core::hasher::DigestKind;

    fn args() -> RunArgs {
        RunArgs {
            config: None,
            source: None,
            target: None,
            files: Vec::new(),
            remove_whitespace: None,
            rename_variables: None,
            rename_functions: None,
            exclude_variables: Vec::new(),
            exclude_functions: Vec::new(),
            digest: None,
            background: false,
        }
    }

    #[test]
    fn test_no_flags_keep_config() {
        let mut config = Config::default();
        apply_overrides(&mut config, &args());

        assert_eq!(config.files, Config::default().files);
        assert!(config.remove_whitespace);
        assert!(!config.rename_functions);
    }

    #[test]
    fn test_flags_override_and_extend() {
        let mut config = Config::default();
        let before = config.exclude_variables.len();

        apply_overrides(
            &mut config,
            &RunArgs {
                target: Some(PathBuf::from("dist")),
                files: vec!["app/**/*.php".to_string()],
                remove_whitespace: Some(false),
                rename_functions: Some(true),
                exclude_variables: vec!["db".to_string()],
                exclude_functions: vec!["render".to_string()],
                digest: Some(DigestKind::Xxh3),
                ..args()
            },
        );

        assert_eq!(config.target_dir, PathBuf::from("dist"));
        assert_eq!(config.files, vec!["app/**/*.php".to_string()]);
        assert!(!config.remove_whitespace);
        assert!(config.rename_variables);
        assert!(config.rename_functions);
        assert_eq!(config.exclude_variables.len(), before + 1);
        assert_eq!(config.exclude_functions, vec!["render".to_string()]);
        assert_eq!(config.digest, DigestKind::Xxh3);
    }
}
