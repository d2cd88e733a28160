use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::{AppContext, InitArgs};
use crate::core::hasher::DigestKind;
use crate::core::patterns::PatternConfig;

/// Config file names searched in the working directory, in priority order
pub const CONFIG_FILES: [&str; 4] = ["phpcloak.toml", ".phpcloak.toml", "phpcloak.yaml", "phpcloak.json"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Tree to copy from
    pub source_dir: PathBuf,

    /// Tree to create; deleted first if it exists
    pub target_dir: PathBuf,

    /// Globs (relative to `source_dir`) selecting files to obfuscate
    pub files: Vec<String>,

    /// Globs (relative to `source_dir`) left out of the copy
    pub skip: Vec<String>,

    /// Source extension of the scripting language, without the dot
    pub extension: String,

    /// Strip line comments and collapse tabs/newlines
    pub remove_whitespace: bool,

    /// Replace variables with hashed tokens
    pub rename_variables: bool,

    /// Replace declared functions and classes with hashed tokens
    pub rename_functions: bool,

    /// Variables never renamed (`$this`, superglobals, globals from plain files)
    pub exclude_variables: Vec<String>,

    /// Functions never renamed, on top of the PHP built-ins
    pub exclude_functions: Vec<String>,

    /// Marker line written at the top of every obfuscated file
    pub banner: String,

    /// Digest behind every replacement token
    pub digest: DigestKind,

    /// Recognizer patterns
    pub patterns: PatternConfig,
}

impl Default for Config
{
    fn default() -> Self
    {
        Self {
            source_dir: PathBuf::from("."),
            target_dir: PathBuf::from("obfuscated"),
            files: vec!["**/*.php".to_string()],
            skip: vec![".git".to_string()],
            extension: "php".to_string(),
            remove_whitespace: true,
            rename_variables: true,
            rename_functions: false,
            exclude_variables: [
                "$this",
                "$GLOBALS",
                "$_SERVER",
                "$_GET",
                "$_POST",
                "$_FILES",
                "$_COOKIE",
                "$_SESSION",
                "$_REQUEST",
                "$_ENV",
                "$argc",
                "$argv",
                "$http_response_header",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            exclude_functions: Vec::new(),
            banner: "<?php /* This file encoded by phpcloak */ ?>\n".to_string(),
            digest: DigestKind::default(),
            patterns: PatternConfig::default(),
        }
    }
}

/// Load configuration from `explicit` (must exist) or the first config file
/// found in the working directory, then `PHPCLOAK__*` environment variables.
pub fn load_config(explicit: Option<&Path>) -> Result<Config>
{
    let mut builder = config::Config::builder();

    if let Some(path) = explicit
    {
        if !path.exists()
        {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        builder = builder.add_source(config::File::from(path).required(true));
    }
    else
    {
        // Load from config files in priority order
        for path in &CONFIG_FILES
        {
            if Path::new(path).exists()
            {
                builder = builder.add_source(config::File::with_name(path));
                break;
            }
        }
    }

    // Add environment variables with PHPCLOAK prefix, e.g. PHPCLOAK__TARGET_DIR
    builder = builder.add_source(
        config::Environment::with_prefix("PHPCLOAK")
            .prefix_separator("__")
            .separator("__"),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join(CONFIG_FILES[0]);

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}
