//! Filepath: src/core/pipeline.rs
//! Whole-run orchestration: copy the tree, rewrite every targeted file once
//! (variables, comments, name harvesting), then, when function renaming is
//! on, rewrite every targeted file again with the sealed ledger.
//!
//! The run is single-threaded. Callers choose between [`Obfuscator::run`]
//! on their own thread and [`Obfuscator::spawn`] on one background worker;
//! either way the outcome is reported through [`ObfuscatorUi`]. Any failure
//! aborts the run and leaves the target tree as far as it got.

use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info, instrument};

use crate::core::exclusion::ExclusionIndex;
use crate::core::hasher::NameHasher;
use crate::core::ledger::{SealedLedger, SymbolLedger};
use crate::core::patterns::{PatternError, PatternKind, PatternSet};
use crate::core::rename::FunctionRenamePass;
use crate::core::rewriter::{BlockRewriter, NameRules, RewriteOptions};
use crate::core::scanner::CodeBlockScanner;
use crate::infra::config::Config;
use crate::infra::io::{SourceFile, SourceFileError};
use crate::infra::walk::{FileSelector, FileWalker, GlobError};

/// Receives progress and the final outcome of a run.
pub trait ObfuscatorUi {
    fn status_update(&mut self, message: &str);

    /// Called at most once; the run stops right after.
    fn error(&mut self, message: &str);

    /// Called once after a fully successful run.
    fn done(&mut self);
}

/// Run stages. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Idle,
    Copying,
    FirstPass,
    SecondPass,
    Done,
    Error,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Idle => write!(f, "idle"),
            Stage::Copying => write!(f, "copying"),
            Stage::FirstPass => write!(f, "first pass"),
            Stage::SecondPass => write!(f, "second pass"),
            Stage::Done => write!(f, "done"),
            Stage::Error => write!(f, "error"),
        }
    }
}

/// Invalid configuration, caught before touching the filesystem.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error(transparent)]
    Glob(#[from] GlobError),
}

/// The target tree could not be prepared or filled.
#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
    #[error("source directory {} lies inside target directory {}", source_dir.display(), target_dir.display())]
    Overlap { source_dir: PathBuf, target_dir: PathBuf },
    #[error("could not read source directory: {}", path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not delete target directory: {}", path.display())]
    DeleteTarget {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not create target directory: {}", path.display())]
    CreateTarget {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not enumerate source directory: {}", path.display())]
    Enumerate {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },
    #[error("could not copy files from source to target directory: {}", path.display())]
    Copy {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ObfuscateError {
    #[error(transparent)]
    Environment(#[from] EnvironmentError),
    #[error("there was an error obfuscating {}", path.display())]
    Rewrite {
        path: PathBuf,
        #[source]
        source: SourceFileError,
    },
}

/// Message with every source in the chain, joined by `": "`.
pub fn error_chain<E>(err: E) -> String
where
    E: StdError + Send + Sync + 'static,
{
    format!("{:#}", anyhow::Error::new(err))
}

/// What a run would do, computed without writing anything.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    /// Every file that would be copied, relative to the source dir
    pub copies: Vec<PathBuf>,
    /// Selected files with their code-region counts; `None` for files
    /// without the source extension, which are copied untouched
    pub targets: Vec<(PathBuf, Option<usize>)>,
}

pub struct Obfuscator {
    source_dir: PathBuf,
    target_dir: PathBuf,
    banner: String,
    options: RewriteOptions,
    rules: NameRules,
    patterns: PatternSet,
    hasher: NameHasher,
    walker: FileWalker,
    selector: FileSelector,
}

fn advance(stage: &mut Stage, next: Stage) {
    debug_assert!(next > *stage, "stage moved backwards: {stage} -> {next}");
    info!(from = %stage, to = %next, "stage");
    *stage = next;
}

impl Obfuscator {
    pub fn from_config(config: &Config) -> Result<Self, SetupError> {
        Ok(Self {
            source_dir: config.source_dir.clone(),
            target_dir: config.target_dir.clone(),
            banner: config.banner.clone(),
            options: RewriteOptions {
                remove_whitespace: config.remove_whitespace,
                rename_variables: config.rename_variables,
                rename_functions: config.rename_functions,
            },
            rules: NameRules::new(&config.exclude_variables, &config.exclude_functions),
            patterns: PatternSet::compile(&config.patterns)?,
            hasher: NameHasher::new(config.digest),
            walker: FileWalker::new(&config.skip)?,
            selector: FileSelector::new(&config.files, &config.extension)?,
        })
    }

    pub fn options(&self) -> RewriteOptions {
        self.options
    }

    fn scanner(&self) -> CodeBlockScanner<'_> {
        CodeBlockScanner::new(ExclusionIndex::new(
            self.patterns.regex(PatternKind::String),
        ))
    }

    /// Report the active recognizer patterns.
    pub fn output_patterns<U: ObfuscatorUi + ?Sized>(&self, ui: &mut U) {
        for kind in PatternKind::ALL {
            ui.status_update(&format!(
                "Using pattern for {}: {}",
                kind.label(),
                self.patterns.regex(kind).as_str()
            ));
        }
    }

    /// Run the whole pipeline on the calling thread. Returns the final
    /// stage, `Stage::Done` or `Stage::Error`.
    pub fn run<U: ObfuscatorUi + ?Sized>(&self, ui: &mut U) -> Stage {
        let mut stage = Stage::Idle;

        match self.execute(ui, &mut stage) {
            Ok(()) => {
                advance(&mut stage, Stage::Done);
                ui.done();
            }
            Err(e) => {
                let message = error_chain(e);
                error!(stage = %stage, error = %message, "obfuscation aborted");
                advance(&mut stage, Stage::Error);
                ui.error(&message);
            }
        }

        stage
    }

    /// Hand the whole pipeline to one background worker.
    pub fn spawn<U>(self, mut ui: U) -> io::Result<JoinHandle<Stage>>
    where
        U: ObfuscatorUi + Send + 'static,
    {
        thread::Builder::new()
            .name("phpcloak-worker".to_string())
            .spawn(move || self.run(&mut ui))
    }

    /// Enumerate and scan the source tree without writing anything.
    pub fn plan(&self) -> Result<Plan, ObfuscateError> {
        let source = self.canonical_source()?;
        let files = self
            .walker
            .walk_files(&source)
            .map_err(|e| EnvironmentError::Enumerate {
                path: source.clone(),
                source: e,
            })?;

        // An existing target is wiped by a real run, so nothing under it is copied
        let target = fs::canonicalize(&self.target_dir).ok();

        let scanner = self.scanner();
        let mut plan = Plan::default();

        for file in &files {
            if target.as_ref().is_some_and(|t| file.starts_with(t)) {
                continue;
            }

            let rel = relative(file, &source);

            if self.selector.is_selected(&rel) {
                let regions = if self.selector.has_source_extension(&rel) {
                    let loaded = SourceFile::load(file).map_err(|e| ObfuscateError::Rewrite {
                        path: file.clone(),
                        source: e,
                    })?;
                    Some(scanner.regions(&loaded.text).count())
                } else {
                    None
                };
                plan.targets.push((rel.clone(), regions));
            }

            plan.copies.push(rel);
        }

        Ok(plan)
    }

    #[instrument(skip_all, fields(source = %self.source_dir.display(), target = %self.target_dir.display()))]
    fn execute<U: ObfuscatorUi + ?Sized>(
        &self,
        ui: &mut U,
        stage: &mut Stage,
    ) -> Result<(), ObfuscateError> {
        advance(stage, Stage::Copying);
        let targets = self.copy_tree(ui)?;

        advance(stage, Stage::FirstPass);
        let mut ledger = SymbolLedger::new();
        for file in &targets {
            ui.status_update(&format!("Obfuscating {}", file.display()));
            self.first_pass(file, &mut ledger)
                .map_err(|source| ObfuscateError::Rewrite {
                    path: file.clone(),
                    source,
                })?;
        }

        if !self.options.rename_functions {
            return Ok(());
        }

        info!(
            functions = ledger.function_count(),
            classes = ledger.class_count(),
            "ledger sealed"
        );
        let ledger = ledger.seal();

        advance(stage, Stage::SecondPass);
        for file in &targets {
            ui.status_update(&format!("Obfuscating Function Names in {}", file.display()));
            self.second_pass(file, &ledger)
                .map_err(|source| ObfuscateError::Rewrite {
                    path: file.clone(),
                    source,
                })?;
        }

        Ok(())
    }

    fn canonical_source(&self) -> Result<PathBuf, EnvironmentError> {
        fs::canonicalize(&self.source_dir).map_err(|source| EnvironmentError::Source {
            path: self.source_dir.clone(),
            source,
        })
    }

    /// Wipe and recreate the target, refusing when that would delete the source.
    fn prepare_target(&self, source: &Path) -> Result<PathBuf, EnvironmentError> {
        if self.target_dir.exists() {
            let target = fs::canonicalize(&self.target_dir).map_err(|e| {
                EnvironmentError::DeleteTarget {
                    path: self.target_dir.clone(),
                    source: e,
                }
            })?;

            if source.starts_with(&target) {
                return Err(EnvironmentError::Overlap {
                    source_dir: self.source_dir.clone(),
                    target_dir: self.target_dir.clone(),
                });
            }

            fs::remove_dir_all(&self.target_dir).map_err(|e| EnvironmentError::DeleteTarget {
                path: self.target_dir.clone(),
                source: e,
            })?;
        }

        fs::create_dir_all(&self.target_dir).map_err(|e| EnvironmentError::CreateTarget {
            path: self.target_dir.clone(),
            source: e,
        })?;

        let target = fs::canonicalize(&self.target_dir).map_err(|e| {
            EnvironmentError::CreateTarget {
                path: self.target_dir.clone(),
                source: e,
            }
        })?;

        // A target created under a symlinked path can still resolve inside
        if source.starts_with(&target) {
            return Err(EnvironmentError::Overlap {
                source_dir: self.source_dir.clone(),
                target_dir: self.target_dir.clone(),
            });
        }

        Ok(target)
    }

    /// Copy every source file; returns the target paths selected for rewriting.
    fn copy_tree<U: ObfuscatorUi + ?Sized>(
        &self,
        ui: &mut U,
    ) -> Result<Vec<PathBuf>, EnvironmentError> {
        let source = self.canonical_source()?;
        let target = self.prepare_target(&source)?;

        let files = self
            .walker
            .walk_files(&source)
            .map_err(|e| EnvironmentError::Enumerate {
                path: self.source_dir.clone(),
                source: e,
            })?;

        let mut selected = Vec::new();

        for file in files {
            // The target may live inside the source tree
            if file.starts_with(&target) {
                continue;
            }

            let rel = relative(&file, &source);
            let dest = self.target_dir.join(&rel);

            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| EnvironmentError::Copy {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }

            ui.status_update(&format!("Copying file: {}", dest.display()));
            fs::copy(&file, &dest).map_err(|e| EnvironmentError::Copy {
                path: file.clone(),
                source: e,
            })?;

            if self.selector.is_selected(&rel) {
                selected.push(dest);
            }
        }

        debug!(selected = selected.len(), "tree copied");
        Ok(selected)
    }

    /// Variables, comments and harvesting; prepends the banner.
    /// Files without the source extension are skipped.
    fn first_pass(&self, path: &Path, ledger: &mut SymbolLedger) -> Result<bool, SourceFileError> {
        if !self.selector.has_source_extension(path) {
            debug!(path = %path.display(), "not a source file, left as copied");
            return Ok(false);
        }

        let mut file = SourceFile::load(path)?;
        let rewriter = BlockRewriter::new(&self.patterns, self.hasher, self.options, &self.rules);

        let regions = self
            .scanner()
            .splice_regions(&mut file.text, |block| rewriter.rewrite(block, ledger));

        file.text.insert_str(0, &self.banner);
        file.save()?;

        debug!(path = %path.display(), regions, encoding = ?file.encoding(), "first pass");
        Ok(true)
    }

    fn second_pass(&self, path: &Path, ledger: &SealedLedger) -> Result<bool, SourceFileError> {
        if !self.selector.has_source_extension(path) {
            return Ok(false);
        }

        let mut file = SourceFile::load(path)?;
        let pass = FunctionRenamePass::new(&self.patterns, self.hasher, ledger);
        let regions = pass.apply(&self.scanner(), &mut file.text);
        file.save()?;

        debug!(path = %path.display(), regions, "second pass");
        Ok(true)
    }
}

fn relative(file: &Path, root: &Path) -> PathBuf {
    file.strip_prefix(root)
        .unwrap_or(file)
        .to_path_buf()
}
