//! Filepath: src/infra/walk.rs
//! Source tree enumeration for the copy step, and target-file selection.
//! - Every regular file is visited: no .gitignore, hidden-file or
//!   parent-ignore filtering, since the copy must mirror the tree
//! - Optional skip globs (early prune + late filter)
//! - Deterministic ordering for stable runs and tests
//!
//! Backed by ripgrep's `ignore` crate and `globset`.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, WalkBuilder};

/// An invalid glob in a skip list or file selector.
#[derive(Debug, thiserror::Error)]
#[error("invalid glob `{pattern}`")]
pub struct GlobError
{
    pub pattern: String,
    #[source]
    pub source: globset::Error,
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, GlobError>
{
    let mut builder = GlobSetBuilder::new();

    for pattern in patterns
    {
        let glob = Glob::new(pattern).map_err(|source| GlobError {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }

    builder
        .build()
        .map_err(|source| GlobError {
            pattern: patterns.join(", "),
            source,
        })
}

/// Unfiltered walker with optional skip globs.
/// Skip globs are applied in two places:
///   1) Early: prune directories during traversal (filter_entry).
///   2) Late: filter out files that still slipped through.
pub struct FileWalker
{
    /// Compiled set of paths left out of the copy
    skip_patterns: GlobSet,
}

impl FileWalker
{
    /// Build a walker that leaves out paths matching `skip` (e.g. ".git/**").
    /// Patterns match on paths relative to the walk root.
    pub fn new(skip: &[String]) -> Result<Self, GlobError>
    {
        Ok(Self {
            skip_patterns: build_globset(skip)?,
        })
    }

    /// Internal: construct a configured WalkBuilder for `root`.
    fn build_walk(
        &self,
        root: &Path,
    ) -> WalkBuilder
    {
        let mut b = WalkBuilder::new(root);

        // Mirror the tree as-is: hidden files, ignore files and VCS rules off;
        // symlinked directories are not entered
        b.standard_filters(false);
        b.follow_links(false);

        // Early directory pruning using skip globs on the relative path
        let skip = self
            .skip_patterns
            .clone();
        let root_owned = root.to_path_buf();
        b.filter_entry(move |ent: &DirEntry| {
            let is_dir = ent
                .file_type()
                .map(|ft| ft.is_dir())
                .unwrap_or(false);

            if !is_dir
            {
                return true;
            }

            let rel = ent
                .path()
                .strip_prefix(&root_owned)
                .unwrap_or(ent.path());
            rel.as_os_str()
                .is_empty()
                || !skip.is_match(rel)
        });

        b
    }

    /// Traverse files under `root`. Returns a **sorted** list of absolute
    /// file paths; the first traversal error aborts the walk.
    pub fn walk_files<P: AsRef<Path>>(
        &self,
        root: P,
    ) -> Result<Vec<PathBuf>, ignore::Error>
    {
        let root_path = root.as_ref();
        let mut out = Vec::new();

        for res in self
            .build_walk(root_path)
            .build()
        {
            let entry = res?;

            // Keep only regular files
            if !entry
                .file_type()
                .is_some_and(|ft| ft.is_file())
            {
                continue;
            }

            let path = entry.into_path();
            let rel = path
                .strip_prefix(root_path)
                .unwrap_or(&path);

            if self
                .skip_patterns
                .is_match(rel)
            {
                continue;
            }

            out.push(path);
        }

        // Deterministic order (stable runs & tests)
        out.sort();

        Ok(out)
    }
}

/// Chooses which copied files get obfuscated.
pub struct FileSelector
{
    /// Globs relative to the source root
    files: GlobSet,

    /// Extension compared case-insensitively, without the dot
    extension: String,
}

impl FileSelector
{
    pub fn new(
        files: &[String],
        extension: &str,
    ) -> Result<Self, GlobError>
    {
        Ok(Self {
            files: build_globset(files)?,
            extension: extension
                .trim_start_matches('.')
                .to_string(),
        })
    }

    /// Listed in the file selection (relative path).
    pub fn is_selected(
        &self,
        rel: &Path,
    ) -> bool
    {
        self.files
            .is_match(rel)
    }

    /// Has the scripting language's source extension.
    pub fn has_source_extension(
        &self,
        path: &Path,
    ) -> bool
    {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }
}
