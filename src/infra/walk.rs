//! Filepath: src/infra/walk.rs
//! Descriptor-discovery walker.
//! - Yields directories that directly contain a `pom.xml`
//! - Prunes hidden (dot) directories and build-output directories *before*
//!   descending, so their contents are never visited
//! - Extra ignore globs prune further subtrees
//! - Skips unreadable subtrees instead of aborting the walk
//!
//! Backed by ripgrep's `ignore` crate and `globset`. A directory containing
//! a descriptor is still descended into: nested modules are common.

use std::path::{Path, PathBuf};

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, WalkBuilder};

/// The Maven project descriptor file name.
pub const POM_FILE: &str = "pom.xml";

/// Walker that enumerates descriptor directories under a root.
pub struct PomWalker
{
    /// Compiled set of additional prune patterns
    ignore_patterns: GlobSet,

    /// Directory name the build tool writes artifacts into ("target")
    build_output_dir: String,
}

impl PomWalker
{
    /// Build a walker that prunes `build_output_dir` and any directory
    /// matching `additional_ignores` (e.g. "**/generated").
    pub fn new(
        build_output_dir: &str,
        additional_ignores: &[String],
    ) -> Result<Self>
    {
        let mut builder = GlobSetBuilder::new();

        for pattern in additional_ignores
        {
            builder.add(Glob::new(pattern)?);
        }

        Ok(Self {
            ignore_patterns: builder.build()?,
            build_output_dir: build_output_dir.to_string(),
        })
    }

    /// Internal: construct a configured WalkBuilder for `root`.
    fn build_walk(
        &self,
        root: &Path,
    ) -> WalkBuilder
    {
        let mut b = WalkBuilder::new(root);

        // WalkBuilder::hidden(true) => skip dotfiles and dot-directories
        b.hidden(true);

        // Descriptor discovery is not a source listing: ignore files do not
        // apply (a project may well gitignore directories holding poms of
        // vendored builds, which still must be discovered).
        b.ignore(false);
        b.git_ignore(false);
        b.git_global(false);
        b.git_exclude(false);

        b.follow_links(false);

        // Early directory pruning: build-output dirs and extra globs are
        // rejected before descent, so a pom.xml buried under target/ can
        // never surface as a false match.
        let extra = self
            .ignore_patterns
            .clone();
        let build_dir = self
            .build_output_dir
            .clone();
        b.filter_entry(move |ent: &DirEntry| {
            let is_dir = ent
                .file_type()
                .map(|ft| ft.is_dir())
                .unwrap_or(false);

            if !is_dir
            {
                return true;
            }
            if ent.file_name() == build_dir.as_str()
            {
                return false;
            }
            !extra.is_match(ent.path())
        });

        b
    }

    /// Enumerate directories under `root` that directly contain a
    /// descriptor. Unreadable entries are dropped silently; a missing or
    /// non-directory root is fatal. The returned list is sorted by path
    /// for stable logs, though callers re-sort by project name anyway.
    pub fn walk(
        &self,
        root: &Path,
    ) -> Result<Vec<PathBuf>>
    {
        if !root.is_dir()
        {
            anyhow::bail!("scan root {} is not a directory", root.display());
        }

        let walker = self
            .build_walk(root)
            .build();

        let mut out: Vec<PathBuf> = walker
            // Drop entries with IO errors (permission denied etc.)
            .filter_map(|res| res.ok())
            // Keep only regular files named pom.xml
            .filter(|entry| {
                entry
                    .file_type()
                    .is_some_and(|ft| ft.is_file())
            })
            .filter(|entry| entry.file_name() == POM_FILE)
            // The project directory is the descriptor's parent
            .filter_map(|entry| {
                entry
                    .into_path()
                    .parent()
                    .map(Path::to_path_buf)
            })
            .collect();

        out.sort();
        out.dedup();

        Ok(out)
    }
}
