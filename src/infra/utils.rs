//! Path helpers for user-supplied inputs.

use std::path::{Path, PathBuf};

/// Expand `~`/`$VAR` in a user-typed path, then canonicalize without UNC
/// prefixes on Windows. Falls back to the expanded form when
/// canonicalization fails (e.g. the path does not exist).
pub fn resolve_user_path(path: &Path) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned());
    dunce::canonicalize(&expanded).unwrap_or(expanded)
}
