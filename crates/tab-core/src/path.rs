use std::path::{Path, PathBuf};
use std::process::Command;

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Resolves the root directory TAB uses for run-scoped state (journal files,
/// default working directories), following the same explicit-override >
/// environment variable > platform data dir > home-relative fallback chain
/// the wider workspace uses for its own workspace path.
pub fn resolve_workspace_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = explicit {
        return Ok(expand_tilde(p));
    }
    if let Ok(env_path) = std::env::var("TAB_PATH") {
        return Ok(expand_tilde(Path::new(&env_path)));
    }
    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("tab"));
    }
    if let Some(home) = dirs::home_dir() {
        return Ok(home.join(".tab"));
    }
    Err(Error::UnresolvedPath(
        "no explicit path, TAB_PATH, platform data dir, or home dir available".into(),
    ))
}

pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    path.to_path_buf()
}

/// Stable sha256-based identifier for a project root, used as the audit
/// journal's `trace_correlation` id. Resolves git worktrees to their common
/// directory first so linked worktrees of the same repository hash to the
/// same project.
pub fn project_hash_from_root(root: &Path) -> String {
    let canonical = detect_git_common_dir(root).unwrap_or_else(|| normalize_path(root));
    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string_lossy().as_bytes());
    format!("{:x}", hasher.finalize())
}

fn detect_git_common_dir(root: &Path) -> Option<PathBuf> {
    let output = Command::new("git")
        .arg("-C")
        .arg(root)
        .arg("rev-parse")
        .arg("--git-common-dir")
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let raw = String::from_utf8(output.stdout).ok()?;
    let git_common_dir = raw.trim();
    if git_common_dir.is_empty() {
        return None;
    }
    let path = if Path::new(git_common_dir).is_absolute() {
        PathBuf::from(git_common_dir)
    } else {
        root.join(git_common_dir)
    };
    Some(normalize_path(&path.parent().unwrap_or(&path).to_path_buf()))
}

pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

pub fn paths_equal(a: &Path, b: &Path) -> bool {
    normalize_path(a) == normalize_path(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic_for_same_root() {
        let dir = tempfile::tempdir().unwrap();
        let a = project_hash_from_root(dir.path());
        let b = project_hash_from_root(dir.path());
        assert_eq!(a, b);
    }

    #[test]
    fn hash_differs_for_different_roots() {
        let a_dir = tempfile::tempdir().unwrap();
        let b_dir = tempfile::tempdir().unwrap();
        assert_ne!(
            project_hash_from_root(a_dir.path()),
            project_hash_from_root(b_dir.path())
        );
    }

    #[test]
    fn expand_tilde_resolves_home() {
        if let Some(home) = dirs::home_dir() {
            let expanded = expand_tilde(Path::new("~/foo"));
            assert_eq!(expanded, home.join("foo"));
        }
    }
}
