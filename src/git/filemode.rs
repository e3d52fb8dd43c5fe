//! Filemode repair for mirrors on mode-mangling filesystems
//!
//! Windows filesystems mounted under WSL (`/mnt/...`) do not track the
//! executable bit, which makes every file in a clone look modified.
//! Mirrors landing there get `core.filemode=false` as a side effect.

use crate::error::{MiniatureError, MiniatureResult};
use crate::git::Git;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// True when a path sits on a filesystem known to mis-track file modes
pub fn should_disable_filemode(path: &Path) -> bool {
    path.to_string_lossy().starts_with("/mnt/")
}

/// Disable filemode tracking for one working copy, best effort
pub async fn disable_filemode(git: &Git) {
    if let Err(e) = git.set_config("core.filemode", "false").await {
        warn!(
            "Failed to disable filemode tracking for {}: {}",
            git.workdir().display(),
            e
        );
    } else {
        debug!(
            "Disabled filemode tracking for {}",
            git.workdir().display()
        );
    }
}

/// Disable filemode tracking for every repository under a directory
///
/// Returns the repositories that were repaired. Walks one level of
/// nesting at a time and does not descend into `.git` directories.
pub async fn repair_tree(root: &Path) -> MiniatureResult<Vec<PathBuf>> {
    if !root.exists() {
        return Err(MiniatureError::PathNotFound(root.to_path_buf()));
    }

    let mut repaired = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        if Git::is_repo(&dir) {
            let git = Git::open(&dir);
            git.set_config("core.filemode", "false").await?;
            repaired.push(dir);
            continue;
        }

        let entries = std::fs::read_dir(&dir)
            .map_err(|e| MiniatureError::io(format!("reading directory {}", dir.display()), e))?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() && path.file_name().is_some_and(|n| n != ".git") {
                pending.push(path);
            }
        }
    }

    Ok(repaired)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mnt_prefix_detection() {
        assert!(should_disable_filemode(Path::new("/mnt/c/work/cache")));
        assert!(!should_disable_filemode(Path::new("/home/dev/cache")));
        assert!(!should_disable_filemode(Path::new("relative/mnt/path")));
    }

    #[tokio::test]
    async fn repair_tree_missing_root() {
        let temp = tempfile::TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        let result = repair_tree(&missing).await;
        assert!(matches!(result, Err(MiniatureError::PathNotFound(_))));
    }

    #[tokio::test]
    async fn repair_tree_empty_root() {
        let temp = tempfile::TempDir::new().unwrap();
        let repaired = repair_tree(temp.path()).await.unwrap();
        assert!(repaired.is_empty());
    }
}
