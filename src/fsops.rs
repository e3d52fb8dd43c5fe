//! Filesystem helpers shared by materialization and publishing

use crate::error::{MiniatureError, MiniatureResult};
use std::fs;
use std::path::Path;

/// Directories and files never copied into a repository mirror
pub const PUBLISH_EXCLUDES: &[&str] = &[
    ".git",
    ".gitignore",
    "target",
    "node_modules",
    "__pycache__",
    ".pytest_cache",
];

/// Recursively copy a directory tree, merging into an existing target
///
/// Entries whose file name appears in `excludes` are skipped at every
/// depth. Directories that already exist at the destination are merged;
/// files are overwritten.
pub fn copy_tree(src: &Path, dst: &Path, excludes: &[&str]) -> MiniatureResult<()> {
    fs::create_dir_all(dst)
        .map_err(|e| MiniatureError::io(format!("creating directory {}", dst.display()), e))?;

    let entries = fs::read_dir(src)
        .map_err(|e| MiniatureError::io(format!("reading directory {}", src.display()), e))?;

    for entry in entries {
        let entry =
            entry.map_err(|e| MiniatureError::io(format!("reading entry in {}", src.display()), e))?;
        let name = entry.file_name();
        if excludes.iter().any(|x| name == *x) {
            continue;
        }

        let src_path = entry.path();
        let dst_path = dst.join(&name);
        let file_type = entry
            .file_type()
            .map_err(|e| MiniatureError::io(format!("stat {}", src_path.display()), e))?;

        if file_type.is_dir() {
            copy_tree(&src_path, &dst_path, excludes)?;
        } else if file_type.is_symlink() {
            // Re-create the link rather than following it
            let link = fs::read_link(&src_path)
                .map_err(|e| MiniatureError::io(format!("readlink {}", src_path.display()), e))?;
            remove_path(&dst_path)?;
            #[cfg(unix)]
            std::os::unix::fs::symlink(&link, &dst_path)
                .map_err(|e| MiniatureError::io(format!("symlink {}", dst_path.display()), e))?;
            #[cfg(not(unix))]
            return Err(MiniatureError::User(format!(
                "cannot copy symlink {} on this platform",
                src_path.display()
            )));
        } else {
            fs::copy(&src_path, &dst_path).map_err(|e| {
                MiniatureError::io(
                    format!("copying {} to {}", src_path.display(), dst_path.display()),
                    e,
                )
            })?;
        }
    }

    Ok(())
}

/// Remove whatever occupies a path: file, directory tree, or symlink
///
/// A dangling symlink reports `exists() == false`, so the link check
/// comes first. Missing paths are a no-op.
pub fn remove_path(path: &Path) -> MiniatureResult<()> {
    if path.is_symlink() {
        fs::remove_file(path)
            .map_err(|e| MiniatureError::io(format!("removing link {}", path.display()), e))?;
    } else if path.is_dir() {
        fs::remove_dir_all(path)
            .map_err(|e| MiniatureError::io(format!("removing directory {}", path.display()), e))?;
    } else if path.exists() {
        fs::remove_file(path)
            .map_err(|e| MiniatureError::io(format!("removing file {}", path.display()), e))?;
    }
    Ok(())
}
