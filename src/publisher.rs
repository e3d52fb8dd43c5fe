//! Package publishing: copy, commit, tag, push
//!
//! The publisher copies a local package tree into the cached mirror of
//! its declared repository, commits on the package's branch, and
//! optionally tags the release and pushes. Like the loader it never
//! propagates errors past its boundary; every call yields a structured
//! outcome.

use crate::cache::RepositoryCache;
use crate::error::{MiniatureError, MiniatureResult};
use crate::fsops::{self, PUBLISH_EXCLUDES};
use crate::git::Git;
use crate::manifest::PackageManifest;
use crate::tags;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Caller-supplied knobs for publishing
#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// Commit message; defaults to `Update <name> v<version>`
    pub commit_message: Option<String>,

    /// Push the branch (and tag) to origin
    pub push: bool,

    /// Tag the release when the manifest declares a version
    pub tag: bool,

    /// Overwrite an existing release tag
    pub force_tag: bool,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            commit_message: None,
            push: true,
            tag: true,
            force_tag: false,
        }
    }
}

/// Structured result of one publish or push
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    /// Whether the operation completed
    pub success: bool,

    /// Mirror working copy the commit landed in
    pub repo_path: Option<PathBuf>,

    /// Commit message that was (or would have been) used
    pub commit_message: String,

    /// Whether the branch was pushed
    pub pushed: bool,

    /// Release tag, when one was created
    pub tag: Option<String>,

    /// Human-readable summary
    pub message: String,
}

impl PublishOutcome {
    fn failure(message: String) -> Self {
        Self {
            success: false,
            repo_path: None,
            commit_message: String::new(),
            pushed: false,
            tag: None,
            message,
        }
    }
}

/// Publish a package directory to its declared repository
///
/// Reads `pkg.json` in `package_dir`, copies the tree into the mirror's
/// root directory on the package's branch, commits, and optionally tags
/// and pushes. An unchanged tree is an idempotent success with an
/// explicit "no changes" message. A tagging failure after a successful
/// commit is an overall failure, since the release is not fully
/// published.
pub async fn publish_package(
    cache: &mut RepositoryCache,
    package_dir: &Path,
    options: &PublishOptions,
) -> PublishOutcome {
    match try_publish(cache, package_dir, options).await {
        Ok(outcome) => outcome,
        Err(e) => PublishOutcome::failure(format!("Failed to publish package: {e}")),
    }
}

async fn try_publish(
    cache: &mut RepositoryCache,
    package_dir: &Path,
    options: &PublishOptions,
) -> MiniatureResult<PublishOutcome> {
    let manifest = PackageManifest::from_file(&package_dir.join("pkg.json"))?;
    let repo_url = manifest.db_repo.as_deref().ok_or_else(|| {
        MiniatureError::ManifestInvalid {
            path: package_dir.join("pkg.json"),
            reason: "no db-repo declared".to_string(),
        }
    })?;

    let branch = manifest.branch_or_default().to_string();
    let commit_message = options.commit_message.clone().unwrap_or_else(|| {
        match &manifest.version {
            Some(v) => format!("Update {} v{v}", manifest.name),
            None => format!("Update {}", manifest.name),
        }
    });

    let repo_path = cache.clone_or_update(repo_url, Some(&branch), false).await?;
    let git = Git::open(&repo_path);
    ensure_branch(&git, &branch).await?;

    copy_into_repo(package_dir, &repo_path.join(manifest.root_dir_or_default()))?;

    git.add_all().await?;
    if git.status_porcelain().await?.is_empty() {
        debug!("Nothing to commit for {}", manifest.name);
        return Ok(PublishOutcome {
            success: true,
            repo_path: Some(repo_path),
            commit_message: "No changes to commit".to_string(),
            pushed: false,
            tag: None,
            message: "No changes to commit".to_string(),
        });
    }

    git.commit(&commit_message).await?;
    info!("Committed '{commit_message}' on branch {branch}");

    let mut pushed = false;
    if options.push {
        git.push_branch(&branch).await?;
        pushed = true;
    }

    let mut tag = None;
    if options.tag && manifest.version.is_some() {
        match tags::tag_package(cache, package_dir, options.force_tag, options.push).await {
            Ok(outcome) => tag = Some(outcome.tag),
            Err(e) => {
                return Ok(PublishOutcome {
                    success: false,
                    repo_path: Some(repo_path),
                    commit_message,
                    pushed,
                    tag: None,
                    message: format!("Commit successful but tagging failed: {e}"),
                });
            }
        }
    }

    let mut message_parts = vec![format!("Successfully published {}", manifest.name)];
    if pushed {
        message_parts.push("pushed to remote".to_string());
    }
    if let Some(t) = &tag {
        message_parts.push(format!("tagged as {t}"));
    }

    Ok(PublishOutcome {
        success: true,
        repo_path: Some(repo_path),
        commit_message,
        pushed,
        tag,
        message: message_parts.join(", "),
    })
}

/// Commit and push a package directory without tagging
///
/// Same copy-and-commit flow as publishing, with the default commit
/// message `Update from <dirname>` and no release tag.
pub async fn push_package(
    cache: &mut RepositoryCache,
    package_dir: &Path,
    commit_message: Option<&str>,
    push: bool,
) -> PublishOutcome {
    match try_push(cache, package_dir, commit_message, push).await {
        Ok(outcome) => outcome,
        Err(e) => PublishOutcome::failure(format!("Failed to push package: {e}")),
    }
}

async fn try_push(
    cache: &mut RepositoryCache,
    package_dir: &Path,
    commit_message: Option<&str>,
    push: bool,
) -> MiniatureResult<PublishOutcome> {
    let manifest = PackageManifest::from_file(&package_dir.join("pkg.json"))?;
    let repo_url = manifest.db_repo.as_deref().ok_or_else(|| {
        MiniatureError::ManifestInvalid {
            path: package_dir.join("pkg.json"),
            reason: "no db-repo declared".to_string(),
        }
    })?;

    let branch = manifest.branch_or_default().to_string();
    let commit_message = match commit_message {
        Some(m) => m.to_string(),
        None => {
            let dirname = package_dir
                .canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .unwrap_or_else(|| "package".to_string());
            format!("Update from {dirname}")
        }
    };

    let repo_path = cache.clone_or_update(repo_url, Some(&branch), false).await?;
    let git = Git::open(&repo_path);
    ensure_branch(&git, &branch).await?;

    copy_into_repo(package_dir, &repo_path.join(manifest.root_dir_or_default()))?;

    git.add_all().await?;
    if git.status_porcelain().await?.is_empty() {
        return Ok(PublishOutcome {
            success: true,
            repo_path: Some(repo_path),
            commit_message,
            pushed: false,
            tag: None,
            message: "No changes to commit - repository is up to date".to_string(),
        });
    }

    git.commit(&commit_message).await?;

    let (pushed, message) = if push {
        git.push_branch(&branch).await?;
        (true, "Successfully published to repository".to_string())
    } else {
        (false, "Changes committed but not pushed".to_string())
    };

    Ok(PublishOutcome {
        success: true,
        repo_path: Some(repo_path),
        commit_message,
        pushed,
        tag: None,
        message,
    })
}

/// Check out the package branch, creating it when absent
///
/// Prefers a local branch, then a remote-tracking one; a branch new to
/// the repository is created at the current HEAD.
async fn ensure_branch(git: &Git, branch: &str) -> MiniatureResult<()> {
    if git.has_local_branch(branch).await? {
        git.checkout(branch).await?;
    } else if git.has_remote_branch(branch).await? {
        git.create_branch_from(branch, &format!("origin/{branch}"))
            .await?;
        git.checkout(branch).await?;
    } else {
        git.create_branch(branch).await?;
        git.checkout(branch).await?;
    }
    Ok(())
}

/// Copy the package tree into the mirror's root directory
///
/// Top-level directories are replaced rather than merged so deletions in
/// the package propagate; version-control and build artifacts are
/// excluded at every depth.
fn copy_into_repo(package_dir: &Path, target: &Path) -> MiniatureResult<()> {
    std::fs::create_dir_all(target)
        .map_err(|e| MiniatureError::io(format!("creating directory {}", target.display()), e))?;

    let entries = std::fs::read_dir(package_dir).map_err(|e| {
        MiniatureError::io(format!("reading directory {}", package_dir.display()), e)
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| {
            MiniatureError::io(format!("reading entry in {}", package_dir.display()), e)
        })?;
        let name = entry.file_name();
        if PUBLISH_EXCLUDES.iter().any(|x| name == *x) {
            continue;
        }

        let src = entry.path();
        let dst = target.join(&name);
        if src.is_dir() {
            fsops::remove_path(&dst)?;
            fsops::copy_tree(&src, &dst, PUBLISH_EXCLUDES)?;
        } else {
            std::fs::copy(&src, &dst).map_err(|e| {
                MiniatureError::io(
                    format!("copying {} to {}", src.display(), dst.display()),
                    e,
                )
            })?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn publish_without_manifest_fails_structured() {
        let temp = TempDir::new().unwrap();
        let mut cache = RepositoryCache::new(Some(temp.path().join("cache"))).unwrap();
        let pkg = temp.path().join("pkg");
        fs::create_dir_all(&pkg).unwrap();

        let outcome = publish_package(&mut cache, &pkg, &PublishOptions::default()).await;
        assert!(!outcome.success);
        assert!(outcome.message.contains("Failed to publish package"));
    }

    #[tokio::test]
    async fn publish_requires_db_repo() {
        let temp = TempDir::new().unwrap();
        let mut cache = RepositoryCache::new(Some(temp.path().join("cache"))).unwrap();
        let pkg = temp.path().join("pkg");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("pkg.json"), r#"{"name": "x", "version": "1.0.0"}"#).unwrap();

        let outcome = publish_package(&mut cache, &pkg, &PublishOptions::default()).await;
        assert!(!outcome.success);
        assert!(outcome.message.contains("db-repo"));
    }

    #[test]
    fn copy_into_repo_replaces_directories() {
        let temp = TempDir::new().unwrap();
        let pkg = temp.path().join("pkg");
        let target = temp.path().join("repo/src/pkg");

        fs::create_dir_all(pkg.join("sub")).unwrap();
        fs::write(pkg.join("sub/new.rs"), "new").unwrap();
        fs::create_dir_all(target.join("sub")).unwrap();
        fs::write(target.join("sub/stale.rs"), "stale").unwrap();

        copy_into_repo(&pkg, &target).unwrap();

        assert!(target.join("sub/new.rs").exists());
        assert!(!target.join("sub/stale.rs").exists());
    }

    #[test]
    fn copy_into_repo_skips_excluded_entries() {
        let temp = TempDir::new().unwrap();
        let pkg = temp.path().join("pkg");
        let target = temp.path().join("repo");

        fs::create_dir_all(pkg.join(".git")).unwrap();
        fs::write(pkg.join(".git/HEAD"), "ref").unwrap();
        fs::create_dir_all(pkg.join("target")).unwrap();
        fs::write(pkg.join("code.rs"), "fn f() {}").unwrap();

        copy_into_repo(&pkg, &target).unwrap();

        assert!(target.join("code.rs").exists());
        assert!(!target.join(".git").exists());
        assert!(!target.join("target").exists());
    }
}
