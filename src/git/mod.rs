//! Git working-copy handle over the external `git` binary
//!
//! miniature does not implement any git protocol itself; every repository
//! operation shells out to `git` via `tokio::process`. Failures are
//! classified into typed errors here, in one place, so callers never
//! match on subprocess error text.

pub mod filemode;

use crate::error::{MiniatureError, MiniatureResult};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Handle to a git working copy on disk
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
}

/// Classify a failed git invocation from its stderr
///
/// Returns the typed error callers branch on: a missing remote ref (used
/// for the shallow-clone fallback), a transport failure (downgraded to a
/// warning during refresh), or an unresolvable reference.
fn classify_failure(operation: &str, reference: Option<&str>, stderr: &str) -> MiniatureError {
    let lower = stderr.to_lowercase();

    let remote_ref_missing = lower.contains("couldn't find remote ref")
        || lower.contains("not found in upstream")
        || (lower.contains("remote branch") && lower.contains("not found"));
    if remote_ref_missing {
        return MiniatureError::RemoteRefMissing {
            reference: reference.unwrap_or("<unknown>").to_string(),
        };
    }

    let transport = lower.contains("could not resolve host")
        || lower.contains("unable to access")
        || lower.contains("connection refused")
        || lower.contains("connection timed out")
        || lower.contains("failed to connect")
        || lower.contains("could not read from remote repository");
    if transport {
        return MiniatureError::Transport {
            operation: operation.to_string(),
            stderr: stderr.trim().to_string(),
        };
    }

    let bad_reference = lower.contains("unknown revision")
        || lower.contains("bad revision")
        || (lower.contains("pathspec") && lower.contains("did not match"))
        || lower.contains("did not match any file(s) known to git");
    if bad_reference {
        return MiniatureError::ReferenceInvalid {
            reference: reference.unwrap_or("<unknown>").to_string(),
            reason: stderr.trim().to_string(),
        };
    }

    MiniatureError::command_exec(format!("git {}", operation), stderr.trim())
}

/// Run git with the given args, no working directory
async fn run_git(args: &[&str], reference: Option<&str>) -> MiniatureResult<String> {
    debug!("Executing: git {:?}", args);

    let output = Command::new("git")
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| MiniatureError::command_failed(format!("git {:?}", args), e))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let operation = args.first().copied().unwrap_or("git");
        Err(classify_failure(operation, reference, &stderr))
    }
}

impl Git {
    /// Open an existing working copy (no validation beyond path capture)
    pub fn open(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Check whether a path contains a git repository marker
    pub fn is_repo(path: &Path) -> bool {
        path.exists() && path.join(".git").exists()
    }

    /// Working copy root
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Clone a repository in full
    pub async fn clone_repo(url: &str, dest: &Path) -> MiniatureResult<Self> {
        let dest_str = dest.to_string_lossy();
        run_git(&["clone", url, &dest_str], None).await?;
        Ok(Self::open(dest))
    }

    /// Shallow, single-branch clone of one specific branch
    ///
    /// Fails with `RemoteRefMissing` when the branch does not exist on the
    /// remote; callers fall back to a full clone.
    pub async fn clone_branch_shallow(url: &str, dest: &Path, branch: &str) -> MiniatureResult<Self> {
        let dest_str = dest.to_string_lossy();
        run_git(
            &[
                "clone",
                "--branch",
                branch,
                "--single-branch",
                "--depth",
                "1",
                url,
                &dest_str,
            ],
            Some(branch),
        )
        .await?;
        Ok(Self::open(dest))
    }

    /// Run git inside this working copy
    async fn run(&self, args: &[&str], reference: Option<&str>) -> MiniatureResult<String> {
        let workdir = self.workdir.to_string_lossy().to_string();
        let mut full: Vec<&str> = vec!["-C", workdir.as_str()];
        full.extend_from_slice(args);
        run_git(&full, reference).await
    }

    /// Fetch from origin (tags included, stale ones pruned)
    pub async fn fetch(&self) -> MiniatureResult<()> {
        self.run(&["fetch", "--prune", "--tags", "origin"], None)
            .await?;
        Ok(())
    }

    /// Check out a branch, tag, or commit
    pub async fn checkout(&self, reference: &str) -> MiniatureResult<()> {
        self.run(&["checkout", reference], Some(reference)).await?;
        Ok(())
    }

    /// Name of the currently checked-out branch (or `HEAD` when detached)
    pub async fn current_branch(&self) -> MiniatureResult<String> {
        self.run(&["rev-parse", "--abbrev-ref", "HEAD"], None).await
    }

    /// Full commit id of HEAD
    pub async fn head_commit(&self) -> MiniatureResult<String> {
        self.run(&["rev-parse", "HEAD"], None).await
    }

    /// Committer timestamp of the last commit
    pub async fn head_commit_time(&self) -> MiniatureResult<DateTime<Utc>> {
        let raw = self.run(&["log", "-1", "--format=%cI"], None).await?;
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| MiniatureError::Internal(format!("unparsable commit time {raw:?}: {e}")))
    }

    /// True if a local branch with this name exists
    pub async fn has_local_branch(&self, name: &str) -> MiniatureResult<bool> {
        let reference = format!("refs/heads/{name}");
        Ok(self
            .run(&["show-ref", "--verify", "--quiet", &reference], Some(name))
            .await
            .is_ok())
    }

    /// True if origin has a branch with this name (as last fetched)
    pub async fn has_remote_branch(&self, name: &str) -> MiniatureResult<bool> {
        let reference = format!("refs/remotes/origin/{name}");
        Ok(self
            .run(&["show-ref", "--verify", "--quiet", &reference], Some(name))
            .await
            .is_ok())
    }

    /// Create a local branch at HEAD
    pub async fn create_branch(&self, name: &str) -> MiniatureResult<()> {
        self.run(&["branch", name], Some(name)).await?;
        Ok(())
    }

    /// Create a local branch tracking a start point
    pub async fn create_branch_from(&self, name: &str, start: &str) -> MiniatureResult<()> {
        self.run(&["branch", name, start], Some(start)).await?;
        Ok(())
    }

    /// List all tag names, in `git tag --list` enumeration order
    pub async fn tags(&self) -> MiniatureResult<Vec<String>> {
        let out = self.run(&["tag", "--list"], None).await?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// True if a local tag with this name exists
    pub async fn has_tag(&self, name: &str) -> MiniatureResult<bool> {
        Ok(self.tags().await?.iter().any(|t| t == name))
    }

    /// Create an annotated tag at HEAD
    pub async fn create_tag(&self, name: &str, message: &str) -> MiniatureResult<()> {
        self.run(&["tag", "-a", name, "-m", message], Some(name))
            .await?;
        Ok(())
    }

    /// Delete a local tag
    pub async fn delete_tag(&self, name: &str) -> MiniatureResult<()> {
        self.run(&["tag", "-d", name], Some(name)).await?;
        Ok(())
    }

    /// Stage everything under the working copy
    pub async fn add_all(&self) -> MiniatureResult<()> {
        self.run(&["add", "--all"], None).await?;
        Ok(())
    }

    /// Porcelain status output; empty means a clean tree
    pub async fn status_porcelain(&self) -> MiniatureResult<String> {
        self.run(&["status", "--porcelain"], None).await
    }

    /// Commit staged changes
    pub async fn commit(&self, message: &str) -> MiniatureResult<()> {
        self.run(&["commit", "-m", message], None).await?;
        Ok(())
    }

    /// Push a branch to origin
    pub async fn push_branch(&self, branch: &str) -> MiniatureResult<()> {
        self.run(&["push", "origin", branch], Some(branch)).await?;
        Ok(())
    }

    /// Push all local tags to origin
    pub async fn push_all_tags(&self) -> MiniatureResult<()> {
        self.run(&["push", "origin", "--tags"], None).await?;
        Ok(())
    }

    /// Push a single refspec, optionally forced
    ///
    /// `push_refspec(":refs/tags/x", false)` deletes the remote tag;
    /// `push_refspec("refs/tags/x", true)` overwrites it even if the
    /// remote previously rejected a non-force push.
    pub async fn push_refspec(&self, refspec: &str, force: bool) -> MiniatureResult<()> {
        if force {
            self.run(&["push", "--force", "origin", refspec], Some(refspec))
                .await?;
        } else {
            self.run(&["push", "origin", refspec], Some(refspec))
                .await?;
        }
        Ok(())
    }

    /// Set a repository-local config value
    pub async fn set_config(&self, key: &str, value: &str) -> MiniatureResult<()> {
        self.run(&["config", key, value], None).await?;
        Ok(())
    }
}
