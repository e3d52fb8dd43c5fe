//! Tag naming scheme and tag lifecycle
//!
//! Release tags are built from up to three `/`-joined segments: the
//! package's in-repo root directory (omitted for `.`), the branch
//! (omitted for default branches), and the version with any leading `v`
//! stripped. Multiple packages and branch release streams therefore
//! share one repository's tag namespace without collision.

use crate::cache::{self, RepositoryCache};
use crate::error::{MiniatureError, MiniatureResult};
use crate::git::Git;
use crate::manifest::PackageManifest;
use std::path::Path;
use tracing::{info, warn};

/// What `create` did to the tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagAction {
    Created,
    Updated,
}

/// Build a tag name from root directory, branch, and version
pub fn tag_name(root_dir: &str, branch: &str, version: &str) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(3);

    let root = root_dir.trim_matches('/');
    if !root.is_empty() && root != "." {
        parts.push(root);
    }
    if !branch.is_empty() && !cache::is_default_branch(branch) {
        parts.push(branch);
    }

    let version = version.strip_prefix('v').unwrap_or(version);
    parts.push(version);
    parts.join("/")
}

/// Create an annotated tag at HEAD, optionally overwriting and pushing
///
/// Without `force`, an existing tag is an error. With `force`, the local
/// tag is deleted and recreated, and the push targets only that single
/// ref with `--force` so a previously rejected remote tag is overwritten
/// too. A plain push pushes all local tags.
pub async fn create(
    git: &Git,
    name: &str,
    message: Option<&str>,
    force: bool,
    push: bool,
) -> MiniatureResult<TagAction> {
    let exists = git.has_tag(name).await?;

    let action = if exists {
        if !force {
            return Err(MiniatureError::TagExists(name.to_string()));
        }
        git.delete_tag(name).await?;
        TagAction::Updated
    } else {
        TagAction::Created
    };

    let default_message = format!("Release {name}");
    git.create_tag(name, message.unwrap_or(&default_message))
        .await?;
    info!("Tag '{name}' {}", match action {
        TagAction::Created => "created",
        TagAction::Updated => "updated",
    });

    if push {
        if force {
            git.push_refspec(&format!("refs/tags/{name}"), true).await?;
        } else {
            git.push_all_tags().await?;
        }
        info!("Tag '{name}' pushed to origin");
    }

    Ok(action)
}

/// Delete a tag locally and, on request, remotely
///
/// A missing local tag is a no-op, not an error. Remote deletion is
/// attempted only after a successful local deletion and its failure is
/// reported as a warning without failing the operation.
pub async fn delete(git: &Git, name: &str, remote: bool) -> MiniatureResult<bool> {
    if !git.has_tag(name).await? {
        info!("Local tag '{name}' not found");
        return Ok(false);
    }

    git.delete_tag(name).await?;
    info!("Deleted local tag '{name}'");

    if remote {
        match git.push_refspec(&format!(":refs/tags/{name}"), false).await {
            Ok(()) => info!("Deleted remote tag '{name}'"),
            Err(e) => warn!("Failed to delete remote tag '{name}': {e}"),
        }
    }
    Ok(true)
}

/// Result of tagging a package from its manifest
#[derive(Debug, Clone)]
pub struct TagOutcome {
    /// Full tag name that was created
    pub tag: String,

    /// Whether the tag was new or overwritten
    pub action: TagAction,
}

/// Tag a package release based on its `pkg.json`
///
/// Reads the manifest in `package_dir`, derives the tag from the
/// package's root directory, branch, and version, and creates it in the
/// cached mirror of the package's repository.
pub async fn tag_package(
    cache: &mut RepositoryCache,
    package_dir: &Path,
    force: bool,
    push: bool,
) -> MiniatureResult<TagOutcome> {
    let manifest = PackageManifest::from_file(&package_dir.join("pkg.json"))?;

    let version = manifest.version.as_deref().ok_or_else(|| {
        MiniatureError::ManifestInvalid {
            path: package_dir.join("pkg.json"),
            reason: "no version declared".to_string(),
        }
    })?;
    let repo_url = manifest.db_repo.as_deref().ok_or_else(|| {
        MiniatureError::ManifestInvalid {
            path: package_dir.join("pkg.json"),
            reason: "no db-repo declared".to_string(),
        }
    })?;

    let branch = manifest.branch_or_default();
    let name = tag_name(manifest.root_dir_or_default(), branch, version);

    let repo_path = cache
        .clone_or_update(repo_url, Some(branch), false)
        .await?;
    let git = Git::open(&repo_path);

    let action = create(&git, &name, None, force, push).await?;
    Ok(TagOutcome { tag: name, action })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_name_root_only_version() {
        assert_eq!(tag_name(".", "main", "1.0.0"), "1.0.0");
        assert_eq!(tag_name("", "master", "v1.0.0"), "1.0.0");
    }

    #[test]
    fn tag_name_with_root_dir() {
        assert_eq!(tag_name("lib", "main", "1.0.0"), "lib/1.0.0");
        assert_eq!(tag_name("/lib/", "main", "1.0.0"), "lib/1.0.0");
        assert_eq!(tag_name("src/math_utils", "main", "1.0.0"), "src/math_utils/1.0.0");
    }

    #[test]
    fn tag_name_with_branch() {
        assert_eq!(tag_name("lib", "dev", "1.0.0"), "lib/dev/1.0.0");
        assert_eq!(tag_name(".", "dev", "1.0.0"), "dev/1.0.0");
    }

    #[test]
    fn tag_name_strips_v_prefix() {
        assert_eq!(tag_name("lib", "main", "v2.3.4"), "lib/2.3.4");
    }

    #[test]
    fn tag_name_roundtrips_through_version_part() {
        let name = tag_name("src/math_utils", "dev", "v1.2.3");
        assert_eq!(crate::version::version_part(&name), "1.2.3");
    }
}
