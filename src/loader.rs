//! Package loading: materialize a repository at a resolved version
//!
//! The loader combines the repository cache and the resolver: it obtains
//! (or refreshes) the mirror, checks out the requested version, and
//! materializes the tree into a target directory by copy or symlink.
//! Failures never propagate past this module; every load produces a
//! structured outcome carrying a success flag and a message.

use crate::cache::{self, RepositoryCache};
use crate::error::{MiniatureError, MiniatureResult};
use crate::fsops;
use crate::git::{filemode, Git};
use crate::manifest::{PackageDefinition, WorkspaceManifest};
use crate::resolver;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Caller-supplied knobs for a single package load
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Repository URL; falls back to the package definition
    pub repo: Option<String>,

    /// Version, constraint, or `latest`; falls back to the definition
    pub version: Option<String>,

    /// Target directory; derived from the repository name when absent
    pub target_dir: Option<PathBuf>,

    /// Branch to track; falls back to the definition, then `main`
    pub branch: Option<String>,

    /// Remove an existing target before materializing
    pub clean: bool,

    /// Symlink into the mirror instead of copying
    pub use_symlink: bool,
}

/// Structured result of one load
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    /// Whether the load completed
    pub success: bool,

    /// Package name, when loaded through a definition
    pub package: Option<String>,

    /// Repository URL the load targeted
    pub repo: String,

    /// Branch that was used
    pub branch: String,

    /// Resolved version, tag, or branch name
    pub version: String,

    /// Where the package was (or would have been) materialized
    pub target_dir: PathBuf,

    /// Human-readable summary
    pub message: String,

    /// Install command declared by the package, surfaced but not run
    pub install_hint: Option<String>,
}

/// Derive the default target directory name from a URL and branch
///
/// `<repo>` for default branches, `<repo>-<branch>` otherwise.
pub fn default_target_dir(repo_url: &str, branch: &str) -> PathBuf {
    let name = repo_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(repo_url);
    let name = name.strip_suffix(".git").unwrap_or(name);

    if cache::is_default_branch(branch) {
        PathBuf::from(name)
    } else {
        PathBuf::from(format!("{name}-{branch}"))
    }
}

/// Load one package into a target directory
///
/// Options win over the package definition field by field. All failures
/// are captured into the returned outcome.
pub async fn load_package(
    cache: &mut RepositoryCache,
    definition: Option<&PackageDefinition>,
    options: &LoadOptions,
) -> LoadOutcome {
    let repo = options
        .repo
        .clone()
        .or_else(|| definition.and_then(PackageDefinition::repo_url));
    let branch = options
        .branch
        .clone()
        .or_else(|| definition.map(|d| d.branch_or_tag().to_string()))
        .unwrap_or_else(|| "main".to_string());
    let version = options
        .version
        .clone()
        .or_else(|| definition.and_then(|d| d.version_request().map(str::to_string)));
    let install_hint = definition.and_then(|d| d.custom_config.install().map(str::to_string));
    let package = definition.map(|d| d.name().to_string());

    let Some(repo) = repo else {
        return LoadOutcome {
            success: false,
            package,
            repo: String::new(),
            branch,
            version: version.unwrap_or_default(),
            target_dir: options.target_dir.clone().unwrap_or_default(),
            message: "Repository URL is required".to_string(),
            install_hint: None,
        };
    };

    let target_dir = options
        .target_dir
        .clone()
        .or_else(|| definition.and_then(|d| d.local_dir.as_ref().map(PathBuf::from)))
        .unwrap_or_else(|| default_target_dir(&repo, &branch));

    match try_load(cache, &repo, &branch, version.as_deref(), &target_dir, options).await {
        Ok(resolved) => LoadOutcome {
            success: true,
            package,
            message: format!("Successfully loaded repository from {repo} (branch: {branch})"),
            repo,
            branch,
            version: resolved,
            target_dir,
            install_hint,
        },
        Err(e) => LoadOutcome {
            success: false,
            package,
            message: format!("Failed to load repository: {e}"),
            repo,
            version: version.unwrap_or_else(|| branch.clone()),
            branch,
            target_dir,
            install_hint: None,
        },
    }
}

async fn try_load(
    cache: &mut RepositoryCache,
    repo: &str,
    branch: &str,
    version: Option<&str>,
    target_dir: &Path,
    options: &LoadOptions,
) -> MiniatureResult<String> {
    if options.clean && (target_dir.exists() || target_dir.is_symlink()) {
        debug!("Cleaning existing target {}", target_dir.display());
        fsops::remove_path(target_dir)?;
    }

    let repo_path = cache.clone_or_update(repo, Some(branch), true).await?;
    let git = Git::open(&repo_path);

    let resolved = match version {
        Some(request) => resolver::resolve(&git, request).await?.reference,
        None => {
            checkout_branch(&git, branch).await?;
            branch.to_string()
        }
    };

    if let Some(parent) = target_dir.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MiniatureError::io(format!("creating directory {}", parent.display()), e)
            })?;
        }
    }

    if options.use_symlink {
        cache.create_symlink(repo, target_dir, ".", Some(branch))?;
    } else {
        fsops::copy_tree(&repo_path, target_dir, &[])?;
        if filemode::should_disable_filemode(target_dir) {
            filemode::disable_filemode(&Git::open(target_dir)).await;
        }
    }

    info!(
        "Loaded {repo} ({resolved}) into {}",
        target_dir.display()
    );
    Ok(resolved)
}

/// Check out a branch, creating it from origin when only remote-tracked
async fn checkout_branch(git: &Git, branch: &str) -> MiniatureResult<()> {
    if git.has_local_branch(branch).await? {
        git.checkout(branch).await?;
    } else if git.has_remote_branch(branch).await? {
        git.create_branch_from(branch, &format!("origin/{branch}"))
            .await?;
        git.checkout(branch).await?;
    }
    Ok(())
}

/// Load packages from a workspace manifest
///
/// `package_names` narrows the load to the named packages; a requested
/// name missing from the manifest yields a failure outcome for that
/// name. Without a selection, every loadable entry is processed.
pub async fn load_from_manifest(
    cache: &mut RepositoryCache,
    manifest_path: &Path,
    package_names: Option<&[String]>,
    clean: bool,
) -> MiniatureResult<Vec<LoadOutcome>> {
    let manifest = WorkspaceManifest::from_file(manifest_path)?;
    let entries = manifest.loaded_entries();

    let mut results = Vec::new();

    if let Some(names) = package_names {
        for name in names {
            if !entries.iter().any(|e| e.pkg_name.as_deref() == Some(name)) {
                results.push(LoadOutcome {
                    success: false,
                    package: Some(name.clone()),
                    repo: String::new(),
                    branch: String::new(),
                    version: String::new(),
                    target_dir: PathBuf::new(),
                    message: format!("Package '{name}' not found in config"),
                    install_hint: None,
                });
            }
        }
    }

    for entry in entries {
        if let Some(names) = package_names {
            if !entry
                .pkg_name
                .as_deref()
                .is_some_and(|n| names.iter().any(|s| s == n))
            {
                continue;
            }
        }

        let options = LoadOptions {
            clean,
            ..LoadOptions::default()
        };
        results.push(load_package(cache, Some(entry), &options).await);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_target_dir_shapes() {
        assert_eq!(
            default_target_dir("https://example.com/team/tools", "main"),
            PathBuf::from("tools")
        );
        assert_eq!(
            default_target_dir("https://example.com/team/tools.git", "master"),
            PathBuf::from("tools")
        );
        assert_eq!(
            default_target_dir("https://example.com/team/tools/", "dev"),
            PathBuf::from("tools-dev")
        );
    }

    #[tokio::test]
    async fn load_without_repo_url_fails_structured() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut cache = RepositoryCache::new(Some(temp.path().join("cache"))).unwrap();

        let outcome = load_package(&mut cache, None, &LoadOptions::default()).await;
        assert!(!outcome.success);
        assert!(outcome.message.contains("Repository URL is required"));
    }

    #[tokio::test]
    async fn load_from_manifest_reports_unknown_selection() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut cache = RepositoryCache::new(Some(temp.path().join("cache"))).unwrap();

        let manifest = temp.path().join("repotree.json");
        std::fs::write(
            &manifest,
            r#"{"miniatures": [{"pkgName": "a", "loaded": false}]}"#,
        )
        .unwrap();

        let names = vec!["missing".to_string()];
        let results = load_from_manifest(&mut cache, &manifest, Some(&names), false)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!(!results[0].success);
        assert!(results[0].message.contains("not found in config"));
    }
}
