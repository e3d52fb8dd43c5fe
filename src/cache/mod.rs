//! Repository cache: local mirrors of git repositories
//!
//! The cache owns a directory of mirrors keyed deterministically by
//! (url, branch) and a persisted JSON index describing them. `main` and
//! `master` share one unscoped mirror per URL; any other branch gets its
//! own `<key>@<branch>` mirror. The index and the mirror directories are
//! kept consistent: every operation that changes one updates the other
//! before returning.

pub mod index;

pub use index::{CacheEntry, CacheIndex};

use crate::error::{MiniatureError, MiniatureResult};
use crate::fsops;
use crate::git::{filemode, Git};
use chrono::Utc;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Branches that share the unscoped mirror and carry no tag prefix
pub const DEFAULT_BRANCHES: &[&str] = &["main", "master"];

/// True for branches that do not get their own cache key
pub fn is_default_branch(branch: &str) -> bool {
    DEFAULT_BRANCHES.contains(&branch)
}

/// Cache of cloned repository mirrors plus their index
#[derive(Debug)]
pub struct RepositoryCache {
    cache_dir: PathBuf,
    index: CacheIndex,
}

impl RepositoryCache {
    /// Open (creating if needed) a cache rooted at `cache_dir`,
    /// defaulting to `~/.miniature/cache`
    pub fn new(cache_dir: Option<PathBuf>) -> MiniatureResult<Self> {
        let cache_dir = cache_dir.unwrap_or_else(Self::default_cache_dir);
        fs::create_dir_all(&cache_dir).map_err(|e| {
            MiniatureError::io(format!("creating cache directory {}", cache_dir.display()), e)
        })?;
        let index = CacheIndex::load(cache_dir.join("index.json"))?;
        Ok(Self { cache_dir, index })
    }

    /// Default cache root under the user's home directory
    pub fn default_cache_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".miniature")
            .join("cache")
    }

    /// Cache root directory
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Derive the deterministic cache key for a (url, branch) pair
    ///
    /// Protocol prefixes are stripped and path separators flattened;
    /// non-default branches append an `@<branch>` suffix.
    pub fn cache_key(url: &str, branch: Option<&str>) -> String {
        let mut key = url
            .trim()
            .replace("https://", "")
            .replace("http://", "")
            .replace("file://", "file_");
        key = key.replace(['/', ':'], "_");

        if let Some(b) = branch.filter(|b| !is_default_branch(b)) {
            key = format!("{key}@{b}");
        }
        key
    }

    /// Local mirror path for a repository; pure, performs no I/O
    pub fn get_repo_path(&self, url: &str, branch: Option<&str>) -> PathBuf {
        self.cache_dir.join(Self::cache_key(url, branch))
    }

    /// Whether a valid mirror exists for this (url, branch)
    pub fn has_repo(&self, url: &str, branch: Option<&str>) -> bool {
        Git::is_repo(&self.get_repo_path(url, branch))
    }

    /// Clone a repository into the cache, or refresh an existing mirror
    ///
    /// Branch-scoped mirrors are first cloned shallow and single-branch;
    /// when the remote branch does not exist the clone falls back to the
    /// default branch and the requested branch is created locally. The
    /// unscoped mirror is always a full clone, with the requested branch
    /// checked out (or created) on top of it. Fetch failures on refresh
    /// are downgraded to warnings so a stale mirror stays usable offline.
    pub async fn clone_or_update(
        &mut self,
        url: &str,
        branch: Option<&str>,
        use_branch_cache: bool,
    ) -> MiniatureResult<PathBuf> {
        let cache_branch = branch.filter(|b| use_branch_cache && !is_default_branch(b));
        let repo_path = self.get_repo_path(url, cache_branch);

        let git = if Git::is_repo(&repo_path) {
            let git = Git::open(&repo_path);
            if let Err(e) = git.fetch().await {
                warn!("Failed to fetch updates for {url}: {e}");
            }
            if let Some(b) = branch {
                if git.has_local_branch(b).await? {
                    git.checkout(b).await?;
                }
            }
            git
        } else {
            info!("Cloning {url} into cache");
            // Only a branch-scoped mirror may be shallow and single-branch;
            // the unscoped mirror is shared with default-branch loads and
            // must stay a full clone whatever branch the caller wants.
            match cache_branch {
                Some(b) => match Git::clone_branch_shallow(url, &repo_path, b).await {
                    Ok(git) => git,
                    Err(MiniatureError::RemoteRefMissing { .. }) => {
                        info!("Branch '{b}' not found on remote; cloning default branch and creating it");
                        fsops::remove_path(&repo_path)?;
                        let git = Git::clone_repo(url, &repo_path).await?;
                        git.create_branch(b).await?;
                        git.checkout(b).await?;
                        git
                    }
                    Err(e) => return Err(e),
                },
                None => {
                    let git = Git::clone_repo(url, &repo_path).await?;
                    if let Some(b) = branch.filter(|b| !is_default_branch(b)) {
                        if git.has_local_branch(b).await? {
                            git.checkout(b).await?;
                        } else if git.has_remote_branch(b).await? {
                            git.create_branch_from(b, &format!("origin/{b}")).await?;
                            git.checkout(b).await?;
                        } else {
                            git.create_branch(b).await?;
                            git.checkout(b).await?;
                        }
                    }
                    git
                }
            }
        };

        let last_updated = match git.head_commit_time().await {
            Ok(t) => t,
            Err(e) => {
                debug!("No commit timestamp for {url} ({e}); using current time");
                Utc::now()
            }
        };

        let index_key = match (cache_branch, branch) {
            (Some(_), Some(b)) => format!("{url}@{b}"),
            _ => url.to_string(),
        };
        self.index.upsert(
            index_key,
            CacheEntry {
                cache_key: Self::cache_key(url, cache_branch),
                path: repo_path.clone(),
                branch: branch.map(str::to_string),
                last_updated,
            },
        )?;

        if filemode::should_disable_filemode(&repo_path) {
            filemode::disable_filemode(&git).await;
        }

        Ok(repo_path)
    }

    /// Return the default-branch mirror if cached, refreshing on request
    ///
    /// Returns `None` (not an error) when the repository has never been
    /// cloned into this cache.
    pub async fn get_repo(&self, url: &str, ensure_latest: bool) -> MiniatureResult<Option<PathBuf>> {
        if !self.has_repo(url, None) {
            return Ok(None);
        }

        let repo_path = self.get_repo_path(url, None);
        if ensure_latest {
            if let Err(e) = Git::open(&repo_path).fetch().await {
                warn!("Failed to fetch updates for {url}: {e}");
            }
        }
        Ok(Some(repo_path))
    }

    /// Remove all mirrors and index entries for a repository URL
    ///
    /// Covers the default mirror and every branch-scoped mirror of the
    /// same URL. Idempotent: removing an uncached URL succeeds.
    pub fn remove_repo(&mut self, url: &str) -> MiniatureResult<()> {
        fsops::remove_path(&self.get_repo_path(url, None))?;

        let removed = self.index.remove_matching(|key, _| {
            key == url || key.strip_prefix(url).is_some_and(|rest| rest.starts_with('@'))
        })?;
        for entry in removed {
            fsops::remove_path(&entry.path)?;
        }
        Ok(())
    }

    /// Delete every mirror and reset the index
    pub fn clear_cache(&mut self) -> MiniatureResult<()> {
        fsops::remove_path(&self.cache_dir)?;
        fs::create_dir_all(&self.cache_dir).map_err(|e| {
            MiniatureError::io(
                format!("creating cache directory {}", self.cache_dir.display()),
                e,
            )
        })?;
        self.index.clear()
    }

    /// Create a symlink from `target` into a cached mirror
    ///
    /// Whatever currently occupies `target` (file, directory, or link) is
    /// replaced. Fails when the repository is not cached or
    /// `package_path` does not exist inside the mirror.
    pub fn create_symlink(
        &self,
        url: &str,
        target: &Path,
        package_path: &str,
        branch: Option<&str>,
    ) -> MiniatureResult<()> {
        let cache_branch = branch.filter(|b| !is_default_branch(b));

        if !self.has_repo(url, cache_branch) {
            return Err(MiniatureError::RepoNotCached {
                url: url.to_string(),
                branch: branch.unwrap_or("default").to_string(),
            });
        }

        let source = self.get_repo_path(url, cache_branch).join(package_path);
        if !source.exists() {
            return Err(MiniatureError::PackagePathNotFound {
                path: package_path.to_string(),
            });
        }

        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    MiniatureError::io(format!("creating directory {}", parent.display()), e)
                })?;
            }
        }

        fsops::remove_path(target)?;

        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(&source, target).map_err(|e| {
                MiniatureError::io(
                    format!("linking {} to {}", target.display(), source.display()),
                    e,
                )
            })?;
            info!("Created symlink: {} -> {}", target.display(), source.display());
            Ok(())
        }
        #[cfg(not(unix))]
        {
            Err(MiniatureError::User(
                "symlink materialization is only supported on Unix platforms".to_string(),
            ))
        }
    }

    /// Snapshot of the persisted index
    pub fn list_cached_repos(&self) -> BTreeMap<String, CacheEntry> {
        self.index.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cache() -> (TempDir, RepositoryCache) {
        let temp = TempDir::new().unwrap();
        let cache = RepositoryCache::new(Some(temp.path().join("cache"))).unwrap();
        (temp, cache)
    }

    #[test]
    fn cache_key_strips_protocol_and_flattens() {
        assert_eq!(
            RepositoryCache::cache_key("https://example.com/team/repo", None),
            "example.com_team_repo"
        );
        assert_eq!(
            RepositoryCache::cache_key("file:///tmp/repos/x", None),
            "file__tmp_repos_x"
        );
    }

    #[test]
    fn cache_key_default_branches_share_mirror() {
        let bare = RepositoryCache::cache_key("https://example.com/r", None);
        assert_eq!(RepositoryCache::cache_key("https://example.com/r", Some("main")), bare);
        assert_eq!(
            RepositoryCache::cache_key("https://example.com/r", Some("master")),
            bare
        );
    }

    #[test]
    fn cache_key_branch_scoping_never_collides() {
        let url = "https://example.com/r";
        let default = RepositoryCache::cache_key(url, None);
        let dev = RepositoryCache::cache_key(url, Some("dev"));
        let feature = RepositoryCache::cache_key(url, Some("feature-x"));

        assert_ne!(dev, default);
        assert_ne!(feature, default);
        assert_ne!(dev, feature);
        assert_eq!(dev, RepositoryCache::cache_key(url, Some("dev")));
    }

    #[test]
    fn get_repo_path_is_deterministic() {
        let (_temp, cache) = cache();
        let a = cache.get_repo_path("https://example.com/r", Some("dev"));
        let b = cache.get_repo_path("https://example.com/r", Some("dev"));
        assert_eq!(a, b);
        assert!(a.starts_with(cache.cache_dir()));
    }

    #[test]
    fn has_repo_requires_git_marker() {
        let (_temp, cache) = cache();
        let url = "https://example.com/r";
        assert!(!cache.has_repo(url, None));

        // a bare directory is not a valid mirror
        fs::create_dir_all(cache.get_repo_path(url, None)).unwrap();
        assert!(!cache.has_repo(url, None));

        fs::create_dir_all(cache.get_repo_path(url, None).join(".git")).unwrap();
        assert!(cache.has_repo(url, None));
    }

    #[test]
    fn remove_repo_is_idempotent() {
        let (_temp, mut cache) = cache();
        cache.remove_repo("https://example.com/never-cached").unwrap();
        cache.remove_repo("https://example.com/never-cached").unwrap();
    }

    #[test]
    fn clear_cache_resets_directory_and_index() {
        let (_temp, mut cache) = cache();
        let marker = cache.cache_dir().join("example.com_r/.git");
        fs::create_dir_all(&marker).unwrap();

        cache.clear_cache().unwrap();
        assert!(!marker.exists());
        assert!(cache.cache_dir().exists());
        assert!(cache.list_cached_repos().is_empty());
    }

    #[test]
    fn symlink_requires_cached_repo() {
        let (temp, cache) = cache();
        let result = cache.create_symlink(
            "https://example.com/r",
            &temp.path().join("target"),
            ".",
            None,
        );
        assert!(matches!(result, Err(MiniatureError::RepoNotCached { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_replaces_existing_directory() {
        let (temp, cache) = cache();
        let url = "https://example.com/r";

        let mirror = cache.get_repo_path(url, None);
        fs::create_dir_all(mirror.join(".git")).unwrap();
        fs::create_dir_all(mirror.join("pkg")).unwrap();
        fs::write(mirror.join("pkg/lib.rs"), "pub fn f() {}").unwrap();

        // plain directory already occupying the target
        let target = temp.path().join("target");
        fs::create_dir_all(target.join("stale")).unwrap();

        cache.create_symlink(url, &target, "pkg", None).unwrap();

        assert!(target.is_symlink());
        assert!(target.join("lib.rs").exists());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_rejects_missing_package_path() {
        let (temp, cache) = cache();
        let url = "https://example.com/r";
        fs::create_dir_all(cache.get_repo_path(url, None).join(".git")).unwrap();

        let result = cache.create_symlink(url, &temp.path().join("t"), "no-such-dir", None);
        assert!(matches!(
            result,
            Err(MiniatureError::PackagePathNotFound { .. })
        ));
    }
}
