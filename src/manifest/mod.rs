//! Package manifests
//!
//! Two document families are consumed:
//! - `pkg.json`: metadata for one publishable package (name, version,
//!   `db-repo`, `root-dir`, branch, dependencies)
//! - workspace files (`miniature.json` / `repotree.json`): a set of
//!   package definitions in one of three shapes — a `dependencies`
//!   list, a `miniatures`/`repos` list, or the legacy `packages` map.
//!   The shape is auto-detected.
//!
//! Field names accept both camelCase and snake_case spellings.

use crate::error::{MiniatureError, MiniatureResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// String-valued command hints carried by a package definition
///
/// Hints (install/build commands) are surfaced to the user but never
/// executed by miniature.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomConfig(pub BTreeMap<String, String>);

impl CustomConfig {
    /// Install command hint, if declared
    pub fn install(&self) -> Option<&str> {
        self.get("install")
    }

    /// Arbitrary hint lookup
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// True when no hints are declared
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Version pin for packages consumed as released artifacts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PinnedVersion {
    /// Version or constraint string
    pub version: String,
}

/// One package entry in a workspace manifest
///
/// Immutable once parsed; used to derive the full repository URL and the
/// materialization target.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct PackageDefinition {
    /// Package name used for selection and default target naming
    #[serde(alias = "pkg_name")]
    pub pkg_name: Option<String>,

    /// Source domain, e.g. `https://github.com/acme`
    pub domain: Option<String>,

    /// Repository name under the domain
    #[serde(alias = "repo_name")]
    pub repo_name: Option<String>,

    /// Alternative spelling for the repository name
    pub repo: Option<String>,

    /// Branch to track
    pub branch: Option<String>,

    /// Tag to track (branch takes precedence)
    pub tag: Option<String>,

    /// Local directory to materialize into
    #[serde(alias = "local_dir")]
    pub local_dir: Option<String>,

    /// Whether this entry participates in bulk loads
    pub loaded: bool,

    /// Version pin for non-editable consumption
    #[serde(alias = "as_pkg")]
    pub as_pkg: Option<PinnedVersion>,

    /// Command hints (install, build, ...)
    #[serde(alias = "custom_config", skip_serializing_if = "CustomConfig::is_empty")]
    pub custom_config: CustomConfig,

    /// Version or constraint
    pub version: Option<String>,
}

impl PackageDefinition {
    /// Display name for summaries
    pub fn name(&self) -> &str {
        self.pkg_name.as_deref().unwrap_or("<unnamed>")
    }

    /// Construct the full repository URL from domain and repository name
    pub fn repo_url(&self) -> Option<String> {
        let domain = self.domain.as_deref()?.trim_end_matches('/');
        if domain.is_empty() {
            return None;
        }
        match self.repo_name.as_deref().or(self.repo.as_deref()) {
            Some(r) => Some(format!("{domain}/{r}")),
            None => Some(domain.to_string()),
        }
    }

    /// Branch or tag to check out, branch winning; defaults to `main`
    pub fn branch_or_tag(&self) -> &str {
        self.branch
            .as_deref()
            .or(self.tag.as_deref())
            .unwrap_or("main")
    }

    /// Version request for resolution, pin winning over plain version
    pub fn version_request(&self) -> Option<&str> {
        self.as_pkg
            .as_ref()
            .map(|p| p.version.as_str())
            .or(self.version.as_deref())
    }
}

/// Metadata for one publishable package (`pkg.json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageManifest {
    /// Package name
    pub name: String,

    /// Package version (required for tagging)
    #[serde(default)]
    pub version: Option<String>,

    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,

    /// Remote repository the package publishes into
    #[serde(default, rename = "db-repo")]
    pub db_repo: Option<String>,

    /// Subdirectory of the repository owned by this package
    #[serde(default, rename = "root-dir")]
    pub root_dir: Option<String>,

    /// Branch releases are cut from
    #[serde(default)]
    pub branch: Option<String>,

    /// Packages this one depends on
    #[serde(default)]
    pub dependencies: Vec<PackageDefinition>,
}

impl PackageManifest {
    /// Load and parse a pkg.json file
    pub fn from_file(path: &Path) -> MiniatureResult<Self> {
        if !path.exists() {
            return Err(MiniatureError::ManifestNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)
            .map_err(|e| MiniatureError::io(format!("reading manifest {}", path.display()), e))?;
        serde_json::from_str(&content).map_err(|e| MiniatureError::ManifestInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Branch releases are cut from, defaulting to `main`
    pub fn branch_or_default(&self) -> &str {
        self.branch.as_deref().unwrap_or("main")
    }

    /// In-repo subdirectory owned by the package, defaulting to `.`
    pub fn root_dir_or_default(&self) -> &str {
        self.root_dir.as_deref().unwrap_or(".")
    }
}

/// Legacy `packages` map entry
#[derive(Debug, Deserialize)]
struct LegacyPackage {
    #[serde(default, rename = "db-repo")]
    db_repo: Option<String>,
    #[serde(default, rename = "target-dir")]
    target_dir: Option<String>,
    #[serde(default)]
    branch: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

/// A workspace manifest: a set of package definitions
#[derive(Debug, Clone)]
pub struct WorkspaceManifest {
    /// All entries, in document order
    pub entries: Vec<PackageDefinition>,
}

impl WorkspaceManifest {
    /// Load a workspace file, auto-detecting its shape
    pub fn from_file(path: &Path) -> MiniatureResult<Self> {
        if !path.exists() {
            return Err(MiniatureError::ManifestNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)
            .map_err(|e| MiniatureError::io(format!("reading manifest {}", path.display()), e))?;
        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| MiniatureError::ManifestInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let invalid = |reason: String| MiniatureError::ManifestInvalid {
            path: path.to_path_buf(),
            reason,
        };

        // pkg.json with a dependencies list: every dependency is loadable
        if value.get("dependencies").is_some_and(serde_json::Value::is_array) {
            let manifest: PackageManifest =
                serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;
            let mut entries = manifest.dependencies;
            for entry in &mut entries {
                entry.loaded = true;
            }
            return Ok(Self { entries });
        }

        // miniature.json / repotree.json lists
        for key in ["miniatures", "repos"] {
            if let Some(list) = value.get(key) {
                let entries: Vec<PackageDefinition> =
                    serde_json::from_value(list.clone()).map_err(|e| invalid(e.to_string()))?;
                return Ok(Self { entries });
            }
        }

        // legacy packages map
        if let Some(map) = value.get("packages") {
            let packages: BTreeMap<String, LegacyPackage> =
                serde_json::from_value(map.clone()).map_err(|e| invalid(e.to_string()))?;
            let entries = packages
                .into_iter()
                .map(|(name, pkg)| PackageDefinition {
                    local_dir: Some(pkg.target_dir.unwrap_or_else(|| name.clone())),
                    pkg_name: Some(name),
                    domain: pkg.db_repo,
                    branch: pkg.branch,
                    version: pkg.version,
                    loaded: true,
                    ..PackageDefinition::default()
                })
                .collect();
            return Ok(Self { entries });
        }

        Err(invalid(
            "expected a 'dependencies', 'miniatures', 'repos', or 'packages' field".to_string(),
        ))
    }

    /// Entries flagged for loading
    pub fn loaded_entries(&self) -> Vec<&PackageDefinition> {
        self.entries.iter().filter(|e| e.loaded).collect()
    }
}
