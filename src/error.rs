//! Error types for miniature
//!
//! All modules use `MiniatureResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for miniature operations
pub type MiniatureResult<T> = Result<T, MiniatureError>;

/// All errors that can occur in miniature
#[derive(Error, Debug)]
pub enum MiniatureError {
    // Cache errors
    #[error("Repository {url} (branch: {branch}) not in cache")]
    RepoNotCached { url: String, branch: String },

    #[error("Package path {path} not found in repository mirror")]
    PackagePathNotFound { path: String },

    // Resolution errors
    #[error("No tag found matching version {constraint}")]
    VersionNotFound { constraint: String },

    #[error("Remote ref not found: {reference}")]
    RemoteRefMissing { reference: String },

    #[error("Unresolvable reference {reference}: {reason}")]
    ReferenceInvalid { reference: String, reason: String },

    // Tag errors
    #[error("Tag '{0}' already exists. Use --force to overwrite.")]
    TagExists(String),

    // Manifest errors
    #[error("Manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    #[error("Invalid manifest at {path}: {reason}")]
    ManifestInvalid { path: PathBuf, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // Transport errors
    #[error("Transport failure during {operation}: {stderr}")]
    Transport { operation: String, stderr: String },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl MiniatureError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// True for failures where a stale cached copy is still usable
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::TagExists(_) => Some("Re-run with --force to overwrite the existing tag"),
            Self::ManifestNotFound(_) => {
                Some("Create a pkg.json with at least name, version, and db-repo")
            }
            Self::Transport { .. } => Some("Check network access and the remote URL"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = MiniatureError::TagExists("lib/1.0.0".to_string());
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn error_hint() {
        let err = MiniatureError::TagExists("v1".to_string());
        assert!(err.hint().unwrap().contains("--force"));
        assert!(MiniatureError::Internal("x".into()).hint().is_none());
    }

    #[test]
    fn transport_classification() {
        let err = MiniatureError::Transport {
            operation: "fetch".into(),
            stderr: "could not resolve host".into(),
        };
        assert!(err.is_transport());
        let err = MiniatureError::VersionNotFound {
            constraint: ">=2".into(),
        };
        assert!(!err.is_transport());
    }
}
