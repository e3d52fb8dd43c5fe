//! Configuration schema for miniature
//!
//! Configuration is stored at `~/.config/miniature/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache settings
    pub cache: CacheConfig,

    /// Git defaults
    pub git: GitConfig,
}

/// Cache settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root directory; `~/.miniature/cache` when unset
    pub dir: Option<PathBuf>,
}

/// Git defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Branch used when neither the command line nor a manifest names one
    pub default_branch: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            default_branch: "main".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.cache.dir, None);
        assert_eq!(config.git.default_branch, "main");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [cache]
            dir = "/srv/miniature-cache"
            "#,
        )
        .unwrap();
        assert_eq!(config.cache.dir, Some(PathBuf::from("/srv/miniature-cache")));
        assert_eq!(config.git.default_branch, "main");
    }
}
