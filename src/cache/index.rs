//! Persisted cache index
//!
//! A single JSON file maps index keys (`url` or `url@branch`) to cache
//! entries. The index is the source of truth for "is this repository
//! cached"; writes go through a temp file and an atomic rename so a
//! crashed or racing writer can never leave a half-written index behind.

use crate::error::{MiniatureError, MiniatureResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// One cached repository mirror
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Deterministic key derived from URL and branch
    pub cache_key: String,

    /// Filesystem path of the mirror
    pub path: PathBuf,

    /// Branch this mirror tracks, if branch-scoped
    pub branch: Option<String>,

    /// Committer timestamp of the mirror's HEAD at last sync
    pub last_updated: DateTime<Utc>,
}

/// In-memory view of the index file
#[derive(Debug, Default)]
pub struct CacheIndex {
    file: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
}

impl CacheIndex {
    /// Load the index from disk, starting empty when the file is absent
    pub fn load(file: PathBuf) -> MiniatureResult<Self> {
        let entries = if file.exists() {
            let content = fs::read_to_string(&file)
                .map_err(|e| MiniatureError::io(format!("reading index {}", file.display()), e))?;
            serde_json::from_str(&content)?
        } else {
            BTreeMap::new()
        };
        Ok(Self { file, entries })
    }

    /// Insert or replace an entry and persist
    pub fn upsert(&mut self, key: impl Into<String>, entry: CacheEntry) -> MiniatureResult<()> {
        self.entries.insert(key.into(), entry);
        self.save()
    }

    /// Remove every entry matching the predicate and persist
    pub fn remove_matching<F>(&mut self, predicate: F) -> MiniatureResult<Vec<CacheEntry>>
    where
        F: Fn(&str, &CacheEntry) -> bool,
    {
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(k, v)| predicate(k, v))
            .map(|(k, _)| k.clone())
            .collect();

        let mut removed = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(entry) = self.entries.remove(&key) {
                removed.push(entry);
            }
        }
        if !removed.is_empty() {
            self.save()?;
        }
        Ok(removed)
    }

    /// Drop all entries and persist
    pub fn clear(&mut self) -> MiniatureResult<()> {
        self.entries.clear();
        self.save()
    }

    /// Look up an entry
    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Snapshot of all entries
    pub fn snapshot(&self) -> BTreeMap<String, CacheEntry> {
        self.entries.clone()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no repository is indexed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the whole index atomically: temp file sibling, then rename
    fn save(&self) -> MiniatureResult<()> {
        if let Some(parent) = self.file.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                MiniatureError::io(format!("creating directory {}", parent.display()), e)
            })?;
        }

        let content = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.file.with_extension("json.tmp");
        fs::write(&tmp, content)
            .map_err(|e| MiniatureError::io(format!("writing index {}", tmp.display()), e))?;
        fs::rename(&tmp, &self.file).map_err(|e| {
            MiniatureError::io(
                format!("renaming {} to {}", tmp.display(), self.file.display()),
                e,
            )
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(key: &str, branch: Option<&str>) -> CacheEntry {
        CacheEntry {
            cache_key: key.to_string(),
            path: PathBuf::from("/cache").join(key),
            branch: branch.map(str::to_string),
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn load_missing_file_starts_empty() {
        let temp = TempDir::new().unwrap();
        let index = CacheIndex::load(temp.path().join("index.json")).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn upsert_persists_and_reloads() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("index.json");

        let mut index = CacheIndex::load(file.clone()).unwrap();
        index
            .upsert("example.com/repo", entry("example.com_repo", None))
            .unwrap();

        let reloaded = CacheIndex::load(file).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(
            reloaded.get("example.com/repo").unwrap().cache_key,
            "example.com_repo"
        );
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("index.json");

        let mut index = CacheIndex::load(file.clone()).unwrap();
        index.upsert("k", entry("k", None)).unwrap();

        assert!(file.exists());
        assert!(!file.with_extension("json.tmp").exists());
    }

    #[test]
    fn remove_matching_filters_by_url() {
        let temp = TempDir::new().unwrap();
        let mut index = CacheIndex::load(temp.path().join("index.json")).unwrap();

        index.upsert("u1", entry("u1", None)).unwrap();
        index.upsert("u1@dev", entry("u1@dev", Some("dev"))).unwrap();
        index.upsert("u2", entry("u2", None)).unwrap();

        let removed = index
            .remove_matching(|k, _| k == "u1" || k.starts_with("u1@"))
            .unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(index.len(), 1);
        assert!(index.get("u2").is_some());
    }

    #[test]
    fn clear_empties_index() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("index.json");
        let mut index = CacheIndex::load(file.clone()).unwrap();
        index.upsert("k", entry("k", None)).unwrap();

        index.clear().unwrap();
        assert!(index.is_empty());
        assert!(CacheIndex::load(file).unwrap().is_empty());
    }
}
