//! Cache persistence for recorded responses
//!
//! Provides a `CacheManager` that reads and writes the whole response cache as a
//! single JSON document:
//!
//! ```json
//! { "data": { "<key>": ["repeat", "<response 1>", "<response 2>"] }, "metadata": "" }
//! ```
//!
//! The first element of each value array is the entry's exhaustion pattern; the
//! remaining elements are the recorded responses in order.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::replay::{CacheEntry, ExhaustionPattern, ResponseCache};

/// File name used inside the default cache directory
const CACHE_FILE_NAME: &str = "cache.json";

/// Errors that can occur when loading a persisted cache
#[derive(Debug, Error)]
pub enum CacheLoadError {
    /// The cache file could not be read
    #[error("The cache file '{}' could not be read: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cache file is not a valid cache document
    #[error("The cache file '{}' could not be parsed: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An entry is missing its pattern tag or names an unknown pattern
    #[error("Invalid cache entry for '{key}': {reason}")]
    InvalidEntry { key: String, reason: String },
}

/// Errors that can occur when saving the cache
#[derive(Debug, Error)]
pub enum CacheSaveError {
    /// Directory creation or file writing failed
    #[error("Failed to write cache file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cache could not be encoded as JSON
    #[error("Failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// On-disk shape of the response cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheFile {
    /// Pattern tag followed by the recorded responses, per key
    pub data: BTreeMap<String, Vec<String>>,
    /// Reserved, always empty
    #[serde(default)]
    pub metadata: String,
}

impl CacheFile {
    /// Converts the document into entries, validating every pattern tag
    fn into_entries(self) -> Result<HashMap<String, CacheEntry>, CacheLoadError> {
        let mut entries = HashMap::with_capacity(self.data.len());

        for (key, values) in self.data {
            let mut values = values.into_iter();
            let tag = values.next().ok_or_else(|| CacheLoadError::InvalidEntry {
                key: key.clone(),
                reason: "missing exhaustion pattern".to_string(),
            })?;
            let pattern = tag
                .parse::<ExhaustionPattern>()
                .map_err(|reason| CacheLoadError::InvalidEntry {
                    key: key.clone(),
                    reason,
                })?;

            entries.insert(
                key,
                CacheEntry {
                    pattern,
                    responses: values.collect(),
                },
            );
        }

        Ok(entries)
    }
}

impl ResponseCache {
    /// Exports the full cache state
    pub fn save(&self) -> CacheFile {
        let data = self
            .entries()
            .iter()
            .map(|(key, entry)| {
                let mut values = Vec::with_capacity(entry.responses.len() + 1);
                values.push(entry.pattern.as_str().to_string());
                values.extend(entry.responses.iter().cloned());
                (key.clone(), values)
            })
            .collect();

        CacheFile {
            data,
            metadata: String::new(),
        }
    }

    /// Replaces the full cache state with `snapshot`, rewinding every cursor.
    ///
    /// The current state is left untouched if the snapshot is invalid.
    pub fn load(&mut self, snapshot: CacheFile) -> Result<(), CacheLoadError> {
        *self = ResponseCache::from_entries(snapshot.into_entries()?);
        Ok(())
    }
}

/// Reads and writes the response cache to a JSON file
///
/// The default location is XDG-compliant (`~/.cache/heifer/cache.json` on Linux).
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Location of the cache file
    path: PathBuf,
}

impl CacheManager {
    /// Creates a new CacheManager using the XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "heifer")?;
        let path = project_dirs.cache_dir().join(CACHE_FILE_NAME);
        Some(Self { path })
    }

    /// Creates a new CacheManager for a specific cache file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the cache document from disk
    pub fn read(&self) -> Result<CacheFile, CacheLoadError> {
        let content = fs::read_to_string(&self.path).map_err(|source| CacheLoadError::Io {
            path: self.path.clone(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| CacheLoadError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Reads the cache document and builds a `ResponseCache` from it
    pub fn load(&self) -> Result<ResponseCache, CacheLoadError> {
        let mut cache = ResponseCache::new();
        cache.load(self.read()?)?;
        tracing::info!(path = %self.path.display(), keys = cache.len(), "loaded response cache");
        Ok(cache)
    }

    /// Writes `cache` to disk, creating the parent directory if needed
    pub fn save(&self, cache: &ResponseCache) -> Result<(), CacheSaveError> {
        let io_err = |source: std::io::Error| CacheSaveError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let json = serde_json::to_string(&cache.save())?;
        fs::write(&self.path, json).map_err(io_err)?;

        tracing::info!(path = %self.path.display(), keys = cache.len(), "saved response cache");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_manager() -> (CacheManager, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let manager = CacheManager::with_path(temp_dir.path().join("cache.json"));
        (manager, temp_dir)
    }

    fn sample_cache() -> ResponseCache {
        let mut cache = ResponseCache::new();
        cache.record("http://host/q?where=a", "first", ExhaustionPattern::Repeat);
        cache.record("http://host/q?where=a", "second", ExhaustionPattern::Repeat);
        cache.record("http://host/q?where=b", "only", ExhaustionPattern::Empty);
        cache
    }

    #[test]
    fn test_save_writes_data_and_metadata() {
        let (manager, _temp_dir) = create_test_manager();

        manager.save(&sample_cache()).expect("Save should succeed");

        let content = fs::read_to_string(manager.path()).expect("Should read file");
        let value: serde_json::Value = serde_json::from_str(&content).expect("Valid JSON");
        assert_eq!(value["metadata"], "");
        assert_eq!(
            value["data"]["http://host/q?where=a"],
            serde_json::json!(["repeat", "first", "second"])
        );
        assert_eq!(
            value["data"]["http://host/q?where=b"],
            serde_json::json!(["empty", "only"])
        );
    }

    #[test]
    fn test_roundtrip_preserves_entries_and_resets_cursors() {
        let (manager, _temp_dir) = create_test_manager();
        let mut original = sample_cache();
        // Advance a cursor before saving; the reloaded cache must start over
        assert_eq!(original.lookup_next("http://host/q?where=a"), "first");

        manager.save(&original).expect("Save should succeed");
        let mut loaded = manager.load().expect("Load should succeed");

        assert_eq!(loaded.entries(), original.entries());
        assert_eq!(loaded.lookup_next("http://host/q?where=a"), "first");
        assert_eq!(loaded.lookup_next("http://host/q?where=a"), "second");
        assert_eq!(loaded.lookup_next("http://host/q?where=b"), "only");
        assert_eq!(loaded.lookup_next("http://host/q?where=b"), "");
    }

    #[test]
    fn test_load_accepts_hand_written_document() {
        let (manager, _temp_dir) = create_test_manager();
        fs::write(
            manager.path(),
            r#"{"data": {"k": ["empty", "v1", "v2"], "bare": ["repeat"]}, "metadata": ""}"#,
        )
        .expect("Should write file");

        let mut cache = manager.load().expect("Load should succeed");

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.lookup_next("k"), "v1");
        assert_eq!(cache.lookup_next("k"), "v2");
        assert_eq!(cache.lookup_next("k"), "");
        assert_eq!(cache.lookup_next("bare"), "");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let (manager, _temp_dir) = create_test_manager();

        let err = manager.load().unwrap_err();

        assert!(matches!(err, CacheLoadError::Io { .. }));
        assert!(err.to_string().contains("cache.json"));
    }

    #[test]
    fn test_load_garbage_is_parse_error() {
        let (manager, _temp_dir) = create_test_manager();
        fs::write(manager.path(), "not json at all").expect("Should write file");

        assert!(matches!(manager.load(), Err(CacheLoadError::Parse { .. })));
    }

    #[test]
    fn test_load_rejects_unknown_pattern() {
        let (manager, _temp_dir) = create_test_manager();
        fs::write(manager.path(), r#"{"data": {"k": ["loop", "v1"]}, "metadata": ""}"#)
            .expect("Should write file");

        match manager.load() {
            Err(CacheLoadError::InvalidEntry { key, reason }) => {
                assert_eq!(key, "k");
                assert!(reason.contains("loop"));
            }
            other => panic!("expected InvalidEntry, got {:?}", other),
        }
    }

    #[test]
    fn test_load_rejects_entry_without_pattern() {
        let (manager, _temp_dir) = create_test_manager();
        fs::write(manager.path(), r#"{"data": {"k": []}}"#).expect("Should write file");

        assert!(matches!(
            manager.load(),
            Err(CacheLoadError::InvalidEntry { .. })
        ));
    }

    #[test]
    fn test_invalid_snapshot_leaves_cache_untouched() {
        let mut cache = sample_cache();
        let mut snapshot = CacheFile::default();
        snapshot.data.insert("k".to_string(), vec!["bogus".to_string()]);

        assert!(cache.load(snapshot).is_err());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_save_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested = temp_dir.path().join("nested").join("dir").join("cache.json");
        let manager = CacheManager::with_path(nested.clone());

        manager.save(&sample_cache()).expect("Save should succeed");

        assert!(nested.exists(), "Cache file should exist");
    }

    #[test]
    fn test_new_creates_xdg_compliant_path() {
        if let Some(manager) = CacheManager::new() {
            let path_str = manager.path().to_string_lossy();
            assert!(path_str.contains("heifer"), "Cache path should contain project name");
            assert!(path_str.ends_with("cache.json"));
        }
        // Test passes if new() returns None (e.g., no home directory in CI)
    }
}
