//! Connection mode and recording state
//!
//! `CacheSession` owns the response cache together with the flags that decide
//! how a query is served: whether the client talks to the network or replays
//! recorded responses, and whether live responses are being recorded.

use std::path::Path;

use super::manager::{CacheLoadError, CacheManager, CacheSaveError};
use super::replay::{ExhaustionPattern, ResponseCache};

/// Where query results come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Every query performs a network request
    #[default]
    Live,
    /// Every query is answered from the response cache
    Replay,
}

/// Response cache plus the connection and recording flags that drive it
#[derive(Debug, Clone, Default)]
pub struct CacheSession {
    cache: ResponseCache,
    mode: ConnectionMode,
    editing: bool,
    /// Pattern given to entries created while editing
    pattern: ExhaustionPattern,
}

impl CacheSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session in replay mode over an already built cache
    pub fn replaying(cache: ResponseCache) -> Self {
        let mut session = Self::new();
        session.cache = cache;
        session.cache.reset_cursors();
        session.mode = ConnectionMode::Replay;
        session
    }

    /// Switches to live mode; the cache is kept as is
    pub fn go_live(&mut self) {
        self.mode = ConnectionMode::Live;
        tracing::info!("connection mode set to live");
    }

    /// Loads the cache from `source` and switches to replay mode.
    ///
    /// On failure the session keeps its previous cache and mode.
    pub fn go_replay(&mut self, source: &CacheManager) -> Result<(), CacheLoadError> {
        self.cache = source.load()?;
        self.cache.reset_cursors();
        self.mode = ConnectionMode::Replay;
        tracing::info!(path = %source.path().display(), "connection mode set to replay");
        Ok(())
    }

    /// Loads the cache file at `path` and switches to replay mode
    pub fn go_replay_from(&mut self, path: impl AsRef<Path>) -> Result<(), CacheLoadError> {
        self.go_replay(&CacheManager::with_path(path.as_ref()))
    }

    /// Replaces the cache with the contents of the file at `path`.
    ///
    /// The connection mode and recording flags are unchanged, so live
    /// responses recorded afterwards are appended to what was loaded.
    pub fn load_from(&mut self, path: impl AsRef<Path>) -> Result<(), CacheLoadError> {
        self.cache = CacheManager::with_path(path.as_ref()).load()?;
        Ok(())
    }

    /// Starts recording live responses; new entries get `pattern`
    pub fn begin_edit(&mut self, pattern: ExhaustionPattern) {
        self.editing = true;
        self.pattern = pattern;
        tracing::debug!(%pattern, "recording enabled");
    }

    /// Stops recording live responses
    pub fn end_edit(&mut self) {
        self.editing = false;
        tracing::debug!("recording disabled");
    }

    /// Records `value` under `key` using the current editing pattern
    pub fn record(&mut self, key: &str, value: impl Into<String>) {
        self.cache.record(key, value, self.pattern);
    }

    /// Removes a key from the cache
    pub fn forget(&mut self, key: &str) {
        self.cache.forget(key);
    }

    /// Returns the next recorded response for `key`
    pub fn lookup_next(&mut self, key: &str) -> String {
        self.cache.lookup_next(key)
    }

    /// Writes the current cache to `target`
    pub fn save(&self, target: &CacheManager) -> Result<(), CacheSaveError> {
        target.save(&self.cache)
    }

    /// Writes the current cache to the file at `path`
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), CacheSaveError> {
        self.save(&CacheManager::with_path(path.as_ref()))
    }

    pub fn mode(&self) -> ConnectionMode {
        self.mode
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn pattern(&self) -> ExhaustionPattern {
        self.pattern
    }

    /// True when live responses should be written to the cache
    pub fn should_record(&self) -> bool {
        self.editing && self.mode == ConnectionMode::Live
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }
}
