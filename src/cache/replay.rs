//! In-memory response cache with ordered replay
//!
//! Each key maps to the sequence of responses observed for that query, in the
//! order they were seen. Replaying a key walks that sequence with a per-key
//! cursor; what happens once the sequence is exhausted depends on the entry's
//! [`ExhaustionPattern`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// What a cache entry returns once every recorded response has been replayed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ExhaustionPattern {
    /// Keep returning the last recorded response
    #[default]
    Repeat,
    /// Return nothing further
    Empty,
}

impl ExhaustionPattern {
    /// The tag used for this pattern in the persisted cache format
    pub fn as_str(&self) -> &'static str {
        match self {
            ExhaustionPattern::Repeat => "repeat",
            ExhaustionPattern::Empty => "empty",
        }
    }
}

impl fmt::Display for ExhaustionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExhaustionPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "repeat" => Ok(ExhaustionPattern::Repeat),
            "empty" => Ok(ExhaustionPattern::Empty),
            other => Err(format!("unknown exhaustion pattern '{}'", other)),
        }
    }
}

/// Recorded responses for a single query key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Fixed when the entry is created
    pub pattern: ExhaustionPattern,
    /// Raw response bodies in the order they were observed
    pub responses: Vec<String>,
}

impl CacheEntry {
    pub fn new(pattern: ExhaustionPattern) -> Self {
        Self {
            pattern,
            responses: Vec::new(),
        }
    }
}

/// Maps query keys to recorded response sequences and replays them in order
#[derive(Debug, Clone, Default)]
pub struct ResponseCache {
    entries: HashMap<String, CacheEntry>,
    /// Number of responses already replayed per key
    cursors: HashMap<String, usize>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cache from existing entries with every cursor at zero
    pub fn from_entries(entries: HashMap<String, CacheEntry>) -> Self {
        let cursors = entries.keys().map(|key| (key.clone(), 0)).collect();
        Self { entries, cursors }
    }

    /// Appends a response to `key`, creating the entry with `pattern` if it is new.
    ///
    /// `pattern` is ignored for keys that already exist.
    pub fn record(&mut self, key: &str, value: impl Into<String>, pattern: ExhaustionPattern) {
        if !self.entries.contains_key(key) {
            self.entries.insert(key.to_string(), CacheEntry::new(pattern));
            self.cursors.insert(key.to_string(), 0);
        }
        let Some(entry) = self.entries.get_mut(key) else {
            return;
        };
        entry.responses.push(value.into());
        tracing::debug!(key, count = entry.responses.len(), "recorded response");
    }

    /// Removes `key` and its cursor, if present
    pub fn forget(&mut self, key: &str) -> Option<CacheEntry> {
        self.cursors.remove(key);
        let removed = self.entries.remove(key);
        if removed.is_some() {
            tracing::debug!(key, "forgot cache entry");
        }
        removed
    }

    /// Returns the next recorded response for `key`.
    ///
    /// Unknown keys yield an empty string and are not inserted. Once the
    /// cursor has passed every recorded response, `Repeat` entries keep
    /// returning the last response and `Empty` entries return an empty string.
    pub fn lookup_next(&mut self, key: &str) -> String {
        let Some(entry) = self.entries.get(key) else {
            tracing::warn!(key, "no recorded responses for key");
            return String::new();
        };

        let cursor = self.cursors.entry(key.to_string()).or_insert(0);
        if *cursor < entry.responses.len() {
            let value = entry.responses[*cursor].clone();
            *cursor += 1;
            tracing::debug!(key, position = *cursor, "replayed response");
            return value;
        }

        match entry.pattern {
            ExhaustionPattern::Repeat => entry.responses.last().cloned().unwrap_or_default(),
            ExhaustionPattern::Empty => String::new(),
        }
    }

    /// Rewinds every cursor to the first recorded response
    pub fn reset_cursors(&mut self) {
        for cursor in self.cursors.values_mut() {
            *cursor = 0;
        }
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn entries(&self) -> &HashMap<String, CacheEntry> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
