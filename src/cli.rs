//! Command-line interface parsing for the heifer client
//!
//! This module handles parsing of CLI arguments using clap, including the
//! --offline and --record flags that switch the client into replay or
//! recording mode with an optional cache file path.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::cache::{CacheManager, ExhaustionPattern};
use crate::data::{ClientConfig, DEFAULT_BASE_URL};

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The predicate is blank
    #[error("Please enter a valid query, e.g. 'Index==4999'")]
    EmptyQuery,

    /// No cache path was given and the default cache directory is unknown
    #[error("Could not determine a cache directory; pass a cache file path explicitly")]
    NoCacheDirectory,

    /// A zero timeout would fail every request
    #[error("Timeout must be at least one second")]
    InvalidTimeout,
}

/// Heifer - query the Heifer livestock data service
#[derive(Parser, Debug)]
#[command(name = "heifer")]
#[command(about = "Query heifer records, live or from a recorded cache")]
#[command(version)]
pub struct Cli {
    /// Query predicate, e.g. "Index==4999"
    pub query: String,

    /// Replay responses from a cache file instead of using the network
    ///
    /// Uses the default cache file when no path is given.
    #[arg(long, value_name = "CACHE", conflicts_with = "record")]
    pub offline: Option<Option<PathBuf>>,

    /// Record live responses and save them to a cache file
    ///
    /// Uses the default cache file when no path is given.
    #[arg(long, value_name = "CACHE")]
    pub record: Option<Option<PathBuf>>,

    /// What replay returns once a query's recorded responses run out
    ///
    /// Valid patterns: repeat, empty
    #[arg(long, value_name = "PATTERN", default_value = "repeat")]
    pub pattern: ExhaustionPattern,

    /// Service endpoint
    #[arg(long, value_name = "URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,
}

/// How the client should treat the response cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheMode {
    /// Query live without recording
    Live,
    /// Answer from the cache file at this path
    Replay(PathBuf),
    /// Query live and save responses to this path
    Record {
        path: PathBuf,
        pattern: ExhaustionPattern,
    },
}

/// Configuration derived from CLI arguments for a single run
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// The predicate to query
    pub query: String,
    /// Client settings
    pub client: ClientConfig,
    /// Cache handling for this run
    pub cache: CacheMode,
}

/// Resolves an optional cache path argument, falling back to the default file
fn resolve_cache_path(path: &Option<PathBuf>) -> Result<PathBuf, CliError> {
    match path {
        Some(path) => Ok(path.clone()),
        None => CacheManager::new()
            .map(|manager| manager.path().to_path_buf())
            .ok_or(CliError::NoCacheDirectory),
    }
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if the query or timeout is unusable, or no cache path can be found
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.query.trim().is_empty() {
            return Err(CliError::EmptyQuery);
        }
        if cli.timeout == 0 {
            return Err(CliError::InvalidTimeout);
        }

        let cache = match (&cli.offline, &cli.record) {
            (Some(path), _) => CacheMode::Replay(resolve_cache_path(path)?),
            (None, Some(path)) => CacheMode::Record {
                path: resolve_cache_path(path)?,
                pattern: cli.pattern,
            },
            (None, None) => CacheMode::Live,
        };

        Ok(StartupConfig {
            query: cli.query.clone(),
            client: ClientConfig {
                base_url: cli.base_url.clone(),
                timeout: Duration::from_secs(cli.timeout),
                ..ClientConfig::default()
            },
            cache,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_query_only() {
        let cli = Cli::parse_from(["heifer", "Index==4999"]);
        assert_eq!(cli.query, "Index==4999");
        assert!(cli.offline.is_none());
        assert!(cli.record.is_none());
        assert_eq!(cli.pattern, ExhaustionPattern::Repeat);
        assert_eq!(cli.base_url, DEFAULT_BASE_URL);
        assert_eq!(cli.timeout, 30);
    }

    #[test]
    fn test_cli_parse_offline_with_path() {
        let cli = Cli::parse_from(["heifer", "--offline", "cache.json", "Index==4999"]);
        assert_eq!(
            cli.offline.as_ref().unwrap().as_deref(),
            Some(std::path::Path::new("cache.json"))
        );
    }

    #[test]
    fn test_cli_parse_record_with_pattern() {
        let cli = Cli::parse_from([
            "heifer", "--record", "out.json", "--pattern", "empty", "Index==4999",
        ]);
        assert!(cli.record.is_some());
        assert_eq!(cli.pattern, ExhaustionPattern::Empty);
    }

    #[test]
    fn test_cli_rejects_unknown_pattern() {
        let result = Cli::try_parse_from(["heifer", "--pattern", "loop", "Index==4999"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_offline_conflicts_with_record() {
        let result = Cli::try_parse_from([
            "heifer", "--offline", "a.json", "--record", "b.json", "Index==4999",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_startup_config_live() {
        let cli = Cli::parse_from(["heifer", "--timeout", "5", "Index==4999"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.cache, CacheMode::Live);
        assert_eq!(config.client.timeout, Duration::from_secs(5));
        assert_eq!(config.query, "Index==4999");
    }

    #[test]
    fn test_startup_config_replay_path() {
        let cli = Cli::parse_from(["heifer", "--offline", "cache.json", "Index==4999"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.cache, CacheMode::Replay(PathBuf::from("cache.json")));
    }

    #[test]
    fn test_startup_config_record_carries_pattern() {
        let cli = Cli::parse_from([
            "heifer", "--record", "out.json", "--pattern", "empty", "Index==4999",
        ]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(
            config.cache,
            CacheMode::Record {
                path: PathBuf::from("out.json"),
                pattern: ExhaustionPattern::Empty,
            }
        );
    }

    #[test]
    fn test_startup_config_blank_query() {
        let cli = Cli::parse_from(["heifer", "  "]);
        let result = StartupConfig::from_cli(&cli);
        assert!(matches!(result, Err(CliError::EmptyQuery)));
    }

    #[test]
    fn test_startup_config_zero_timeout() {
        let cli = Cli::parse_from(["heifer", "--timeout", "0", "Index==4999"]);
        assert!(matches!(
            StartupConfig::from_cli(&cli),
            Err(CliError::InvalidTimeout)
        ));
    }
}
