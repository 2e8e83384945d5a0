//! Heifer data service client
//!
//! Turns a query predicate into a request URL, fetches the response from the
//! network or replays it from the response cache, cleans up the body and maps
//! every item onto a [`Heifer`].

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::heifer::{Heifer, RecordError};
use crate::cache::{CacheLoadError, CacheSaveError, CacheSession, ConnectionMode, ExhaustionPattern};
use crate::query::build_key;

/// Base URL for the Heifer data service
pub const DEFAULT_BASE_URL: &str = "http://think.cs.vt.edu:5000/heifer1";

/// User agent sent with every request
pub const USER_AGENT: &str = "RealTimeWeb Heifer library for educational purposes";

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors raised by the network transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connection, timeout, body decoding)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("Request to {url} failed with status {status}; make sure you entered a valid query")]
    Status { url: String, status: u16 },
}

/// Errors that can occur when querying heifer records
#[derive(Debug, Error)]
pub enum HeiferError {
    /// The caller supplied an unusable predicate
    #[error("Please enter a valid query")]
    InvalidQuery,

    /// Fetching the response failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The persisted response cache could not be loaded
    #[error(transparent)]
    CacheLoad(#[from] CacheLoadError),

    /// The fetch or replay produced an empty body
    #[error("There were no results")]
    EmptyResult,

    /// The response body is not the expected JSON document
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A record lacks one of the required keys
    #[error("The given information was incomplete: missing '{field}'")]
    IncompleteRecord { field: String },

    /// A record carries a value that cannot be converted
    #[error("Invalid value for '{field}': {reason}")]
    InvalidField { field: String, reason: String },
}

impl From<RecordError> for HeiferError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::MissingField(field) => HeiferError::IncompleteRecord { field },
            RecordError::InvalidField { field, reason } => HeiferError::InvalidField { field, reason },
        }
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service endpoint; query parameters are appended to it
    pub base_url: String,
    /// Value of the `User-Agent` header
    pub user_agent: String,
    /// Whole-request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Fetches the raw body for a URL
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, TransportError>;
}

/// `Transport` backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds a reqwest client with the configured user agent and timeout
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

/// Strips `// ` comment markers and collapses whitespace runs to single spaces
pub fn normalize(raw: &str) -> String {
    raw.replace("// ", "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Client for querying heifer records
///
/// Owns its [`CacheSession`], so switching between live and replay mode or
/// toggling recording only affects this client.
#[derive(Debug)]
pub struct HeiferClient<T: Transport = HttpTransport> {
    config: ClientConfig,
    transport: T,
    session: CacheSession,
}

impl HeiferClient<HttpTransport> {
    /// Creates a live client with the default configuration
    pub fn new() -> Result<Self, HeiferError> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a live client with a custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self, HeiferError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> HeiferClient<T> {
    /// Creates a live client over any transport
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            session: CacheSession::new(),
        }
    }

    /// Returns records matching `query`, e.g. `"Index==4999"`.
    ///
    /// Fails on the first record that cannot be built; no partial list is returned.
    pub async fn get_heifer_information(&mut self, query: &str) -> Result<Vec<Heifer>, HeiferError> {
        if query.trim().is_empty() {
            return Err(HeiferError::InvalidQuery);
        }

        let response = self.fetch_heifer_info([("where", query)]).await?;
        let items = response
            .get("_items")
            .and_then(Value::as_array)
            .ok_or_else(|| HeiferError::MalformedResponse("missing '_items' list".to_string()))?;

        let heifers = items
            .iter()
            .map(|item| {
                let object = item.as_object().ok_or_else(|| {
                    HeiferError::MalformedResponse(format!("expected an object, found {}", item))
                })?;
                Heifer::from_json(object).map_err(HeiferError::from)
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(query, count = heifers.len(), "parsed heifer records");
        Ok(heifers)
    }

    /// Fetches (or replays) the response for `params` and parses it as JSON
    async fn fetch_heifer_info<'a, I>(&mut self, params: I) -> Result<Value, HeiferError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let key = build_key(&self.config.base_url, params);

        let raw = match self.session.mode() {
            ConnectionMode::Live => {
                tracing::debug!(url = %key, "fetching");
                let raw = self.transport.fetch(&key).await?;
                if self.session.should_record() && !raw.is_empty() {
                    self.session.record(&key, raw.as_str());
                }
                raw
            }
            ConnectionMode::Replay => self.session.lookup_next(&key),
        };

        if raw.is_empty() {
            return Err(HeiferError::EmptyResult);
        }

        serde_json::from_str(&normalize(&raw))
            .map_err(|e| HeiferError::MalformedResponse(e.to_string()))
    }

    /// The cache key (request URL) used for `query`
    pub fn query_key(&self, query: &str) -> String {
        build_key(&self.config.base_url, [("where", query)])
    }

    /// Performs network requests for every following query
    pub fn go_live(&mut self) {
        self.session.go_live();
    }

    /// Loads the cache file at `path` and answers every following query from it
    pub fn go_replay(&mut self, path: impl AsRef<Path>) -> Result<(), HeiferError> {
        Ok(self.session.go_replay_from(path)?)
    }

    /// Loads the cache file at `path` without leaving the current mode.
    ///
    /// Used before recording so new responses are added to an existing file.
    pub fn load_cache(&mut self, path: impl AsRef<Path>) -> Result<(), HeiferError> {
        Ok(self.session.load_from(path)?)
    }

    /// Records every live response; entries created from now on use `pattern`
    pub fn begin_edit(&mut self, pattern: ExhaustionPattern) {
        self.session.begin_edit(pattern);
    }

    pub fn end_edit(&mut self) {
        self.session.end_edit();
    }

    /// Drops the recorded responses for `query`
    pub fn forget(&mut self, query: &str) {
        let key = self.query_key(query);
        self.session.forget(&key);
    }

    /// Writes the response cache to `path`
    pub fn save_cache(&self, path: impl AsRef<Path>) -> Result<(), CacheSaveError> {
        self.session.save_to(path)
    }

    pub fn mode(&self) -> ConnectionMode {
        self.session.mode()
    }

    pub fn session(&self) -> &CacheSession {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}
