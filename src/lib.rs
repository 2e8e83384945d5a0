//! Heifer data service client library
//!
//! Queries the Heifer livestock data service and parses the results into
//! [`Heifer`] records. Responses can be recorded to a cache file and replayed
//! later without a network connection.

pub mod cache;
pub mod cli;
pub mod data;
pub mod query;

pub use cache::{CacheManager, CacheSession, ConnectionMode, ExhaustionPattern, ResponseCache};
pub use data::{ClientConfig, Heifer, HeiferClient, HeiferError};
pub use query::build_key;
