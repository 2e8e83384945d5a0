//! Heifer data service access
//!
//! This module contains the record type returned by the service and the client
//! that queries it, either live over HTTP or from a recorded response cache.

pub mod client;
pub mod heifer;

pub use client::{
    normalize, ClientConfig, HeiferClient, HeiferError, HttpTransport, Transport, TransportError,
    DEFAULT_BASE_URL, USER_AGENT,
};
pub use heifer::{Heifer, RecordError, REQUIRED_FIELDS};
