//! Response cache for offline operation
//!
//! Live responses can be recorded per query key and saved to disk. In replay
//! mode the client answers queries from that recording instead of the network,
//! handing back the recorded responses for each key in the order they were seen.

mod manager;
mod replay;
mod session;

pub use manager::{CacheFile, CacheLoadError, CacheManager, CacheSaveError};
pub use replay::{CacheEntry, ExhaustionPattern, ResponseCache};
pub use session::{CacheSession, ConnectionMode};
