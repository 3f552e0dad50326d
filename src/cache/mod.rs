//! Versioned documentation cache
//!
//! Entries are keyed by a fingerprint of `(import path, version, symbol)` and
//! carry the provenance needed to decide whether they are still fresh.

pub mod key;
pub mod store;
pub mod types;

pub use key::{cache_key, expected_version, uniq_keys};
pub use store::{CacheConfig, DEFAULT_CAPACITY, DEFAULT_TTL, DocCache};
pub use types::{CacheEntry, CacheMetadata, CachePayload};
