#![forbid(unsafe_code)]

pub mod cache;
mod store;

pub use cache::{
    CACHE_KEY, CACHE_TTL_MS, CACHE_VERSION, CacheEntry, CacheInfo, CacheOptions, Clock,
    LayoutCache, MAX_ENTRY_BYTES, ManualClock, SystemClock,
};
pub use cache::fingerprint::{FingerprintInput, FingerprintMode, fingerprint};
pub use store::{KvStore, MemoryKvStore, SqliteKvStore, StoreError};
