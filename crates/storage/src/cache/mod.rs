#![forbid(unsafe_code)]

//! Best-effort layout cache over a [`KvStore`].
//!
//! One entry, stored under [`CACHE_KEY`], holds the positions computed for
//! the input whose fingerprint it records. An entry is served only when its
//! format version matches, it is younger than the TTL, and the fingerprint
//! of the current input matches; otherwise it is removed. Store failures of
//! any kind read as a miss and are only logged.

mod clock;
pub mod fingerprint;

pub use clock::{Clock, ManualClock, SystemClock};

use crate::store::KvStore;
use fingerprint::{FingerprintInput, FingerprintMode};
use serde::{Deserialize, Serialize};
use tl_core::model::{GraphDataset, LayoutPositions};
use tracing::{debug, info, warn};

pub const CACHE_KEY: &str = "graph-layout-cache";
pub const CACHE_VERSION: &str = "1.0";
pub const CACHE_TTL_MS: i64 = 24 * 60 * 60 * 1000;
pub const MAX_ENTRY_BYTES: usize = 5 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub version: String,
    pub timestamp: i64,
    pub data_hash: String,
    pub layout: LayoutPositions,
}

/// Envelope read before the layout body, so a stale format is recognised
/// even when its layout no longer parses.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEnvelope {
    version: String,
    timestamp: i64,
    data_hash: String,
    layout: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheOptions {
    pub key: String,
    pub ttl_ms: i64,
    pub max_entry_bytes: usize,
    pub fingerprint_mode: FingerprintMode,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            key: CACHE_KEY.to_string(),
            ttl_ms: CACHE_TTL_MS,
            max_entry_bytes: MAX_ENTRY_BYTES,
            fingerprint_mode: FingerprintMode::Summary,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheInfo {
    pub exists: bool,
    pub size_bytes: Option<usize>,
    pub age_ms: Option<i64>,
}

#[derive(Debug)]
enum Invalid {
    Version(String),
    Expired { age_ms: i64 },
    HashMismatch,
    Corrupt(serde_json::Error),
}

impl std::fmt::Display for Invalid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Version(stored) => write!(f, "version mismatch (stored={stored})"),
            Self::Expired { age_ms } => write!(f, "expired (age_ms={age_ms})"),
            Self::HashMismatch => write!(f, "input changed"),
            Self::Corrupt(err) => write!(f, "unreadable entry: {err}"),
        }
    }
}

#[derive(Debug)]
pub struct LayoutCache<S, C = SystemClock> {
    store: S,
    clock: C,
    options: CacheOptions,
}

impl<S: KvStore> LayoutCache<S, SystemClock> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock, CacheOptions::default())
    }
}

impl<S: KvStore, C: Clock> LayoutCache<S, C> {
    pub fn with_clock(store: S, clock: C, options: CacheOptions) -> Self {
        Self {
            store,
            clock,
            options,
        }
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn fingerprint(&self, input: FingerprintInput<'_>) -> String {
        fingerprint::fingerprint(input, self.options.fingerprint_mode)
    }

    /// Previously computed positions for `input`, or `None` on any miss.
    /// An invalid entry is cleared as a side effect.
    pub fn load(&mut self, input: FingerprintInput<'_>) -> Option<LayoutPositions> {
        let raw = match self.store.get(&self.options.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("layout cache empty");
                return None;
            }
            Err(err) => {
                warn!(error = %err, code = err.code(), "failed to read layout cache");
                self.clear();
                return None;
            }
        };

        match self.validate(&raw, input) {
            Ok(layout) => {
                info!(positions = layout.len(), "loaded layout from cache");
                Some(layout)
            }
            Err(reason) => {
                info!(%reason, "layout cache invalid; clearing");
                self.clear();
                None
            }
        }
    }

    pub fn load_dataset(&mut self, dataset: &GraphDataset) -> Option<LayoutPositions> {
        self.load(FingerprintInput::from_dataset(dataset))
    }

    /// Stores `layout` for `input`. Oversized entries and store failures are
    /// skipped with a warning.
    pub fn save(&mut self, input: FingerprintInput<'_>, layout: &LayoutPositions) {
        let entry = CacheEntry {
            version: CACHE_VERSION.to_string(),
            timestamp: self.clock.now_ms(),
            data_hash: self.fingerprint(input),
            layout: layout.clone(),
        };
        let serialized = match serde_json::to_string(&entry) {
            Ok(serialized) => serialized,
            Err(err) => {
                warn!(error = %err, "failed to serialize layout cache entry");
                return;
            }
        };
        if serialized.len() > self.options.max_entry_bytes {
            warn!(
                size = serialized.len(),
                limit = self.options.max_entry_bytes,
                "layout too large to cache; skipping"
            );
            return;
        }
        match self.store.set(&self.options.key, &serialized) {
            Ok(()) => debug!(size = serialized.len(), "layout cached"),
            Err(err) => warn!(error = %err, code = err.code(), "failed to cache layout"),
        }
    }

    pub fn save_dataset(&mut self, dataset: &GraphDataset, layout: &LayoutPositions) {
        self.save(FingerprintInput::from_dataset(dataset), layout);
    }

    pub fn clear(&mut self) {
        if let Err(err) = self.store.delete(&self.options.key) {
            warn!(error = %err, code = err.code(), "failed to clear layout cache");
        }
    }

    pub fn info(&self) -> CacheInfo {
        let raw = match self.store.get(&self.options.key) {
            Ok(Some(raw)) => raw,
            Ok(None) | Err(_) => return CacheInfo::default(),
        };
        match serde_json::from_str::<StoredEnvelope>(&raw) {
            Ok(envelope) => CacheInfo {
                exists: true,
                size_bytes: Some(raw.len()),
                age_ms: Some(self.clock.now_ms() - envelope.timestamp),
            },
            Err(_) => CacheInfo::default(),
        }
    }

    fn validate(&self, raw: &str, input: FingerprintInput<'_>) -> Result<LayoutPositions, Invalid> {
        let envelope: StoredEnvelope = serde_json::from_str(raw).map_err(Invalid::Corrupt)?;
        if envelope.version != CACHE_VERSION {
            return Err(Invalid::Version(envelope.version));
        }
        let age_ms = self.clock.now_ms() - envelope.timestamp;
        if age_ms > self.options.ttl_ms {
            return Err(Invalid::Expired { age_ms });
        }
        if envelope.data_hash != self.fingerprint(input) {
            return Err(Invalid::HashMismatch);
        }
        serde_json::from_value(envelope.layout).map_err(Invalid::Corrupt)
    }
}
