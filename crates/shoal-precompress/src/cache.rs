//! Compute-once cache of encoded static payloads
//!
//! Each cache key maps to a slot that is filled at most once. Concurrent
//! misses on the same key join the same slot and wait for the single
//! computation; misses on different keys proceed in parallel because the
//! map shard is only locked long enough to fetch or create the slot.

use crate::encoder::Encoder;
use crate::encoding::Encoding;
use crate::error::{PrecompressError, Result};
use crate::resource::Resource;
use bytes::Bytes;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Default upper bound on resource length admitted into the cache (2 MiB)
pub const DEFAULT_MAX_SIZE: u64 = 2 * 1024 * 1024;

type Slot = Arc<OnceCell<Bytes>>;

/// Point-in-time cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Populated entries
    pub entries: usize,
    /// Total bytes held by populated entries
    pub cached_bytes: u64,
    /// Requests answered from an existing payload
    pub hits: u64,
    /// Encoder runs that completed and were installed
    pub computations: u64,
    /// Encoder runs that failed and left the key empty
    pub failures: u64,
    /// Requests rejected for exceeding the size limit
    pub rejected: u64,
}

/// Process-lifetime cache of encoded payloads keyed by path and encoding
pub struct PayloadCache {
    limit: u64,
    slots: DashMap<String, Slot>,
    hits: AtomicU64,
    computations: AtomicU64,
    failures: AtomicU64,
    rejected: AtomicU64,
}

impl PayloadCache {
    /// Create a cache admitting resources up to `limit` bytes
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            slots: DashMap::new(),
            hits: AtomicU64::new(0),
            computations: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    /// Size limit in bytes
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Get the payload for `key`, encoding `resource` on first access
    ///
    /// Resources longer than the limit are rejected without touching the map.
    /// A failed read or encode leaves the key empty so a later call retries.
    pub fn get_or_compute(
        &self,
        resource: &dyn Resource,
        key: &str,
        encoding: Encoding,
    ) -> Result<Bytes> {
        let length = resource.len();
        if length > self.limit {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            warn!(
                key,
                length,
                limit = self.limit,
                "Static file is larger than the configured pre-compression limit"
            );
            return Err(PrecompressError::SizeExceeded {
                key: key.to_string(),
                length,
                limit: self.limit,
            });
        }

        let slot = self.slot(key);
        if let Some(payload) = slot.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(payload.clone());
        }

        let mut computed = false;
        let result = slot.get_or_try_init(|| {
            computed = true;
            self.compute(resource, key, encoding, length)
        });

        match result {
            Ok(payload) => {
                if !computed {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                }
                Ok(payload.clone())
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(key, %encoding, error = %e, "Failed to build payload, key left unpopulated");
                Err(e)
            }
        }
    }

    /// Fetch or create the slot for `key`, releasing the shard lock on return
    fn slot(&self, key: &str) -> Slot {
        if let Some(slot) = self.slots.get(key) {
            return Arc::clone(slot.value());
        }
        Arc::clone(self.slots.entry(key.to_string()).or_default().value())
    }

    fn compute(
        &self,
        resource: &dyn Resource,
        key: &str,
        encoding: Encoding,
        length: u64,
    ) -> Result<Bytes> {
        let to_error = |source| PrecompressError::Encoding {
            key: key.to_string(),
            encoding,
            source,
        };

        let mut input = resource.open().map_err(to_error)?;
        let payload = Encoder::encode(&mut input, encoding, length as usize).map_err(to_error)?;

        self.computations.fetch_add(1, Ordering::Relaxed);
        debug!(
            key,
            %encoding,
            original = length,
            encoded = payload.len(),
            "Cached static payload"
        );
        Ok(payload)
    }

    /// Whether a payload is installed for `key`
    pub fn contains(&self, key: &str) -> bool {
        self.slots
            .get(key)
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Number of populated entries
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.value().get().is_some())
            .count()
    }

    /// Whether no entry is populated
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot the cache counters
    pub fn stats(&self) -> CacheStats {
        let (entries, cached_bytes) = self
            .slots
            .iter()
            .filter_map(|slot| slot.value().get().map(|p| p.len() as u64))
            .fold((0, 0), |(n, total), len| (n + 1, total + len));

        CacheStats {
            entries,
            cached_bytes,
            hits: self.hits.load(Ordering::Relaxed),
            computations: self.computations.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

impl Default for PayloadCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE)
    }
}

impl fmt::Debug for PayloadCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadCache")
            .field("limit", &self.limit)
            .field("slots", &self.slots.len())
            .finish()
    }
}
