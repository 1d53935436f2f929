//! In-memory TTL cache for listing responses.
//!
//! Expiry is checked lazily on read; nothing sweeps the map in the background.
//! The store is unbounded in entry count: [`MAX_CACHE_SIZE`] is advisory only.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::UtcDateTime;

/// Default time-to-live for listing pages.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Time-to-live for search-driven listing pages.
pub const SEARCH_TTL: Duration = Duration::from_secs(2 * 60);

/// Advisory capacity. Not enforced.
pub const MAX_CACHE_SIZE: usize = 100;

/// Defines the behavior of the cache for a single client call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Read a live entry if present; otherwise fetch and store. (Default)
    #[default]
    Use,
    /// Skip the read, fetch, and store the fresh response.
    Refresh,
    /// Neither read nor write the cache.
    Bypass,
}

/// Cumulative cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Entries currently held, including ones that expired but were not read since.
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Storage metadata of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntryInfo {
    pub stored_at: UtcDateTime,
    pub ttl: Duration,
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: UtcDateTime,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: UtcDateTime) -> bool {
        now.duration_since(self.stored_at) > self.ttl
    }
}

#[derive(Debug)]
struct CacheInner<V> {
    map: HashMap<String, CacheEntry<V>>,
    default_ttl: Duration,
    hits: u64,
    misses: u64,
}

impl<V: Clone> CacheInner<V> {
    fn new(default_ttl: Duration) -> Self {
        Self {
            map: HashMap::new(),
            default_ttl,
            hits: 0,
            misses: 0,
        }
    }

    fn get(&mut self, key: &str, now: UtcDateTime) -> Option<V> {
        let Some(entry) = self.map.get(key) else {
            self.misses += 1;
            tracing::debug!(key, "cache miss");
            return None;
        };

        if entry.is_expired(now) {
            self.map.remove(key);
            self.misses += 1;
            tracing::debug!(key, "cache entry expired");
            return None;
        }

        self.hits += 1;
        tracing::debug!(key, "cache hit");
        Some(entry.value.clone())
    }

    fn set(&mut self, key: String, value: V, ttl: Duration, now: UtcDateTime) {
        tracing::debug!(key = %key, ttl_ms = ttl.as_millis() as u64, "cache set");
        self.map.insert(
            key,
            CacheEntry {
                value,
                stored_at: now,
                ttl,
            },
        );
    }

    fn clear(&mut self, key_contains: Option<&str>) {
        match key_contains {
            Some(pattern) => self.map.retain(|key, _| !key.contains(pattern)),
            None => self.map.clear(),
        }
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.map.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

/// Shared TTL cache keyed by string.
///
/// Clones share the same underlying map and counters.
#[derive(Debug, Clone)]
pub struct CacheStore<V> {
    inner: Arc<Mutex<CacheInner<V>>>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> CacheStore<V> {
    /// Create a cache store with a default TTL, driven by the system clock.
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner::new(default_ttl))),
            clock,
        }
    }

    /// Create a cache store with the five minute default TTL.
    pub fn with_default_ttl() -> Self {
        Self::new(DEFAULT_TTL)
    }

    /// Create a disabled cache: writes are dropped, every read misses.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Get a live value for `key`.
    ///
    /// An expired entry is evicted and counted as a miss.
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut store = self.inner.lock().await;
        store.get(key, now)
    }

    /// Store `value` under `key`, replacing any existing entry.
    ///
    /// `ttl_override` falls back to the store's default TTL.
    pub async fn set(&self, key: impl Into<String>, value: V, ttl_override: Option<Duration>) {
        let now = self.clock.now();
        let mut store = self.inner.lock().await;

        if store.default_ttl == Duration::ZERO {
            return;
        }

        let ttl = ttl_override.unwrap_or(store.default_ttl);
        store.set(key.into(), value, ttl, now);
    }

    /// Evict every entry whose key contains `key_contains`, or everything when `None`.
    pub async fn clear(&self, key_contains: Option<&str>) {
        let mut store = self.inner.lock().await;
        store.clear(key_contains);
    }

    pub async fn stats(&self) -> CacheStats {
        let store = self.inner.lock().await;
        store.stats()
    }

    /// True if the entry is absent or expired. Does not evict.
    pub async fn is_stale(&self, key: &str) -> bool {
        let now = self.clock.now();
        let store = self.inner.lock().await;
        store
            .map
            .get(key)
            .map_or(true, |entry| entry.is_expired(now))
    }

    pub async fn last_updated(&self, key: &str) -> Option<UtcDateTime> {
        let store = self.inner.lock().await;
        store.map.get(key).map(|entry| entry.stored_at)
    }

    pub async fn entry_info(&self, key: &str) -> Option<CacheEntryInfo> {
        let store = self.inner.lock().await;
        store.map.get(key).map(|entry| CacheEntryInfo {
            stored_at: entry.stored_at,
            ttl: entry.ttl,
        })
    }

    /// Number of entries held, including expired ones not yet read.
    pub async fn len(&self) -> usize {
        let store = self.inner.lock().await;
        store.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn is_disabled(&self) -> bool {
        let store = self.inner.lock().await;
        store.default_ttl == Duration::ZERO
    }
}
