//! TTL-keyed cache for search, provider, and rewrite results.
//!
//! [`CacheStore`] wraps a raw key/value [`CacheBackend`] with a JSON
//! envelope carrying `created_at`/`ttl`, and evicts lazily: an expired
//! entry is deleted on the read that discovers it. There is no
//! background sweeper. All writes are best-effort — backend failures
//! are logged and swallowed so a search never fails on cache trouble.
//!
//! Key namespaces separate the three cached shapes, each with its own
//! TTL tier (see `SearchConfig`): combined responses change with the
//! ranking logic (1 h), raw provider results change rarely (24 h), and
//! AI rewrites are query-intrinsic (7 d).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::Result;

/// Key prefix for cached combined search responses.
pub const SEARCH_PREFIX: &str = "search:";
/// Key prefix for cached raw provider results.
pub const PROVIDER_PREFIX: &str = "provider:";
/// Key prefix for cached AI rewrites.
pub const REWRITE_PREFIX: &str = "rewrite:";

/// Time source, injectable so tests can simulate TTL expiry.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Manually advanced clock for deterministic TTL tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(start_ms),
        }
    }

    pub fn advance(&self, delta: Duration) {
        self.now_ms
            .fetch_add(delta.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Raw async key/value storage behind the cache.
///
/// Implementations may be durable or in-memory; the store only needs
/// string get/set/remove plus prefix listing. All operations are
/// best-effort from the caller's perspective.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: String) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
    /// All stored keys starting with `prefix`.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>>;
}

/// In-memory backend used in tests and as the default store.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .entries
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// TTL envelope stored around every cached value.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    data: T,
    created_at_ms: u64,
    ttl_ms: u64,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at_ms) > self.ttl_ms
    }
}

/// Typed TTL cache over a raw [`CacheBackend`].
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn CacheBackend>, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    /// In-memory store on the system clock.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()), Arc::new(SystemClock))
    }

    /// Read a cached value.
    ///
    /// Returns `None` when the key is absent, the stored entry fails to
    /// parse, or the entry has expired. Expired entries are removed on
    /// this read.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(key, error = %err, "cache read failed");
                return None;
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(key, error = %err, "cache entry failed to parse");
                return None;
            }
        };

        if entry.is_expired(self.clock.now_ms()) {
            if let Err(err) = self.backend.remove(key).await {
                tracing::debug!(key, error = %err, "failed to remove expired entry");
            }
            return None;
        }

        Some(entry.data)
    }

    /// Write a value under `key` with the given TTL, overwriting any
    /// existing entry. Failures are logged and swallowed.
    pub async fn set<T: Serialize>(&self, key: &str, data: &T, ttl: Duration) {
        let entry = CacheEntry {
            data,
            created_at_ms: self.clock.now_ms(),
            ttl_ms: ttl.as_millis() as u64,
        };
        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(key, error = %err, "cache entry failed to serialize");
                return;
            }
        };
        if let Err(err) = self.backend.set(key, raw).await {
            tracing::warn!(key, error = %err, "cache write failed");
        }
    }

    /// Delete a single key, best-effort.
    pub async fn remove(&self, key: &str) {
        if let Err(err) = self.backend.remove(key).await {
            tracing::debug!(key, error = %err, "cache remove failed");
        }
    }

    /// Delete every key in a namespace, best-effort.
    pub async fn clear_namespace(&self, prefix: &str) {
        let keys = match self.backend.keys(prefix).await {
            Ok(keys) => keys,
            Err(err) => {
                tracing::warn!(prefix, error = %err, "cache key listing failed");
                return;
            }
        };
        futures::future::join_all(keys.iter().map(|key| self.remove(key))).await;
    }

    /// Raw existence check, bypassing the TTL envelope. Used by tests
    /// to observe lazy eviction.
    pub async fn contains_raw(&self, key: &str) -> bool {
        matches!(self.backend.get(key).await, Ok(Some(_)))
    }
}

#[cfg(test)]
use crate::error::SearchError;

/// A backend that always fails, for exercising the degradation paths.
#[cfg(test)]
pub(crate) struct FailingBackend;

#[cfg(test)]
#[async_trait]
impl CacheBackend for FailingBackend {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(SearchError::Cache("backend down".into()))
    }

    async fn set(&self, _key: &str, _value: String) -> Result<()> {
        Err(SearchError::Cache("backend down".into()))
    }

    async fn remove(&self, _key: &str) -> Result<()> {
        Err(SearchError::Cache("backend down".into()))
    }

    async fn keys(&self, _prefix: &str) -> Result<Vec<String>> {
        Err(SearchError::Cache("backend down".into()))
    }
}
