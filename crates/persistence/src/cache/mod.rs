//! Cache-aside layer for reference lists.
//!
//! Type and location listings are read far more often than they change, so
//! their facades keep a copy in a [`CacheBackend`] for a fixed time-to-live.
//! Every write through a facade evicts the affected key before returning.
//!
//! # Available Backends
//!
//! | Backend | URL | Feature |
//! |---------|-----|---------|
//! | [`MemoryCache`] | `memory://` | always |
//! | `RedisCache` | `redis://host:port/db` | `redis` |
//!
//! # Keys
//!
//! One key per aggregate and backend, e.g. `types_list_document` or
//! `locations_list_relational`. Switching backends never serves the other
//! store's list.
//!
//! # Failure Handling
//!
//! # Coherence
//!
//! Each key carries a generation that [`CacheAside::evict`] bumps. A fill
//! records the generation before loading and is dropped if an eviction ran
//! while the store was being read, so a list loaded before a write is never
//! stored after that write's eviction. Fills and evictions of one handle are
//! serialized; loads are not.
//!
//! A cache that errors is treated as a miss: reads go to the store, fills and
//! evictions are skipped, and each failure is logged with `tracing::warn!`.

mod memory;
#[cfg(feature = "redis")]
mod redis_cache;

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::core::BackendKind;
use crate::error::{CacheError, CacheResult, StorageResult};

pub use memory::MemoryCache;
#[cfg(feature = "redis")]
pub use redis_cache::RedisCache;

/// Default time-to-live for cached lists.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// A key-value cache holding JSON values.
#[async_trait]
pub trait CacheBackend: Send + Sync + Debug {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Returns the live value under `key`, if any.
    async fn get(&self, key: &str) -> CacheResult<Option<Value>>;

    /// Stores `value` under `key` for `ttl`.
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> CacheResult<()>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> CacheResult<()>;
}

/// Shared cache handle.
pub type DynCache = Arc<dyn CacheBackend>;

/// Opens the cache named by `url`.
pub async fn open(url: &str) -> CacheResult<DynCache> {
    let scheme = url.split_once("://").map(|(scheme, _)| scheme).unwrap_or(url);
    match scheme {
        "" | "memory" | "simple" => Ok(Arc::new(MemoryCache::new())),
        #[cfg(feature = "redis")]
        "redis" | "rediss" => Ok(Arc::new(RedisCache::connect(url).await?)),
        _ => Err(CacheError::UnsupportedUrl {
            url: url.to_string(),
        }),
    }
}

/// Cache key of an aggregate's list for a backend.
pub fn list_key(aggregate: &str, kind: BackendKind) -> String {
    format!("{aggregate}_list_{kind}")
}

/// Read-through, evict-on-write access to a [`CacheBackend`].
///
/// Clones share the cache and the eviction generations.
#[derive(Debug, Clone)]
pub struct CacheAside {
    backend: DynCache,
    ttl: Duration,
    generations: Arc<Mutex<HashMap<String, u64>>>,
}

impl CacheAside {
    pub fn new(backend: DynCache, ttl: Duration) -> Self {
        Self {
            backend,
            ttl,
            generations: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// In-process cache with the default TTL.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCache::new()), DEFAULT_TTL)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn backend(&self) -> &DynCache {
        &self.backend
    }

    /// Returns the cached value under `key`, or loads, stores and returns it.
    ///
    /// Store errors from `load` propagate; cache errors never do. The loaded
    /// value is not stored if `key` was evicted while `load` ran.
    pub async fn get_or_load<T, F, Fut>(&self, key: &str, load: F) -> StorageResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = StorageResult<T>>,
    {
        match self.backend.get(key).await {
            Ok(Some(cached)) => match serde_json::from_value(cached) {
                Ok(value) => {
                    debug!(key, "cache hit");
                    return Ok(value);
                }
                Err(e) => warn!(key, error = %e, "discarding undecodable cache entry"),
            },
            Ok(None) => debug!(key, "cache miss"),
            Err(e) => warn!(
                key,
                cache = self.backend.name(),
                error = %e,
                "cache read failed, reading from store"
            ),
        }

        let generation = self.generation(key).await;
        let value = load().await?;

        let json = match serde_json::to_value(&value) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, error = %e, "cache fill skipped");
                return Ok(value);
            }
        };

        let generations = self.generations.lock().await;
        if generations.get(key).copied().unwrap_or_default() != generation {
            debug!(key, "evicted during load, not caching");
            return Ok(value);
        }
        if let Err(e) = self.backend.set(key, json, self.ttl).await {
            warn!(key, cache = self.backend.name(), error = %e, "cache fill failed");
        }
        drop(generations);

        Ok(value)
    }

    /// Removes `key`, logging instead of failing.
    ///
    /// Fills whose load started before this call are discarded.
    pub async fn evict(&self, key: &str) {
        let mut generations = self.generations.lock().await;
        *generations.entry(key.to_string()).or_default() += 1;
        if let Err(e) = self.backend.delete(key).await {
            warn!(key, cache = self.backend.name(), error = %e, "cache eviction failed");
        }
    }

    async fn generation(&self, key: &str) -> u64 {
        self.generations
            .lock()
            .await
            .get(key)
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_list_key() {
        assert_eq!(list_key("types", BackendKind::Document), "types_list_document");
        assert_eq!(
            list_key("locations", BackendKind::Relational),
            "locations_list_relational"
        );
    }

    #[tokio::test]
    async fn test_open_schemes() {
        assert_eq!(open("memory://").await.unwrap().name(), "memory");
        assert!(matches!(
            open("memcached://localhost").await,
            Err(CacheError::UnsupportedUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_get_or_load_loads_once() {
        let cache = CacheAside::in_memory();
        let loads = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Vec<String> = cache
                .get_or_load("k", || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(vec!["a".to_string()])
                })
                .await
                .unwrap();
            assert_eq!(value, vec!["a".to_string()]);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        cache.evict("k").await;
        let _: Vec<String> = cache
            .get_or_load("k", || async {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(vec![])
            })
            .await
            .unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fill_dropped_when_evicted_during_load() {
        let cache = CacheAside::in_memory();

        let stale: Vec<String> = cache
            .get_or_load("k", || async {
                cache.evict("k").await;
                Ok(vec!["old".to_string()])
            })
            .await
            .unwrap();
        assert_eq!(stale, vec!["old".to_string()]);
        assert!(cache.backend().get("k").await.unwrap().is_none());

        // A fill with no eviction in between is stored as usual.
        let _: Vec<String> = cache
            .get_or_load("k", || async { Ok(vec!["new".to_string()]) })
            .await
            .unwrap();
        assert!(cache.backend().get("k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_load_error_is_not_cached() {
        let cache = CacheAside::in_memory();
        let result: StorageResult<Vec<String>> = cache
            .get_or_load("k", || async {
                Err(StorageError::Backend(crate::error::BackendError::QueryError {
                    message: "down".to_string(),
                }))
            })
            .await;
        assert!(result.is_err());
        assert!(cache.backend().get("k").await.unwrap().is_none());
    }
}
