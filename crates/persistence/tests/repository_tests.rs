//! Facade behavior independent of any one adapter: backend selection,
//! cache-aside coherence and opening from configuration.

#![cfg(feature = "sqlite")]

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use larder_persistence::cache::{list_key, CacheAside, CacheBackend, MemoryCache};
use larder_persistence::config::StorageConfig;
use larder_persistence::core::{BackendKind, BackendSelector, TypeStore};
use larder_persistence::error::{BackendError, CacheError, CacheResult, StorageError};
use larder_persistence::repository::Repositories;
use larder_persistence::types::{Item, NewLocation};

use common::*;

/// A cache whose every operation fails.
#[derive(Debug)]
struct BrokenCache;

#[async_trait]
impl CacheBackend for BrokenCache {
    fn name(&self) -> &'static str {
        "broken"
    }

    async fn get(&self, _key: &str) -> CacheResult<Option<Value>> {
        Err(CacheError::Unavailable {
            message: "connection refused".to_string(),
        })
    }

    async fn set(&self, _key: &str, _value: Value, _ttl: Duration) -> CacheResult<()> {
        Err(CacheError::Unavailable {
            message: "connection refused".to_string(),
        })
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Err(CacheError::Unavailable {
            message: "connection refused".to_string(),
        })
    }
}

fn is_not_configured(err: &StorageError) -> bool {
    matches!(err, StorageError::Backend(BackendError::NotConfigured { .. }))
}

// ============================================================================
// Backend Selection
// ============================================================================

#[tokio::test]
async fn test_selection_is_resolved_per_call() {
    let (selector, switch) = BackendSelector::switchable(BackendKind::Relational);
    let repos = Repositories::builder()
        .backend(sqlite_backend())
        .selector(selector)
        .build();

    repos.items().insert(&notebook()).await.unwrap();
    assert_eq!(repos.active_kind(), BackendKind::Relational);

    switch.set(BackendKind::Document);
    assert_eq!(repos.active_kind(), BackendKind::Document);
    let err = repos.items().find_by_key("A1").await.unwrap_err();
    assert!(is_not_configured(&err));

    switch.set(BackendKind::Relational);
    assert!(repos.items().find_by_key("A1").await.unwrap().is_some());
}

#[tokio::test]
async fn test_facade_sets_do_not_share_records() {
    let relational = sqlite_backend();
    let repos = repositories(relational.clone());
    let other = sqlite_repositories();

    repos.types().insert("Tools").await.unwrap();
    assert_eq!(repos.types().list_all().await.unwrap().len(), 1);
    assert!(other.types().list_all().await.unwrap().is_empty());
    assert_eq!(relational.list_types().await.unwrap().len(), 1);

    assert!(repos.backends().contains(BackendKind::Relational));
    assert!(!repos.backends().contains(BackendKind::Document));
}

#[tokio::test]
async fn test_unconfigured_backend_fails_every_facade() {
    let repos = Repositories::builder()
        .selector(BackendSelector::fixed(BackendKind::Document))
        .build();

    assert!(is_not_configured(&repos.items().count(&Default::default()).await.unwrap_err()));
    assert!(is_not_configured(&repos.types().list_all().await.unwrap_err()));
    assert!(is_not_configured(&repos.locations().list_all().await.unwrap_err()));
    assert!(is_not_configured(&repos.users().list_all().await.unwrap_err()));
    assert!(is_not_configured(&repos.backup().await.unwrap_err()));
}

// ============================================================================
// Cache-Aside
// ============================================================================

#[tokio::test]
async fn test_list_cache_key_is_per_backend() {
    let cache = CacheAside::in_memory();
    let repos = Repositories::builder()
        .backend(sqlite_backend())
        .selector(BackendSelector::fixed(BackendKind::Relational))
        .cache(cache.clone())
        .build();

    repos.types().insert("Tools").await.unwrap();
    repos.types().list_all().await.unwrap();

    let key = list_key("types", BackendKind::Relational);
    assert_eq!(key, "types_list_relational");
    assert!(cache.backend().get(&key).await.unwrap().is_some());
    assert!(
        cache
            .backend()
            .get(&list_key("types", BackendKind::Document))
            .await
            .unwrap()
            .is_none()
    );

    repos.types().delete("Tools").await.unwrap();
    assert!(cache.backend().get(&key).await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_out_of_band_writes_show_after_ttl() {
    let backend = sqlite_backend();
    let repos = repositories(backend.clone());

    assert!(repos.types().list_all().await.unwrap().is_empty());

    // Bypasses the facade, so nothing evicts the cached list.
    backend.insert_type("Tools").await.unwrap();
    assert!(repos.types().list_all().await.unwrap().is_empty());

    tokio::time::advance(Duration::from_secs(301)).await;
    let names: Vec<String> = repos
        .types()
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, vec!["Tools"]);
}

#[tokio::test]
async fn test_writes_through_facade_are_visible_immediately() {
    let repos = sqlite_repositories();

    let id = repos
        .locations()
        .insert(&NewLocation::new("1F", "Hall", "Closet"))
        .await
        .unwrap();
    assert_eq!(repos.locations().list_all().await.unwrap()[0].order, 0);

    assert!(repos.locations().reorder(&id, 7).await.unwrap());
    assert_eq!(repos.locations().list_all().await.unwrap()[0].order, 7);

    assert!(repos.locations().delete(&id).await.unwrap());
    assert!(repos.locations().list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_loaded_before_eviction_is_not_cached() {
    let cache = CacheAside::in_memory();
    let key = list_key("types", BackendKind::Relational);

    // The eviction lands while the store is being read, as a concurrent
    // write through another facade would.
    let first: Vec<String> = cache
        .get_or_load(&key, || async {
            let snapshot = vec!["old".to_string()];
            cache.evict(&key).await;
            Ok(snapshot)
        })
        .await
        .unwrap();
    assert_eq!(first, vec!["old"]);

    let next: Vec<String> = cache
        .get_or_load(&key, || async { Ok(vec!["old".to_string(), "new".to_string()]) })
        .await
        .unwrap();
    assert_eq!(next, vec!["old", "new"]);
}

#[tokio::test]
async fn test_broken_cache_degrades_to_store() {
    let repos = Repositories::builder()
        .backend(sqlite_backend())
        .selector(BackendSelector::fixed(BackendKind::Relational))
        .cache(CacheAside::new(Arc::new(BrokenCache), Duration::from_secs(300)))
        .build();

    repos.types().insert("Tools").await.unwrap();
    repos.types().insert("Food").await.unwrap();
    assert_eq!(repos.types().list_all().await.unwrap().len(), 2);
    assert!(repos.types().find_by_name("Food").await.unwrap().is_some());

    repos
        .locations()
        .insert(&NewLocation::new("1F", "Hall", "Closet"))
        .await
        .unwrap();
    assert_eq!(repos.locations().list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_shared_cache_across_facade_sets() {
    let cache = CacheAside::new(Arc::new(MemoryCache::new()), Duration::from_secs(300));
    let backend = sqlite_backend();
    let first = Repositories::builder()
        .backend(backend.clone())
        .selector(BackendSelector::fixed(BackendKind::Relational))
        .cache(cache.clone())
        .build();
    let second = Repositories::builder()
        .backend(backend)
        .selector(BackendSelector::fixed(BackendKind::Relational))
        .cache(cache)
        .build();

    assert!(second.types().list_all().await.unwrap().is_empty());
    first.types().insert("Tools").await.unwrap();
    assert_eq!(second.types().list_all().await.unwrap().len(), 1);
}

// ============================================================================
// Opening From Configuration
// ============================================================================

/// Opens `config` with a fixed selector, so a `DB_TYPE` set in the test
/// environment cannot redirect the facades.
async fn open_pinned(config: &StorageConfig) -> Result<Repositories, StorageError> {
    Repositories::open_with_selector(config, BackendSelector::fixed(config.initial_backend())).await
}

fn memory_config() -> StorageConfig {
    StorageConfig {
        db_type: "relational".to_string(),
        database_url: ":memory:".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_open_relational_from_config() {
    let repos = open_pinned(&memory_config()).await.unwrap();

    assert!(repos.backends().contains(BackendKind::Relational));
    repos.health_check().await.unwrap();

    repos.items().insert(&Item::new("A1", "Notebook")).await.unwrap();
    assert_eq!(repos.items().count(&Default::default()).await.unwrap(), 1);

    repos.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_open_sqlite_url_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig {
        database_url: format!("sqlite://{}", dir.path().join("larder.db").display()),
        ..memory_config()
    };

    let repos = open_pinned(&config).await.unwrap();
    repos.types().insert("Tools").await.unwrap();
    repos.shutdown().await.unwrap();

    let reopened = open_pinned(&config).await.unwrap();
    assert_eq!(reopened.types().list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_open_rejects_unknown_cache_scheme() {
    let config = StorageConfig {
        cache_url: "memcached://localhost:11211".to_string(),
        ..memory_config()
    };

    let err = open_pinned(&config).await.unwrap_err();
    assert!(matches!(
        err,
        StorageError::Cache(CacheError::UnsupportedUrl { .. })
    ));
}

#[cfg(not(feature = "mongodb"))]
#[tokio::test]
async fn test_open_document_without_feature() {
    let config = StorageConfig {
        db_type: "document".to_string(),
        ..Default::default()
    };

    let err = open_pinned(&config).await.unwrap_err();
    assert!(is_not_configured(&err));
}

#[test]
fn test_config_validation() {
    assert!(memory_config().validate().is_ok());

    let config = StorageConfig {
        db_type: "graph".to_string(),
        ..memory_config()
    };
    assert!(config.validate().is_err());
}
