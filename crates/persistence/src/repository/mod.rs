//! Repository facades.
//!
//! Each facade exposes one aggregate's operations and dispatches every call
//! to the backend the [`BackendSelector`] names at that moment. Callers never
//! see which store served them.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "sqlite")]
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use larder_persistence::backends::sqlite::SqliteBackend;
//! use larder_persistence::core::{Backend, BackendKind, BackendSelector};
//! use larder_persistence::repository::Repositories;
//! use larder_persistence::types::Item;
//!
//! let sqlite = SqliteBackend::in_memory()?;
//! sqlite.initialize().await?;
//!
//! let repos = Repositories::builder()
//!     .backend(Arc::new(sqlite))
//!     .selector(BackendSelector::fixed(BackendKind::Relational))
//!     .build();
//!
//! repos.items().insert(&Item::new("A1", "Drill")).await?;
//! assert!(repos.items().find_by_key("A1").await?.is_some());
//! # Ok(())
//! # }
//! ```

mod items;
mod locations;
mod logs;
mod types;
mod users;

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::cache::{self, CacheAside, MemoryCache};
use crate::config::StorageConfig;
use crate::core::{Backend, BackendKind, BackendSelector, DynBackend};
use crate::error::{BackendError, CacheError, StorageError, StorageResult};
use crate::types::{Backup, RestoreMode, RestoreReport};

pub use items::ItemRepository;
pub use locations::LocationRepository;
pub use logs::LogRepository;
pub use types::TypeRepository;
pub use users::UserRepository;

/// The opened adapters, at most one per kind.
#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    document: Option<DynBackend>,
    relational: Option<DynBackend>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `backend` under its own kind, replacing any previous one.
    pub fn insert(&mut self, backend: DynBackend) {
        match backend.kind() {
            BackendKind::Document => self.document = Some(backend),
            BackendKind::Relational => self.relational = Some(backend),
        }
    }

    /// Returns the adapter for `kind`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotConfigured` if that kind was never opened.
    pub fn get(&self, kind: BackendKind) -> StorageResult<&DynBackend> {
        let slot = match kind {
            BackendKind::Document => &self.document,
            BackendKind::Relational => &self.relational,
        };
        slot.as_ref().ok_or_else(|| {
            StorageError::Backend(BackendError::NotConfigured {
                backend_name: kind.to_string(),
            })
        })
    }

    pub fn contains(&self, kind: BackendKind) -> bool {
        self.get(kind).is_ok()
    }

    /// Iterates over the registered adapters.
    pub fn iter(&self) -> impl Iterator<Item = &DynBackend> {
        self.document.iter().chain(self.relational.iter())
    }
}

/// State shared by every facade.
#[derive(Debug)]
pub(crate) struct Dispatch {
    backends: BackendRegistry,
    selector: BackendSelector,
    cache: CacheAside,
}

impl Dispatch {
    /// Resolves the active backend for this call.
    pub(crate) fn active(&self) -> StorageResult<(BackendKind, &DynBackend)> {
        let kind = self.selector.resolve();
        Ok((kind, self.backends.get(kind)?))
    }

    pub(crate) fn backend(&self) -> StorageResult<&DynBackend> {
        self.active().map(|(_, backend)| backend)
    }

    pub(crate) fn cache(&self) -> &CacheAside {
        &self.cache
    }
}

/// Builder for [`Repositories`].
#[derive(Debug, Default)]
pub struct RepositoriesBuilder {
    backends: BackendRegistry,
    selector: Option<BackendSelector>,
    cache: Option<CacheAside>,
}

impl RepositoriesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter under its kind.
    pub fn backend(mut self, backend: DynBackend) -> Self {
        self.backends.insert(backend);
        self
    }

    /// Sets the selector; defaults to reading `DB_TYPE`.
    pub fn selector(mut self, selector: BackendSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Sets the cache; defaults to an in-process cache with a 300s TTL.
    pub fn cache(mut self, cache: CacheAside) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> Repositories {
        let dispatch = Arc::new(Dispatch {
            backends: self.backends,
            selector: self.selector.unwrap_or_default(),
            cache: self.cache.unwrap_or_else(CacheAside::in_memory),
        });
        Repositories {
            items: ItemRepository::new(Arc::clone(&dispatch)),
            types: TypeRepository::new(Arc::clone(&dispatch)),
            locations: LocationRepository::new(Arc::clone(&dispatch)),
            users: UserRepository::new(Arc::clone(&dispatch)),
            logs: LogRepository::new(Arc::clone(&dispatch)),
            dispatch,
        }
    }
}

/// The facades over one set of opened backends.
#[derive(Debug, Clone)]
pub struct Repositories {
    dispatch: Arc<Dispatch>,
    items: ItemRepository,
    types: TypeRepository,
    locations: LocationRepository,
    users: UserRepository,
    logs: LogRepository,
}

impl Repositories {
    pub fn builder() -> RepositoriesBuilder {
        RepositoriesBuilder::new()
    }

    /// Opens the backends and cache named by `config`.
    ///
    /// Every opened backend is initialized (schema or indexes) before this
    /// returns. A cache that cannot be reached is replaced by an in-process
    /// cache with a warning; an unknown cache URL is an error.
    pub async fn open(config: &StorageConfig) -> StorageResult<Self> {
        Self::open_with_selector(config, config.selector()).await
    }

    /// Like [`open`](Self::open), with `selector` in place of the one that
    /// reads `DB_TYPE` on every call.
    pub async fn open_with_selector(
        config: &StorageConfig,
        selector: BackendSelector,
    ) -> StorageResult<Self> {
        let mut builder = Self::builder().selector(selector);

        for kind in config.backends_to_open() {
            let backend = open_backend(config, kind).await?;
            backend.initialize().await?;
            info!(backend = backend.name(), kind = %kind, "storage backend ready");
            builder = builder.backend(backend);
        }

        let cache_backend = match cache::open(&config.cache_url).await {
            Ok(backend) => backend,
            Err(e @ CacheError::UnsupportedUrl { .. }) => return Err(e.into()),
            Err(e) => {
                warn!(error = %e, "cache unavailable, using in-process cache");
                Arc::new(MemoryCache::new())
            }
        };
        builder = builder.cache(CacheAside::new(cache_backend, config.cache_ttl()));

        Ok(builder.build())
    }

    pub fn items(&self) -> &ItemRepository {
        &self.items
    }

    pub fn types(&self) -> &TypeRepository {
        &self.types
    }

    pub fn locations(&self) -> &LocationRepository {
        &self.locations
    }

    pub fn users(&self) -> &UserRepository {
        &self.users
    }

    pub fn logs(&self) -> &LogRepository {
        &self.logs
    }

    /// The backend the selector names right now.
    pub fn active_kind(&self) -> BackendKind {
        self.dispatch.selector.resolve()
    }

    pub fn backends(&self) -> &BackendRegistry {
        &self.dispatch.backends
    }

    /// Checks every opened backend, returning the first failure.
    pub async fn health_check(&self) -> StorageResult<()> {
        for backend in self.dispatch.backends.iter() {
            backend.health_check().await?;
        }
        Ok(())
    }

    /// Snapshots items, types and locations of the active backend.
    pub async fn backup(&self) -> StorageResult<Backup> {
        Ok(Backup {
            created_at: Utc::now(),
            items: self.items.get_all_for_backup().await?,
            types: self.types.get_all_for_backup().await?,
            locations: self.locations.get_all_for_backup().await?,
        })
    }

    /// Restores a snapshot into the active backend.
    ///
    /// Reference data goes first so restored items find their types and
    /// locations.
    pub async fn restore(&self, backup: &Backup, mode: RestoreMode) -> StorageResult<RestoreReport> {
        let report = RestoreReport {
            types: self.types.restore(&backup.types, mode).await?,
            locations: self.locations.restore(&backup.locations, mode).await?,
            items: self.items.restore(&backup.items, mode).await?,
        };
        info!(
            mode = %mode,
            items = report.items,
            types = report.types,
            locations = report.locations,
            "restore complete"
        );
        Ok(report)
    }

    /// Releases every backend's connections.
    pub async fn shutdown(&self) -> StorageResult<()> {
        let mut first_error = None;
        for backend in self.dispatch.backends.iter() {
            if let Err(e) = backend.shutdown().await {
                warn!(backend = backend.name(), error = %e, "backend shutdown failed");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

async fn open_backend(config: &StorageConfig, kind: BackendKind) -> StorageResult<DynBackend> {
    match kind {
        BackendKind::Relational => open_relational(config),
        BackendKind::Document => open_document(config).await,
    }
}

#[cfg(feature = "sqlite")]
fn open_relational(config: &StorageConfig) -> StorageResult<DynBackend> {
    use crate::backends::sqlite::SqliteBackend;

    let backend = SqliteBackend::open(config.sqlite_path())?;
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "sqlite"))]
fn open_relational(_config: &StorageConfig) -> StorageResult<DynBackend> {
    Err(StorageError::Backend(BackendError::NotConfigured {
        backend_name: "sqlite".to_string(),
    }))
}

#[cfg(feature = "mongodb")]
async fn open_document(config: &StorageConfig) -> StorageResult<DynBackend> {
    use crate::backends::mongodb::MongoBackend;

    let backend = MongoBackend::connect(&config.mongo_uri, &config.mongo_database_name()).await?;
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "mongodb"))]
async fn open_document(_config: &StorageConfig) -> StorageResult<DynBackend> {
    Err(StorageError::Backend(BackendError::NotConfigured {
        backend_name: "mongodb".to_string(),
    }))
}
