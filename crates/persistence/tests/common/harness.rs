//! Backend construction for the integration suites.

use std::sync::Arc;

#[cfg(feature = "sqlite")]
use larder_persistence::backends::sqlite::SqliteBackend;
use larder_persistence::cache::CacheAside;
use larder_persistence::core::{Backend, BackendSelector, DynBackend};
use larder_persistence::repository::Repositories;

/// A fresh in-memory SQLite backend with its schema.
#[cfg(feature = "sqlite")]
pub fn sqlite_backend() -> Arc<SqliteBackend> {
    let backend = SqliteBackend::in_memory().expect("Failed to create SQLite backend");
    backend.init_schema().expect("Failed to initialize schema");
    Arc::new(backend)
}

/// Facades over `backend` alone, with a private in-process cache.
pub fn repositories(backend: DynBackend) -> Repositories {
    let kind = backend.kind();
    Repositories::builder()
        .backend(backend)
        .selector(BackendSelector::fixed(kind))
        .cache(CacheAside::in_memory())
        .build()
}

#[cfg(feature = "sqlite")]
pub fn sqlite_repositories() -> Repositories {
    repositories(sqlite_backend())
}

#[cfg(feature = "mongodb")]
pub mod mongo {
    //! A MongoDB container shared by every test in the binary.
    //!
    //! Each backend gets its own database so tests never see each other's
    //! records.

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use larder_persistence::backends::mongodb::MongoBackend;
    use larder_persistence::core::Backend;
    use testcontainers::ImageExt;
    use testcontainers::runners::AsyncRunner;
    use testcontainers_modules::mongo::Mongo;
    use tokio::sync::OnceCell;

    struct SharedMongo {
        uri: String,
        /// Kept alive for the duration of the test binary.
        _container: testcontainers::ContainerAsync<Mongo>,
    }

    static SHARED_MONGO: OnceCell<SharedMongo> = OnceCell::const_new();
    static NEXT_DATABASE: AtomicUsize = AtomicUsize::new(0);

    async fn shared_mongo() -> &'static SharedMongo {
        SHARED_MONGO
            .get_or_init(|| async {
                let run_id = std::env::var("GITHUB_RUN_ID").unwrap_or_default();
                let container = Mongo::default()
                    .with_label("github.run_id", &run_id)
                    .start()
                    .await
                    .expect("Failed to start MongoDB container");

                let host = container.get_host().await.expect("Failed to get host");
                let port = container
                    .get_host_port_ipv4(27017)
                    .await
                    .expect("Failed to get host port");

                SharedMongo {
                    uri: format!("mongodb://{host}:{port}"),
                    _container: container,
                }
            })
            .await
    }

    /// A MongoBackend on a fresh database with its indexes.
    pub async fn mongo_backend() -> Arc<MongoBackend> {
        let shared = shared_mongo().await;
        let n = NEXT_DATABASE.fetch_add(1, Ordering::SeqCst);
        let database = format!("larder_test_{}_{}", std::process::id(), n);

        let backend = MongoBackend::connect(&shared.uri, &database)
            .await
            .expect("Failed to create MongoBackend");
        backend.initialize().await.expect("Failed to create indexes");
        Arc::new(backend)
    }
}
