//! MongoDB backend implementation.

use std::fmt::Debug;

use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::options::{Collation, CollationStrength, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};

use crate::core::{ArrayOwner, Backend, BackendKind};
use crate::error::{BackendError, StorageError, StorageResult};

/// Collection names.
pub(crate) const ITEMS: &str = "item";
pub(crate) const TYPES: &str = "type";
pub(crate) const LOCATIONS: &str = "locations";
pub(crate) const USERS: &str = "user";
pub(crate) const LOGS: &str = "activity_logs";

/// Configuration for the MongoDB backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoBackendConfig {
    /// Connection URI.
    pub uri: String,
    /// Database name.
    pub database: String,
}

impl MongoBackendConfig {
    pub fn new(uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
        }
    }
}

/// MongoDB backend for inventory storage.
///
/// The driver connects lazily; [`Backend::health_check`] or
/// [`Backend::initialize`] is the first call that reaches the server.
#[derive(Clone)]
pub struct MongoBackend {
    client: Client,
    db: Database,
    config: MongoBackendConfig,
}

impl Debug for MongoBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoBackend")
            .field("database", &self.config.database)
            .finish_non_exhaustive()
    }
}

impl MongoBackend {
    /// Creates a client for `uri` and selects `database`.
    pub async fn connect(uri: &str, database: &str) -> StorageResult<Self> {
        Self::with_config(MongoBackendConfig::new(uri, database)).await
    }

    pub async fn with_config(config: MongoBackendConfig) -> StorageResult<Self> {
        let client = Client::with_uri_str(&config.uri).await.map_err(|e| {
            StorageError::Backend(BackendError::ConnectionFailed {
                backend_name: "mongodb".to_string(),
                message: e.to_string(),
            })
        })?;
        let db = client.database(&config.database);

        tracing::debug!(database = %config.database, "created mongodb client");

        Ok(Self { client, db, config })
    }

    pub(crate) fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection::<Document>(name)
    }

    /// Collection and key field of an array owner.
    pub(crate) fn owner_collection(&self, owner: ArrayOwner) -> (Collection<Document>, &'static str) {
        match owner {
            ArrayOwner::Item => (self.collection(ITEMS), "ItemID"),
            ArrayOwner::User => (self.collection(USERS), "User"),
        }
    }

    /// Returns the database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Returns the backend configuration.
    pub fn config(&self) -> &MongoBackendConfig {
        &self.config
    }

    /// Creates the unique and lookup indexes.
    pub async fn ensure_indexes(&self) -> StorageResult<()> {
        let unique = || IndexOptions::builder().unique(true).build();

        let item_indexes = vec![
            IndexModel::builder()
                .keys(doc! { "ItemID": 1 })
                .options(unique())
                .build(),
            IndexModel::builder().keys(doc! { "ItemName": 1 }).build(),
            IndexModel::builder().keys(doc! { "ItemType": 1 }).build(),
            IndexModel::builder()
                .keys(doc! { "ItemFloor": 1, "ItemRoom": 1, "ItemZone": 1 })
                .build(),
            IndexModel::builder().keys(doc! { "WarrantyExpiry": 1 }).build(),
            IndexModel::builder().keys(doc! { "UsageExpiry": 1 }).build(),
            IndexModel::builder().keys(doc! { "favorites": 1 }).build(),
        ];
        self.collection(ITEMS).create_indexes(item_indexes).await?;

        self.collection(TYPES)
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "name": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;

        self.collection(LOCATIONS)
            .create_index(IndexModel::builder().keys(doc! { "order": 1 }).build())
            .await?;

        // Strength 2 compares ignoring case only, so "alice" and "Alice"
        // collide while "Émile" and "Emile" do not.
        let case_insensitive = Collation::builder()
            .locale("en")
            .strength(CollationStrength::Secondary)
            .build();
        self.collection(USERS)
            .create_indexes(vec![
                IndexModel::builder()
                    .keys(doc! { "User": 1 })
                    .options(unique())
                    .build(),
                IndexModel::builder()
                    .keys(doc! { "User": 1 })
                    .options(
                        IndexOptions::builder()
                            .name("User_ci".to_string())
                            .unique(true)
                            .collation(case_insensitive)
                            .build(),
                    )
                    .build(),
            ])
            .await?;

        self.collection(LOGS)
            .create_indexes(vec![
                IndexModel::builder()
                    .keys(doc! { "created_at": -1, "_id": -1 })
                    .build(),
                IndexModel::builder()
                    .keys(doc! { "item_id": 1, "created_at": -1 })
                    .build(),
            ])
            .await?;

        Ok(())
    }
}

#[async_trait]
impl Backend for MongoBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Document
    }

    fn name(&self) -> &'static str {
        "mongodb"
    }

    async fn health_check(&self) -> Result<(), BackendError> {
        self.db
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| BackendError::Unavailable {
                backend_name: "mongodb".to_string(),
                message: format!("Health check failed: {}", e),
            })?;
        Ok(())
    }

    async fn initialize(&self) -> Result<(), BackendError> {
        self.ensure_indexes().await.map_err(|e| BackendError::MigrationError {
            message: format!("Failed to create indexes: {}", e),
        })
    }

    async fn shutdown(&self) -> Result<(), BackendError> {
        self.client.clone().shutdown().await;
        Ok(())
    }
}
