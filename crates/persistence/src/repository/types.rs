//! Item type facade, cached.

use std::sync::Arc;

use crate::cache::list_key;
use crate::core::TypeStore;
use crate::error::{StorageError, StorageResult};
use crate::types::{ItemType, RestoreMode};

use super::Dispatch;

const AGGREGATE: &str = "types";

/// Operations on item types, keyed by name.
///
/// Listings are served from the cache; every write evicts the active
/// backend's list before returning.
#[derive(Debug, Clone)]
pub struct TypeRepository {
    dispatch: Arc<Dispatch>,
}

impl TypeRepository {
    pub(crate) fn new(dispatch: Arc<Dispatch>) -> Self {
        Self { dispatch }
    }

    /// All types ordered by name.
    pub async fn list_all(&self) -> StorageResult<Vec<ItemType>> {
        let (kind, backend) = self.dispatch.active()?;
        self.dispatch
            .cache()
            .get_or_load(&list_key(AGGREGATE, kind), || backend.list_types())
            .await
    }

    /// Looks `name` up in the cached list.
    pub async fn find_by_name(&self, name: &str) -> StorageResult<Option<ItemType>> {
        Ok(self.list_all().await?.into_iter().find(|t| t.name == name))
    }

    /// Creates a type.
    ///
    /// # Errors
    ///
    /// `DuplicateKey` if the name is taken.
    pub async fn insert(&self, name: &str) -> StorageResult<ItemType> {
        let (kind, backend) = self.dispatch.active()?;
        let result = backend.insert_type(name).await;
        self.dispatch.cache().evict(&list_key(AGGREGATE, kind)).await;
        result
    }

    pub async fn delete(&self, name: &str) -> StorageResult<bool> {
        let (kind, backend) = self.dispatch.active()?;
        let result = backend.delete_type(name).await;
        self.dispatch.cache().evict(&list_key(AGGREGATE, kind)).await;
        result
    }

    /// Type names, for backups.
    pub async fn get_all_for_backup(&self) -> StorageResult<Vec<String>> {
        let (_, backend) = self.dispatch.active()?;
        Ok(backend
            .list_types()
            .await?
            .into_iter()
            .map(|t| t.name)
            .collect())
    }

    /// Restores type names and returns how many were written.
    ///
    /// A type carries nothing besides its name, so merge only inserts the
    /// missing ones.
    pub async fn restore(&self, names: &[String], mode: RestoreMode) -> StorageResult<usize> {
        let (kind, backend) = self.dispatch.active()?;

        let result = async {
            let mut written = 0;
            for name in names {
                match mode {
                    RestoreMode::Merge => {
                        if backend.find_type(name).await?.is_some() {
                            continue;
                        }
                    }
                    RestoreMode::Replace => {
                        backend.delete_type(name).await?;
                    }
                }
                backend.insert_type(name).await?;
                written += 1;
            }
            Ok::<_, StorageError>(written)
        }
        .await;

        self.dispatch.cache().evict(&list_key(AGGREGATE, kind)).await;
        result
    }
}
