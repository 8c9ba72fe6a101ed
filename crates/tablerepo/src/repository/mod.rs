//! Typed repositories over a table store.
//!
//! A repository is bound to one entity type and its declared key types. The
//! binding is checked once, at construction; after that every operation is
//! independent and the repository can be shared between tasks.
//!
//! - [`Reader`] covers scans and point lookups, implemented by
//!   [`ReadRepository`].
//! - [`Writer`] adds upserts and deletes, implemented by [`CrudRepository`],
//!   which wraps a `ReadRepository` and implements both traits.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tablerepo::models::TableWithSort;
//! use tablerepo::repository::{CrudRepository, Reader, Writer};
//! use tablerepo::storage::InMemoryStore;
//!
//! let store = InMemoryStore::new();
//! store.create_table("TableWithSort", "id", Some("sort")).await;
//!
//! let repo = CrudRepository::<TableWithSort, String, String>::new(Arc::new(store))?;
//! repo.save(&TableWithSort::new("test1", "sort11", "Record Title 1")).await?;
//! let found = repo.find_by_keys(&"test1".to_string(), &"sort11".to_string()).await?;
//! ```

mod crud;
mod read;
mod table;

use async_trait::async_trait;

use tablerepo_core::{Entity, KeyType, Result, ScanRequest};

pub use crud::CrudRepository;
pub use read::ReadRepository;
pub use table::Table;

/// Caller-supplied customization of a scan request.
pub type ScanConfigurator<'a> = &'a (dyn Fn(ScanRequest) -> ScanRequest + Send + Sync);

/// Read operations of a repository.
#[async_trait]
pub trait Reader: Send + Sync {
    type Entity: Entity;
    type PartitionKey: KeyType;
    type SortKey: KeyType;

    /// Every entity in the table, in the order the store yields them.
    async fn find_all(&self) -> Result<Vec<Self::Entity>>;

    /// Like [`find_all`](Reader::find_all) with a customized scan request.
    /// The repository's consistency mode is applied after `configure`.
    async fn find_all_by(&self, configure: ScanConfigurator<'_>) -> Result<Vec<Self::Entity>>;

    /// Every entity whose partition key equals `partition_key`.
    ///
    /// This is a scan of the whole table with a filter, not a key lookup.
    async fn find_all_by_partition_key(
        &self,
        partition_key: &Self::PartitionKey,
    ) -> Result<Vec<Self::Entity>>;

    /// Point lookup for entities without sort key.
    async fn find_by(&self, partition_key: &Self::PartitionKey) -> Result<Option<Self::Entity>>;

    /// Point lookup for entities with sort key.
    async fn find_by_keys(
        &self,
        partition_key: &Self::PartitionKey,
        sort_key: &Self::SortKey,
    ) -> Result<Option<Self::Entity>>;

    async fn exists_by(&self, partition_key: &Self::PartitionKey) -> Result<bool> {
        Ok(self.find_by(partition_key).await?.is_some())
    }

    async fn exists_by_keys(
        &self,
        partition_key: &Self::PartitionKey,
        sort_key: &Self::SortKey,
    ) -> Result<bool> {
        Ok(self.find_by_keys(partition_key, sort_key).await?.is_some())
    }
}

/// Write operations of a repository.
///
/// Operations over several entities issue one request per entity, in order.
/// They are not transactional: the first failure stops the sequence and
/// earlier writes stay committed, and concurrent writers may interleave.
#[async_trait]
pub trait Writer: Reader {
    /// Upserts `entity`, replacing any row with the same key.
    async fn save(&self, entity: &Self::Entity) -> Result<()>;

    async fn save_all(&self, entities: &[Self::Entity]) -> Result<()> {
        for entity in entities {
            self.save(entity).await?;
        }
        Ok(())
    }

    /// Deletes the row with the key of `entity`. Deleting an absent row is
    /// not an error.
    async fn delete(&self, entity: &Self::Entity) -> Result<()>;

    /// Deletes the entity found by [`find_by`](Reader::find_by); fails with
    /// `NotFound` when there is none.
    async fn delete_by(&self, partition_key: &Self::PartitionKey) -> Result<()>;

    /// Deletes the entity found by [`find_by_keys`](Reader::find_by_keys);
    /// fails with `NotFound` when there is none.
    async fn delete_by_keys(
        &self,
        partition_key: &Self::PartitionKey,
        sort_key: &Self::SortKey,
    ) -> Result<()>;

    /// Deletes every row returned by [`find_all`](Reader::find_all), one by one.
    async fn delete_all(&self) -> Result<()> {
        let entities = self.find_all().await?;
        self.delete_entities(&entities).await
    }

    async fn delete_entities(&self, entities: &[Self::Entity]) -> Result<()> {
        for entity in entities {
            self.delete(entity).await?;
        }
        Ok(())
    }
}
