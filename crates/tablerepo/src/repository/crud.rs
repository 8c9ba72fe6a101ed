use async_trait::async_trait;

use tablerepo_core::{
    Entity, Key, KeyDescriptor, KeyType, NoSortKey, RepositoryError, Result, SharedStore,
};

use super::read::ReadRepository;
use super::table::entity_to_item;
use super::{Reader, ScanConfigurator, Writer};

/// Repository with read and write access to the table of entity `E`.
///
/// Reads are delegated to the wrapped [`ReadRepository`].
pub struct CrudRepository<E, P, S = NoSortKey> {
    reader: ReadRepository<E, P, S>,
}

impl<E, P, S> Clone for CrudRepository<E, P, S> {
    fn clone(&self) -> Self {
        Self {
            reader: self.reader.clone(),
        }
    }
}

impl<E, P, S> std::fmt::Debug for CrudRepository<E, P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrudRepository")
            .field("reader", &self.reader)
            .finish()
    }
}

impl<E: Entity, P: KeyType, S: KeyType> CrudRepository<E, P, S> {
    /// Creates a repository with eventually consistent reads.
    pub fn new(store: SharedStore) -> Result<Self> {
        Ok(Self {
            reader: ReadRepository::new(store)?,
        })
    }

    pub fn with_consistent_read(store: SharedStore, consistent_read: bool) -> Result<Self> {
        Ok(Self {
            reader: ReadRepository::with_consistent_read(store, consistent_read)?,
        })
    }

    /// The read-only view of this repository.
    pub fn reader(&self) -> &ReadRepository<E, P, S> {
        &self.reader
    }

    pub fn descriptor(&self) -> &KeyDescriptor {
        self.reader.descriptor()
    }

    pub fn table_name(&self) -> &str {
        self.reader.table_name()
    }

    pub fn is_consistent_read(&self) -> bool {
        self.reader.is_consistent_read()
    }

    async fn delete_found(&self, found: Option<E>, key: Key) -> Result<()> {
        match found {
            Some(entity) => self.delete(&entity).await,
            None => Err(RepositoryError::NotFound {
                entity_type: self.descriptor().entity_name().to_string(),
                id: key.to_string(),
            }),
        }
    }
}

#[async_trait]
impl<E: Entity, P: KeyType, S: KeyType> Reader for CrudRepository<E, P, S> {
    type Entity = E;
    type PartitionKey = P;
    type SortKey = S;

    async fn find_all(&self) -> Result<Vec<E>> {
        self.reader.find_all().await
    }

    async fn find_all_by(&self, configure: ScanConfigurator<'_>) -> Result<Vec<E>> {
        self.reader.find_all_by(configure).await
    }

    async fn find_all_by_partition_key(&self, partition_key: &P) -> Result<Vec<E>> {
        self.reader.find_all_by_partition_key(partition_key).await
    }

    async fn find_by(&self, partition_key: &P) -> Result<Option<E>> {
        self.reader.find_by(partition_key).await
    }

    async fn find_by_keys(&self, partition_key: &P, sort_key: &S) -> Result<Option<E>> {
        self.reader.find_by_keys(partition_key, sort_key).await
    }
}

#[async_trait]
impl<E: Entity, P: KeyType, S: KeyType> Writer for CrudRepository<E, P, S> {
    async fn save(&self, entity: &E) -> Result<()> {
        let item = entity_to_item(entity)?;
        // Fail before writing a row the table could not be keyed by
        self.descriptor().key_of(&item)?;
        self.reader.table().put_item(item).await
    }

    async fn delete(&self, entity: &E) -> Result<()> {
        let item = entity_to_item(entity)?;
        let key = self.descriptor().key_of(&item)?;
        self.reader.table().delete_item(&key).await
    }

    async fn delete_by(&self, partition_key: &P) -> Result<()> {
        let found = self.find_by(partition_key).await?;
        let key = self.descriptor().build_key(partition_key)?;
        self.delete_found(found, key).await
    }

    async fn delete_by_keys(&self, partition_key: &P, sort_key: &S) -> Result<()> {
        let found = self.find_by_keys(partition_key, sort_key).await?;
        let key = self
            .descriptor()
            .build_composite_key(partition_key, sort_key)?;
        self.delete_found(found, key).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tablerepo_core::{Item, ScanPage, ScanRequest, TableStore};

    use super::*;
    use crate::models::{TableWithPartition, TableWithSort};
    use crate::storage::InMemoryStore;

    type PartitionRepo = CrudRepository<TableWithPartition, String>;
    type SortRepo = CrudRepository<TableWithSort, String, String>;

    async fn store() -> Arc<InMemoryStore> {
        let store = InMemoryStore::new().with_page_size(2);
        store.create_table("Test", "id", None).await;
        store.create_table("TableWithSort", "id", Some("sort")).await;
        Arc::new(store)
    }

    fn id(value: &str) -> String {
        value.to_string()
    }

    /// Store that rejects the nth write (1-based) and passes everything
    /// else through to the wrapped store.
    struct FailingStore {
        inner: Arc<InMemoryStore>,
        fail_at: usize,
        writes: AtomicUsize,
    }

    impl FailingStore {
        fn new(inner: Arc<InMemoryStore>, fail_at: usize) -> Arc<Self> {
            Arc::new(Self {
                inner,
                fail_at,
                writes: AtomicUsize::new(0),
            })
        }

        fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        fn next_write(&self) -> Result<()> {
            let write = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
            if write == self.fail_at {
                return Err(RepositoryError::QueryFailed(format!("write {write} rejected")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl TableStore for FailingStore {
        async fn get_item(
            &self,
            table: &str,
            key: &Key,
            consistent_read: bool,
        ) -> Result<Option<Item>> {
            self.inner.get_item(table, key, consistent_read).await
        }

        async fn scan(
            &self,
            table: &str,
            request: &ScanRequest,
            exclusive_start_key: Option<Item>,
        ) -> Result<ScanPage> {
            self.inner.scan(table, request, exclusive_start_key).await
        }

        async fn put_item(&self, table: &str, item: Item) -> Result<()> {
            self.next_write()?;
            self.inner.put_item(table, item).await
        }

        async fn delete_item(&self, table: &str, key: &Key) -> Result<()> {
            self.next_write()?;
            self.inner.delete_item(table, key).await
        }
    }

    #[tokio::test]
    async fn test_save_then_find_round_trip() {
        let store = store().await;
        let repo = SortRepo::new(store).unwrap();
        let entity = TableWithSort::new("test1", "sort11", "Record Title 1");

        repo.save(&entity).await.unwrap();

        let found = repo
            .find_by_keys(&id("test1"), &id("sort11"))
            .await
            .unwrap();
        assert_eq!(found, Some(entity));
    }

    #[tokio::test]
    async fn test_save_is_idempotent_upsert() {
        let store = store().await;
        let repo = PartitionRepo::new(store.clone()).unwrap();
        let entity = TableWithPartition::new("test1", "first");

        repo.save(&entity).await.unwrap();
        repo.save(&entity).await.unwrap();
        assert_eq!(store.item_count("Test").await.unwrap(), 1);

        let updated = TableWithPartition::new("test1", "second");
        repo.save(&updated).await.unwrap();
        assert_eq!(store.item_count("Test").await.unwrap(), 1);
        assert_eq!(repo.find_by(&id("test1")).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_save_all_and_delete_all() {
        let store = store().await;
        let repo = SortRepo::new(store.clone()).unwrap();

        repo.save_all(&TableWithSort::samples()).await.unwrap();
        assert_eq!(repo.find_all().await.unwrap().len(), 6);

        repo.delete_all().await.unwrap();
        assert!(repo.find_all().await.unwrap().is_empty());
        assert_eq!(store.item_count("TableWithSort").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_ignores_non_key_fields() {
        let store = store().await;
        let repo = SortRepo::new(store).unwrap();
        repo.save(&TableWithSort::new("test2", "sort21", "Record Title 2"))
            .await
            .unwrap();

        repo.delete(&TableWithSort::new("test2", "sort21", "Another title"))
            .await
            .unwrap();
        assert!(!repo.exists_by_keys(&id("test2"), &id("sort21")).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_key() {
        let store = store().await;
        let repo = PartitionRepo::new(store).unwrap();
        repo.save_all(&TableWithPartition::samples()).await.unwrap();

        repo.delete_by(&id("test2")).await.unwrap();

        let ids: HashSet<String> = repo
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|entity| entity.id)
            .collect();
        assert_eq!(ids, HashSet::from([id("test1"), id("test3")]));
    }

    #[tokio::test]
    async fn test_delete_by_missing_key_is_not_found() {
        let store = store().await;
        let partitioned = PartitionRepo::new(store.clone()).unwrap();
        let sorted = SortRepo::new(store).unwrap();

        let err = partitioned.delete_by(&id("missing")).await.unwrap_err();
        assert_eq!(
            err,
            RepositoryError::NotFound {
                entity_type: "TableWithPartition".to_string(),
                id: "id=missing".to_string(),
            }
        );

        let err = sorted
            .delete_by_keys(&id("test2"), &id("sort99"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "TableWithSort not found: id=test2, sort=sort99");
    }

    #[tokio::test]
    async fn test_delete_by_partition_only_on_sorted_entity_is_usage_error() {
        let store = store().await;
        let repo = SortRepo::new(store.clone()).unwrap();
        repo.save_all(&TableWithSort::samples()).await.unwrap();

        let err = repo.delete_by(&id("id1")).await.unwrap_err();
        assert!(err.is_usage());
        assert!(!err.is_not_found());

        // Also for a partition key that exists: nothing is deleted
        let err = repo.delete_by(&id("test1")).await.unwrap_err();
        assert!(err.is_usage());
        assert_eq!(store.item_count("TableWithSort").await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_delete_entities_with_absent_row_is_noop() {
        let store = store().await;
        let repo = SortRepo::new(store.clone()).unwrap();
        let existing = TableWithSort::new("test1", "sort11", "Record Title 1");
        let absent = TableWithSort::new("test9", "sort99", "Never saved");
        repo.save(&existing).await.unwrap();

        repo.delete_entities(&[existing, absent]).await.unwrap();

        assert_eq!(store.item_count("TableWithSort").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_save_all_stops_at_first_failure() {
        let store = FailingStore::new(store().await, 2);
        let repo = PartitionRepo::new(store.clone()).unwrap();

        let err = repo
            .save_all(&TableWithPartition::samples())
            .await
            .unwrap_err();
        assert_eq!(err, RepositoryError::QueryFailed("write 2 rejected".to_string()));

        // test1 stays committed, test3 was never attempted
        assert!(repo.exists_by(&id("test1")).await.unwrap());
        assert!(!repo.exists_by(&id("test2")).await.unwrap());
        assert!(!repo.exists_by(&id("test3")).await.unwrap());
        assert_eq!(store.writes(), 2);
    }

    #[tokio::test]
    async fn test_delete_entities_stops_at_first_failure() {
        let inner = store().await;
        let samples = TableWithPartition::samples();
        PartitionRepo::new(inner.clone())
            .unwrap()
            .save_all(&samples)
            .await
            .unwrap();
        let store = FailingStore::new(inner.clone(), 2);
        let repo = PartitionRepo::new(store.clone()).unwrap();

        let err = repo.delete_entities(&samples).await.unwrap_err();
        assert_eq!(err, RepositoryError::QueryFailed("write 2 rejected".to_string()));

        // test1 is gone, test2 and test3 are untouched
        assert!(!repo.exists_by(&id("test1")).await.unwrap());
        assert!(repo.exists_by(&id("test2")).await.unwrap());
        assert!(repo.exists_by(&id("test3")).await.unwrap());
        assert_eq!(inner.item_count("Test").await.unwrap(), 2);
        assert_eq!(store.writes(), 2);
    }

    #[tokio::test]
    async fn test_reads_are_delegated() {
        let store = store().await;
        let repo = SortRepo::with_consistent_read(store, true).unwrap();
        repo.save_all(&TableWithSort::samples()).await.unwrap();

        assert!(repo.is_consistent_read());
        assert_eq!(repo.table_name(), "TableWithSort");
        assert_eq!(
            repo.find_all_by_partition_key(&id("test3"))
                .await
                .unwrap()
                .len(),
            2
        );
        assert_eq!(
            repo.find_all_by(&|request| request.max_items(1))
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(repo.reader().exists_by_keys(&id("test1"), &id("sort11")).await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_use_from_tasks() {
        let store = store().await;
        let repo = Arc::new(PartitionRepo::new(store.clone()).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move {
                    repo.save(&TableWithPartition::new(&format!("row{n}"), "x"))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.item_count("Test").await.unwrap(), 8);
    }
}
