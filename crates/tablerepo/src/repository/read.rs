use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use tablerepo_core::{
    to_native_value, Condition, Entity, Key, KeyDescriptor, KeyType, NoSortKey, RepositoryError,
    Result, ScanRequest, SharedStore,
};

use super::table::{item_to_entity, Table};
use super::{Reader, ScanConfigurator};

/// Read-only repository for entity `E` with partition key type `P` and sort
/// key type `S` ([`NoSortKey`] for tables without sort key).
pub struct ReadRepository<E, P, S = NoSortKey> {
    descriptor: Arc<KeyDescriptor>,
    table: Table,
    consistent_read: bool,
    _types: PhantomData<fn() -> (E, P, S)>,
}

impl<E, P, S> Clone for ReadRepository<E, P, S> {
    fn clone(&self) -> Self {
        Self {
            descriptor: Arc::clone(&self.descriptor),
            table: self.table.clone(),
            consistent_read: self.consistent_read,
            _types: PhantomData,
        }
    }
}

impl<E, P, S> std::fmt::Debug for ReadRepository<E, P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadRepository")
            .field("descriptor", &self.descriptor)
            .field("table", &self.table)
            .field("consistent_read", &self.consistent_read)
            .finish()
    }
}

impl<E: Entity, P: KeyType, S: KeyType> ReadRepository<E, P, S> {
    /// Creates a repository with eventually consistent reads.
    pub fn new(store: SharedStore) -> Result<Self> {
        Self::with_consistent_read(store, false)
    }

    /// Creates a repository; `consistent_read` applies to every get and scan
    /// it issues.
    ///
    /// Fails with a configuration error when the entity's key declaration
    /// does not match `P` and `S`, or when its table cannot be opened.
    pub fn with_consistent_read(store: SharedStore, consistent_read: bool) -> Result<Self> {
        let schema = E::schema();
        let descriptor = KeyDescriptor::derive::<P, S>(&schema)?;
        let table = Table::open(store, &schema, descriptor.table_name())?;

        info!(
            entity = descriptor.entity_name(),
            table = table.name(),
            partition_key = %descriptor.partition_key().name,
            sort_key = descriptor.sort_key().map(|key| key.name.as_str()),
            consistent_read,
            "Bound repository to table"
        );

        Ok(Self {
            descriptor: Arc::new(descriptor),
            table,
            consistent_read,
            _types: PhantomData,
        })
    }

    pub fn descriptor(&self) -> &KeyDescriptor {
        &self.descriptor
    }

    pub fn table_name(&self) -> &str {
        self.table.name()
    }

    pub fn is_consistent_read(&self) -> bool {
        self.consistent_read
    }

    pub(crate) fn table(&self) -> &Table {
        &self.table
    }

    async fn scan(&self, request: ScanRequest) -> Result<Vec<E>> {
        let request = request.consistent_read(self.consistent_read);
        self.table
            .scan_all(&request)
            .await?
            .into_iter()
            .map(item_to_entity)
            .collect()
    }

    async fn get(&self, key: &Key) -> Result<Option<E>> {
        self.table
            .get_item(key, self.consistent_read)
            .await?
            .map(item_to_entity)
            .transpose()
    }

    fn usage_error(&self, message: String, action: &str) -> RepositoryError {
        RepositoryError::Usage {
            entity_type: self.descriptor.entity_name().to_string(),
            message,
            action: action.to_string(),
        }
    }
}

#[async_trait]
impl<E: Entity, P: KeyType, S: KeyType> Reader for ReadRepository<E, P, S> {
    type Entity = E;
    type PartitionKey = P;
    type SortKey = S;

    async fn find_all(&self) -> Result<Vec<E>> {
        self.scan(ScanRequest::new()).await
    }

    async fn find_all_by(&self, configure: ScanConfigurator<'_>) -> Result<Vec<E>> {
        self.scan(configure(ScanRequest::new())).await
    }

    async fn find_all_by_partition_key(&self, partition_key: &P) -> Result<Vec<E>> {
        let attribute = &self.descriptor.partition_key().name;
        warn!(
            table = self.table.name(),
            partition_key = %attribute,
            "Scanning the whole table to filter by partition key"
        );
        let filter = Condition::eq(attribute.as_str(), to_native_value(partition_key)?);
        self.scan(ScanRequest::new().filter(filter)).await
    }

    async fn find_by(&self, partition_key: &P) -> Result<Option<E>> {
        if self.descriptor.has_sort_key() {
            return Err(self.usage_error(
                format!(
                    "Sort key detected in the entity {}.",
                    self.descriptor.entity_name()
                ),
                "For entities with sort key use find_by_keys(partition_key, sort_key) \
                 instead of find_by(partition_key).",
            ));
        }
        let key = self.descriptor.build_key(partition_key)?;
        self.get(&key).await
    }

    async fn find_by_keys(&self, partition_key: &P, sort_key: &S) -> Result<Option<E>> {
        if !self.descriptor.has_sort_key() {
            return Err(self.usage_error(
                format!(
                    "Sort key is missing in the entity {}.",
                    self.descriptor.entity_name()
                ),
                "For entities without sort key use find_by(partition_key) \
                 instead of find_by_keys(partition_key, sort_key).",
            ));
        }
        let key = self.descriptor.build_composite_key(partition_key, sort_key)?;
        self.get(&key).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use aws_sdk_dynamodb::types::AttributeValue;
    use serde::{Deserialize, Serialize};
    use tablerepo_core::{EntitySchema, FieldSchema, Item, KeyKind, ScanPage, TableStore};

    use super::*;
    use crate::models::{TableWithPartition, TableWithSort};
    use crate::storage::InMemoryStore;

    /// Store wrapper recording the consistency flag of every read.
    struct RecordingStore {
        inner: InMemoryStore,
        reads: Mutex<Vec<bool>>,
    }

    impl RecordingStore {
        fn new(inner: InMemoryStore) -> Self {
            Self {
                inner,
                reads: Mutex::new(Vec::new()),
            }
        }

        fn reads(&self) -> Vec<bool> {
            self.reads.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TableStore for RecordingStore {
        async fn get_item(
            &self,
            table: &str,
            key: &Key,
            consistent_read: bool,
        ) -> Result<Option<Item>> {
            self.reads.lock().unwrap().push(consistent_read);
            self.inner.get_item(table, key, consistent_read).await
        }

        async fn scan(
            &self,
            table: &str,
            request: &ScanRequest,
            exclusive_start_key: Option<Item>,
        ) -> Result<ScanPage> {
            self.reads.lock().unwrap().push(request.consistent_read);
            self.inner.scan(table, request, exclusive_start_key).await
        }

        async fn put_item(&self, table: &str, item: Item) -> Result<()> {
            self.inner.put_item(table, item).await
        }

        async fn delete_item(&self, table: &str, key: &Key) -> Result<()> {
            self.inner.delete_item(table, key).await
        }
    }

    async fn seeded_store() -> InMemoryStore {
        let store = InMemoryStore::new().with_page_size(2);
        store.create_table("Test", "id", None).await;
        store.create_table("TableWithSort", "id", Some("sort")).await;
        for entity in TableWithPartition::samples() {
            store
                .put_item("Test", serde_dynamo::to_item(&entity).unwrap())
                .await
                .unwrap();
        }
        for entity in TableWithSort::samples() {
            store
                .put_item("TableWithSort", serde_dynamo::to_item(&entity).unwrap())
                .await
                .unwrap();
        }
        store
    }

    fn id(value: &str) -> String {
        value.to_string()
    }

    #[tokio::test]
    async fn test_find_all_returns_every_row() {
        let store = Arc::new(seeded_store().await);
        let repo = ReadRepository::<TableWithPartition, String>::new(store).unwrap();

        let ids: HashSet<String> = repo
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|entity| entity.id)
            .collect();
        assert_eq!(ids, HashSet::from([id("test1"), id("test2"), id("test3")]));
    }

    #[tokio::test]
    async fn test_find_all_by_partition_key_without_sort_key() {
        let store = Arc::new(seeded_store().await);
        let repo = ReadRepository::<TableWithPartition, String>::new(store).unwrap();

        let found = repo.find_all_by_partition_key(&id("test1")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "test1");
    }

    #[tokio::test]
    async fn test_find_all_by_partition_key_with_sort_key() {
        let store = Arc::new(seeded_store().await);
        let repo = ReadRepository::<TableWithSort, String, String>::new(store).unwrap();

        let sorts: HashSet<String> = repo
            .find_all_by_partition_key(&id("test2"))
            .await
            .unwrap()
            .into_iter()
            .map(|entity| entity.sort)
            .collect();
        assert_eq!(
            sorts,
            HashSet::from([id("sort21"), id("sort22"), id("sort23")])
        );
    }

    #[tokio::test]
    async fn test_find_all_by_applies_configurator() {
        let store = Arc::new(seeded_store().await);
        let repo = ReadRepository::<TableWithSort, String, String>::new(store).unwrap();

        let found = repo
            .find_all_by(&|request| {
                request.filter(Condition::begins_with("title", "Record Title").and(
                    Condition::eq("id", AttributeValue::S(id("test3"))),
                ))
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 2);

        let limited = repo
            .find_all_by(&|request| request.max_items(4))
            .await
            .unwrap();
        assert_eq!(limited.len(), 4);
    }

    #[tokio::test]
    async fn test_find_by_with_matching_arity() {
        let store = Arc::new(seeded_store().await);
        let partitioned =
            ReadRepository::<TableWithPartition, String>::new(store.clone()).unwrap();
        let sorted = ReadRepository::<TableWithSort, String, String>::new(store).unwrap();

        let found = partitioned.find_by(&id("test2")).await.unwrap().unwrap();
        assert_eq!(found.id, "test2");
        assert!(partitioned.find_by(&id("missing")).await.unwrap().is_none());

        let found = sorted
            .find_by_keys(&id("test2"), &id("sort22"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.title, "Record Title 3");
        assert!(sorted
            .find_by_keys(&id("test2"), &id("sort99"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_find_by_partition_only_on_sorted_entity_is_usage_error() {
        let store = Arc::new(seeded_store().await);
        let repo = ReadRepository::<TableWithSort, String, String>::new(store).unwrap();

        for key in ["test1", "test2", "missing"] {
            let err = repo.find_by(&id(key)).await.unwrap_err();
            assert!(err.is_usage());
            assert!(err.action().unwrap().contains("find_by_keys"));
            assert!(repo.exists_by(&id(key)).await.unwrap_err().is_usage());
        }
    }

    #[tokio::test]
    async fn test_find_by_keys_without_sort_key_is_usage_error() {
        /// A user-defined "no sort key" marker that, unlike `NoSortKey`, has a value.
        #[derive(Debug)]
        struct Absent;

        impl KeyType for Absent {
            const KIND: Option<KeyKind> = None;
        }

        #[derive(Debug, Serialize, Deserialize)]
        struct Counter {
            id: i64,
        }

        impl Entity for Counter {
            fn schema() -> EntitySchema {
                EntitySchema::of::<Self>()
                    .field(FieldSchema::new("id", KeyKind::Int64).partition_key())
            }
        }

        let store = Arc::new(seeded_store().await);
        let repo = ReadRepository::<Counter, i64, Absent>::new(store).unwrap();

        let err = repo.find_by_keys(&1, &Absent).await.unwrap_err();
        assert!(err.is_usage());
        assert!(err.to_string().contains("Counter"));
        assert!(err.action().unwrap().contains("find_by(partition_key)"));
        assert!(repo.exists_by_keys(&1, &Absent).await.unwrap_err().is_usage());
    }

    #[tokio::test]
    async fn test_exists_matches_find() {
        let store = Arc::new(seeded_store().await);
        let partitioned =
            ReadRepository::<TableWithPartition, String>::new(store.clone()).unwrap();
        let sorted = ReadRepository::<TableWithSort, String, String>::new(store).unwrap();

        for key in ["test1", "test3", "nope"] {
            let found = partitioned.find_by(&id(key)).await.unwrap().is_some();
            assert_eq!(partitioned.exists_by(&id(key)).await.unwrap(), found);
        }
        for (pk, sk) in [("test1", "sort11"), ("test3", "sort32"), ("test1", "sort12")] {
            let found = sorted.find_by_keys(&id(pk), &id(sk)).await.unwrap().is_some();
            assert_eq!(sorted.exists_by_keys(&id(pk), &id(sk)).await.unwrap(), found);
        }
    }

    #[tokio::test]
    async fn test_consistency_mode_applies_to_every_read() {
        let store = Arc::new(RecordingStore::new(seeded_store().await));
        let repo =
            ReadRepository::<TableWithPartition, String>::with_consistent_read(store.clone(), true)
                .unwrap();
        assert!(repo.is_consistent_read());

        repo.find_all().await.unwrap();
        repo.find_by(&id("test1")).await.unwrap();
        repo.find_all_by_partition_key(&id("test1")).await.unwrap();
        // The instance setting wins over the configurator
        repo.find_all_by(&|request| request.consistent_read(false))
            .await
            .unwrap();

        let reads = store.reads();
        assert!(!reads.is_empty());
        assert!(reads.iter().all(|consistent| *consistent));
    }

    #[tokio::test]
    async fn test_eventual_reads_by_default() {
        let store = Arc::new(RecordingStore::new(seeded_store().await));
        let repo = ReadRepository::<TableWithPartition, String>::new(store.clone()).unwrap();

        repo.find_all_by(&|request| request.consistent_read(true))
            .await
            .unwrap();
        repo.find_by(&id("test1")).await.unwrap();

        assert!(store.reads().iter().all(|consistent| !*consistent));
    }

    #[test]
    fn test_construction_fails_on_key_type_mismatch() {
        let store: SharedStore = Arc::new(InMemoryStore::new());

        let err = ReadRepository::<TableWithPartition, i32>::new(store.clone()).unwrap_err();
        assert!(err.is_configuration());

        let err = ReadRepository::<TableWithSort, String>::new(store.clone()).unwrap_err();
        assert!(err.is_configuration());

        let err = ReadRepository::<TableWithPartition, String, String>::new(store).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.action().is_some());
    }

    #[test]
    fn test_table_name_resolution() {
        let store: SharedStore = Arc::new(InMemoryStore::new());
        let partitioned = ReadRepository::<TableWithPartition, String>::new(store.clone()).unwrap();
        let sorted = ReadRepository::<TableWithSort, String, String>::new(store).unwrap();

        assert_eq!(partitioned.table_name(), "Test");
        assert_eq!(sorted.table_name(), "TableWithSort");
        assert_eq!(sorted.descriptor().sort_key().unwrap().name, "sort");
    }
}
