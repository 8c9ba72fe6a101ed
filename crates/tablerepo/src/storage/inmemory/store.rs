//! In-memory table store implementation.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use tokio::sync::RwLock;

use tablerepo_core::{Item, Key, RepositoryError, Result, ScanPage, ScanRequest, TableStore};

/// Rows evaluated per scan request when the request sets no page size.
const DEFAULT_PAGE_SIZE: usize = 100;

/// In-memory table store for testing.
///
/// Rows are kept ordered by their encoded key so scans page through a table
/// deterministically. Data is not persisted and is lost when the last clone
/// of the store is dropped.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    tables: Arc<RwLock<HashMap<String, MemoryTable>>>,
    page_size: usize,
}

#[derive(Debug)]
struct MemoryTable {
    partition_key: String,
    sort_key: Option<String>,
    rows: BTreeMap<String, Item>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates a new store without tables.
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(HashMap::new())),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets how many rows a scan evaluates per page by default.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Creates an empty table with the given key attribute names.
    /// An existing table of the same name is replaced.
    pub async fn create_table(&self, name: &str, partition_key: &str, sort_key: Option<&str>) {
        let mut tables = self.tables.write().await;
        tables.insert(
            name.to_string(),
            MemoryTable {
                partition_key: partition_key.to_string(),
                sort_key: sort_key.map(str::to_string),
                rows: BTreeMap::new(),
            },
        );
        tracing::debug!(table = name, partition_key, ?sort_key, "Created in-memory table");
    }

    /// Number of rows currently stored in `table`.
    pub async fn item_count(&self, table: &str) -> Result<usize> {
        let tables = self.tables.read().await;
        Ok(lookup(&tables, table)?.rows.len())
    }
}

fn lookup<'a>(tables: &'a HashMap<String, MemoryTable>, name: &str) -> Result<&'a MemoryTable> {
    tables
        .get(name)
        .ok_or_else(|| RepositoryError::QueryFailed("Table not found".to_string()))
}

fn lookup_mut<'a>(
    tables: &'a mut HashMap<String, MemoryTable>,
    name: &str,
) -> Result<&'a mut MemoryTable> {
    tables
        .get_mut(name)
        .ok_or_else(|| RepositoryError::QueryFailed("Table not found".to_string()))
}

impl MemoryTable {
    /// Encodes the key attributes of `attributes` into an ordered row id.
    ///
    /// Each part is prefixed with its length so no key value can spill
    /// into the next part.
    fn row_id(&self, attributes: &Item) -> Result<String> {
        let mut id = String::new();
        for name in std::iter::once(&self.partition_key).chain(self.sort_key.as_ref()) {
            let part = encode_key_attribute(attributes, name)?;
            id.push_str(&format!("{}:{part}", part.len()));
        }
        Ok(id)
    }

    /// Validates that a key names exactly this table's key attributes.
    fn row_id_for_key(&self, key: &Key) -> Result<String> {
        let matches_schema = key.partition_name() == self.partition_key
            && key.sort_name() == self.sort_key.as_deref();
        if !matches_schema {
            return Err(RepositoryError::QueryFailed(
                "The provided key element does not match the schema".to_string(),
            ));
        }
        self.row_id(&key.to_item())
    }

    fn key_item(&self, row: &Item) -> Item {
        let mut key = Item::new();
        for name in std::iter::once(&self.partition_key).chain(self.sort_key.as_ref()) {
            if let Some(value) = row.get(name) {
                key.insert(name.clone(), value.clone());
            }
        }
        key
    }
}

fn encode_key_attribute(attributes: &Item, name: &str) -> Result<String> {
    let value = attributes.get(name).ok_or_else(|| {
        RepositoryError::QueryFailed(format!(
            "One of the required keys was not given a value: {name}"
        ))
    })?;
    match value {
        AttributeValue::S(s) if s.is_empty() => Err(RepositoryError::QueryFailed(format!(
            "One or more parameter values are not valid. The AttributeValue for a key \
             attribute cannot contain an empty string value. Key: {name}"
        ))),
        AttributeValue::S(s) => Ok(format!("S:{s}")),
        AttributeValue::N(n) => {
            let canonical = canonical_number(n).ok_or_else(|| {
                RepositoryError::QueryFailed(format!("Invalid number for key {name}: {n}"))
            })?;
            Ok(format!("N:{canonical}"))
        }
        AttributeValue::Bool(b) => Ok(format!("B:{b}")),
        other => Err(RepositoryError::QueryFailed(format!(
            "Invalid attribute value type for key {name}: {other:?}"
        ))),
    }
}

/// Normalizes decimal text to `<digits>e<exponent>` without trailing zeros,
/// so equal numbers encode equally at any precision.
fn canonical_number(text: &str) -> Option<String> {
    let text = text.trim();
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i64>().ok()?),
        None => (unsigned, 0),
    };
    let (integer, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if integer.is_empty() && fraction.is_empty() {
        return None;
    }
    if !integer.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let digits = format!("{integer}{fraction}");
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Some("0".to_string());
    }
    let significant = digits.trim_end_matches('0');
    let trailing_zeros = i64::try_from(digits.len() - significant.len()).ok()?;
    let exponent = exponent
        .checked_sub(i64::try_from(fraction.len()).ok()?)?
        .checked_add(trailing_zeros)?;

    let sign = if negative { "-" } else { "" };
    Some(format!("{sign}{significant}e{exponent}"))
}

#[async_trait]
impl TableStore for InMemoryStore {
    async fn get_item(
        &self,
        table: &str,
        key: &Key,
        _consistent_read: bool,
    ) -> Result<Option<Item>> {
        let tables = self.tables.read().await;
        let table = lookup(&tables, table)?;
        let id = table.row_id_for_key(key)?;
        Ok(table.rows.get(&id).cloned())
    }

    async fn scan(
        &self,
        table: &str,
        request: &ScanRequest,
        exclusive_start_key: Option<Item>,
    ) -> Result<ScanPage> {
        let tables = self.tables.read().await;
        let table = lookup(&tables, table)?;

        let lower = match &exclusive_start_key {
            Some(start) => Bound::Excluded(table.row_id(start)?),
            None => Bound::Unbounded,
        };
        let page_size = request
            .page_size
            .and_then(|size| usize::try_from(size).ok())
            .filter(|size| *size > 0)
            .unwrap_or(self.page_size);

        let mut remaining = table.rows.range((lower, Bound::Unbounded));
        let evaluated: Vec<&Item> = remaining.by_ref().take(page_size).map(|(_, row)| row).collect();
        let has_more = remaining.next().is_some();

        let last_evaluated_key = match evaluated.last() {
            Some(last) if has_more => Some(table.key_item(last)),
            _ => None,
        };
        let items = evaluated
            .into_iter()
            .filter(|row| {
                request
                    .filter
                    .as_ref()
                    .is_none_or(|condition| condition.matches(row))
            })
            .cloned()
            .collect();

        Ok(ScanPage {
            items,
            last_evaluated_key,
        })
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<()> {
        let mut tables = self.tables.write().await;
        let table = lookup_mut(&mut tables, table)?;
        let id = table.row_id(&item)?;
        table.rows.insert(id, item);
        Ok(())
    }

    async fn delete_item(&self, table: &str, key: &Key) -> Result<()> {
        let mut tables = self.tables.write().await;
        let table = lookup_mut(&mut tables, table)?;
        let id = table.row_id_for_key(key)?;
        table.rows.remove(&id);
        Ok(())
    }
}
