use std::sync::Arc;

use async_trait::async_trait;

use crate::key::Key;

use super::{Item, Result, ScanPage, ScanRequest};

/// Primitive operations a key-value table store has to provide.
///
/// Every repository bound to the same store shares one handle, so
/// implementations must be safe to call concurrently.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Gets a single row by its full key.
    async fn get_item(&self, table: &str, key: &Key, consistent_read: bool)
        -> Result<Option<Item>>;

    /// Scans one page of the table, starting after `exclusive_start_key`.
    async fn scan(
        &self,
        table: &str,
        request: &ScanRequest,
        exclusive_start_key: Option<Item>,
    ) -> Result<ScanPage>;

    /// Writes a row, replacing any row with the same key.
    async fn put_item(&self, table: &str, item: Item) -> Result<()>;

    /// Deletes a row by key. Deleting an absent row succeeds.
    async fn delete_item(&self, table: &str, key: &Key) -> Result<()>;
}

/// Store handle shared by every repository built against the same client.
pub type SharedStore = Arc<dyn TableStore>;
