//! DynamoDB table store implementation.
//!
//! Implements `TableStore` from `tablerepo_core::storage` on top of the
//! `aws-sdk-dynamodb` client.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::operation::scan::ScanOutput;
use aws_sdk_dynamodb::Client;

use tablerepo_core::{Expression, Item, Key, Result, ScanPage, ScanRequest, TableStore};

use super::error::{map_delete_item_error, map_get_item_error, map_put_item_error, map_scan_error};

/// DynamoDB-based table store.
///
/// Tables are expected to exist already with key attributes matching the
/// entities bound to them.
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: Client,
}

impl DynamoDbStore {
    /// Creates a new store with the given DynamoDB client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Get the underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Filter expression of a scan request, if any.
fn filter_expression(request: &ScanRequest) -> Option<Expression> {
    request.filter.as_ref().map(|condition| condition.to_expression())
}

/// DynamoDB rejects empty expression attribute maps.
fn non_empty<V>(map: HashMap<String, V>) -> Option<HashMap<String, V>> {
    (!map.is_empty()).then_some(map)
}

/// Converts a scan response into a page.
fn page_from_output(output: ScanOutput) -> ScanPage {
    ScanPage {
        items: output.items.unwrap_or_default(),
        last_evaluated_key: output.last_evaluated_key.filter(|key| !key.is_empty()),
    }
}

#[async_trait]
impl TableStore for DynamoDbStore {
    async fn get_item(
        &self,
        table: &str,
        key: &Key,
        consistent_read: bool,
    ) -> Result<Option<Item>> {
        let result = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(key.to_item()))
            .consistent_read(consistent_read)
            .send()
            .await
            .map_err(map_get_item_error)?;

        Ok(result.item)
    }

    async fn scan(
        &self,
        table: &str,
        request: &ScanRequest,
        exclusive_start_key: Option<Item>,
    ) -> Result<ScanPage> {
        let mut builder = self
            .client
            .scan()
            .table_name(table)
            .consistent_read(request.consistent_read)
            .set_limit(request.page_size)
            .set_exclusive_start_key(exclusive_start_key);

        if let Some(filter) = filter_expression(request) {
            builder = builder
                .filter_expression(filter.expression)
                .set_expression_attribute_names(non_empty(filter.names))
                .set_expression_attribute_values(non_empty(filter.values));
        }

        let output = builder.send().await.map_err(map_scan_error)?;
        Ok(page_from_output(output))
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<()> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(map_put_item_error)?;

        Ok(())
    }

    async fn delete_item(&self, table: &str, key: &Key) -> Result<()> {
        self.client
            .delete_item()
            .table_name(table)
            .set_key(Some(key.to_item()))
            .send()
            .await
            .map_err(map_delete_item_error)?;

        Ok(())
    }
}
