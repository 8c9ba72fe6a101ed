//! Table binding: the physical table an entity type is stored in.

use std::collections::HashSet;

use serde_dynamo::{from_item, to_item};
use tracing::debug;

use tablerepo_core::{
    Entity, EntitySchema, Item, Key, RepositoryError, Result, ScanRequest, SharedStore,
};

const MIN_TABLE_NAME_LEN: usize = 3;
const MAX_TABLE_NAME_LEN: usize = 255;

/// Handle to one table of a shared store.
#[derive(Clone)]
pub struct Table {
    name: String,
    store: SharedStore,
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table").field("name", &self.name).finish()
    }
}

impl Table {
    /// Opens `table_name` for entities described by `schema`.
    ///
    /// Fails with a configuration error when the schema is malformed or
    /// the table name is not a valid store table name. The store itself is
    /// not contacted.
    pub fn open(store: SharedStore, schema: &EntitySchema, table_name: &str) -> Result<Self> {
        validate_schema(schema)?;
        validate_table_name(schema, table_name)?;

        Ok(Self {
            name: table_name.to_string(),
            store,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn get_item(&self, key: &Key, consistent_read: bool) -> Result<Option<Item>> {
        debug!(table = %self.name, %key, consistent_read, "Getting item");
        self.store.get_item(&self.name, key, consistent_read).await
    }

    /// Scans the whole table, following pagination until the store reports
    /// no more pages or `max_items` matching rows have been collected.
    pub async fn scan_all(&self, request: &ScanRequest) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        let mut start_key = None;
        let mut pages = 0usize;

        loop {
            let page = self.store.scan(&self.name, request, start_key).await?;
            pages += 1;
            items.extend(page.items);

            if let Some(max_items) = request.max_items {
                if items.len() >= max_items {
                    items.truncate(max_items);
                    break;
                }
            }

            match page.last_evaluated_key {
                Some(key) => start_key = Some(key),
                None => break,
            }
        }

        debug!(
            table = %self.name,
            pages,
            count = items.len(),
            consistent_read = request.consistent_read,
            "Scanned table"
        );
        Ok(items)
    }

    pub async fn put_item(&self, item: Item) -> Result<()> {
        debug!(table = %self.name, "Putting item");
        self.store.put_item(&self.name, item).await
    }

    pub async fn delete_item(&self, key: &Key) -> Result<()> {
        debug!(table = %self.name, %key, "Deleting item");
        self.store.delete_item(&self.name, key).await
    }
}

/// Serializes an entity into a store item.
pub(crate) fn entity_to_item<E: Entity>(entity: &E) -> Result<Item> {
    to_item::<_, Item>(entity).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

/// Deserializes a store item into an entity.
pub(crate) fn item_to_entity<E: Entity>(item: Item) -> Result<E> {
    from_item(item).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

fn validate_schema(schema: &EntitySchema) -> Result<()> {
    let entity = schema.entity_name();
    if schema.fields().is_empty() {
        return Err(RepositoryError::configuration(
            format!("Entity {entity} declares no attributes."),
            "Declare the entity's attributes in its schema.",
        ));
    }

    let mut seen = HashSet::new();
    for field in schema.fields() {
        if field.attribute.trim().is_empty() {
            return Err(RepositoryError::configuration(
                format!("Entity {entity} declares an attribute with an empty name."),
                "Give every attribute of the entity a name.",
            ));
        }
        if !seen.insert(field.attribute.as_str()) {
            return Err(RepositoryError::configuration(
                format!(
                    "Entity {entity} declares the attribute '{}' more than once.",
                    field.attribute
                ),
                "Map every field of the entity to a distinct attribute name.",
            ));
        }
    }
    Ok(())
}

fn validate_table_name(schema: &EntitySchema, table_name: &str) -> Result<()> {
    let valid_length = (MIN_TABLE_NAME_LEN..=MAX_TABLE_NAME_LEN).contains(&table_name.len());
    let valid_chars = table_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

    if valid_length && valid_chars {
        return Ok(());
    }
    Err(RepositoryError::configuration(
        format!(
            "Table name '{table_name}' resolved for entity {} is not a valid table name.",
            schema.entity_name()
        ),
        format!(
            "Use a table name of {MIN_TABLE_NAME_LEN} to {MAX_TABLE_NAME_LEN} characters \
             made of letters, digits, '_', '-' and '.'."
        ),
    ))
}
