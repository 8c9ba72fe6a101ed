use std::fmt;

use aws_sdk_dynamodb::types::AttributeValue;

use crate::schema::{EntitySchema, FieldSchema, KeyMarker};
use crate::storage::{Item, RepositoryError, Result, ALLOWED_KEY_TYPES};

use super::value::{to_native_value, KeyKind, KeyType, KeyValue};

/// Name and kind of a key attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub kind: KeyKind,
}

/// A row key in the store's attribute encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Key {
    partition: (String, AttributeValue),
    sort: Option<(String, AttributeValue)>,
}

impl Key {
    pub fn partition(name: impl Into<String>, value: AttributeValue) -> Self {
        Self {
            partition: (name.into(), value),
            sort: None,
        }
    }

    pub fn with_sort(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.sort = Some((name.into(), value));
        self
    }

    pub fn partition_name(&self) -> &str {
        &self.partition.0
    }

    pub fn partition_value(&self) -> &AttributeValue {
        &self.partition.1
    }

    pub fn sort_name(&self) -> Option<&str> {
        self.sort.as_ref().map(|(name, _)| name.as_str())
    }

    pub fn sort_value(&self) -> Option<&AttributeValue> {
        self.sort.as_ref().map(|(_, value)| value)
    }

    /// The key as an attribute map, as used in get/delete requests.
    pub fn to_item(&self) -> Item {
        let mut item = Item::new();
        item.insert(self.partition.0.clone(), self.partition.1.clone());
        if let Some((name, value)) = &self.sort {
            item.insert(name.clone(), value.clone());
        }
        item
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, value) = &self.partition;
        write!(f, "{name}={}", display_attribute(value))?;
        if let Some((name, value)) = &self.sort {
            write!(f, ", {name}={}", display_attribute(value))?;
        }
        Ok(())
    }
}

fn display_attribute(value: &AttributeValue) -> String {
    match value {
        AttributeValue::S(s) | AttributeValue::N(s) => s.clone(),
        AttributeValue::Bool(b) => b.to_string(),
        other => format!("{other:?}"),
    }
}

/// Key layout of one entity type, derived once per repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDescriptor {
    entity_name: String,
    table_name: String,
    partition: KeyAttribute,
    sort: Option<KeyAttribute>,
}

impl KeyDescriptor {
    /// Derives the key layout of `schema` and checks it against the
    /// repository's declared key types `P` and `S`.
    ///
    /// `S = NoSortKey` declares a table without sort key; a sort-key field
    /// in such an entity is rejected.
    pub fn derive<P: KeyType, S: KeyType>(schema: &EntitySchema) -> Result<Self> {
        let entity = schema.entity_name();
        let partition = derive_partition::<P>(schema)?;
        let sort = derive_sort::<S>(schema)?;

        if let Some(sort) = &sort {
            if sort.name == partition.name {
                return Err(RepositoryError::configuration(
                    format!("Partition key and sort key of {entity} both map to '{}'.", sort.name),
                    "Mark two distinct fields as partition key and sort key.",
                ));
            }
        }

        Ok(Self {
            entity_name: entity.to_string(),
            table_name: schema.table_name().to_string(),
            partition,
            sort,
        })
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn partition_key(&self) -> &KeyAttribute {
        &self.partition
    }

    pub fn sort_key(&self) -> Option<&KeyAttribute> {
        self.sort.as_ref()
    }

    pub fn has_sort_key(&self) -> bool {
        self.sort.is_some()
    }

    /// Key of a row identified by partition key only.
    pub fn build_key<P: KeyType>(&self, partition: &P) -> Result<Key> {
        Ok(Key::partition(&self.partition.name, to_native_value(partition)?))
    }

    /// Key of a row identified by partition and sort key.
    pub fn build_composite_key<P: KeyType, S: KeyType>(
        &self,
        partition: &P,
        sort: &S,
    ) -> Result<Key> {
        let sort_name = self
            .sort
            .as_ref()
            .map(|attribute| attribute.name.as_str())
            .ok_or_else(|| {
                RepositoryError::InvalidData(format!(
                    "{} has no sort key to build a composite key with",
                    self.entity_name
                ))
            })?;
        Ok(self
            .build_key(partition)?
            .with_sort(sort_name, to_native_value(sort)?))
    }

    /// Takes the key attributes out of a serialized entity.
    pub fn key_of(&self, item: &Item) -> Result<Key> {
        let partition = self.key_attribute(item, &self.partition)?;
        let key = Key::partition(&self.partition.name, partition);
        match &self.sort {
            Some(sort) => {
                let value = self.key_attribute(item, sort)?;
                Ok(key.with_sort(&sort.name, value))
            }
            None => Ok(key),
        }
    }

    fn key_attribute(&self, item: &Item, attribute: &KeyAttribute) -> Result<AttributeValue> {
        let value = item.get(&attribute.name).ok_or_else(|| {
            RepositoryError::InvalidData(format!(
                "{} is missing key attribute '{}'",
                self.entity_name, attribute.name
            ))
        })?;
        KeyValue::from_attribute(value, attribute.kind)?;
        Ok(value.clone())
    }
}

fn single_marked(schema: &EntitySchema, marker: KeyMarker) -> Result<Option<&FieldSchema>> {
    let mut marked = schema.marked(marker);
    let first = marked.next();
    if let Some(second) = marked.next() {
        return Err(RepositoryError::configuration(
            format!(
                "{} declares more than one {} key field ('{}' and '{}').",
                schema.entity_name(),
                marker_label(marker),
                first.map(|f| f.attribute.as_str()).unwrap_or_default(),
                second.attribute
            ),
            format!("Mark exactly one field as the {} key.", marker_label(marker)),
        ));
    }
    Ok(first)
}

fn marker_label(marker: KeyMarker) -> &'static str {
    match marker {
        KeyMarker::Partition => "partition",
        KeyMarker::Sort => "sort",
    }
}

fn derive_partition<P: KeyType>(schema: &EntitySchema) -> Result<KeyAttribute> {
    let field = single_marked(schema, KeyMarker::Partition)?.ok_or_else(|| {
        RepositoryError::configuration(
            format!(
                "Partition key is not defined in the entity {}.",
                schema.entity_name()
            ),
            "Mark the field holding the partition key with FieldSchema::partition_key().",
        )
    })?;

    let Some(declared) = P::KIND else {
        return Err(RepositoryError::configuration(
            format!(
                "Incorrect type {} used as repository partition key.",
                P::type_name()
            ),
            format!("Please supply one from the allowed partition key types:\n{ALLOWED_KEY_TYPES}"),
        ));
    };

    if field.kind.key_kind() != Some(declared) {
        return Err(RepositoryError::configuration(
            format!(
                "Partition key type mismatch between the entity and the repository.\n\
                 Partition Key Type (In Entity): {}\n\
                 Partition Key Type (In Repo): {}",
                field.kind,
                P::type_name()
            ),
            format!(
                "Make sure both types match and are one of the following types:\n{ALLOWED_KEY_TYPES}"
            ),
        ));
    }

    Ok(KeyAttribute {
        name: field.attribute.clone(),
        kind: declared,
    })
}

fn derive_sort<S: KeyType>(schema: &EntitySchema) -> Result<Option<KeyAttribute>> {
    let field = single_marked(schema, KeyMarker::Sort)?;

    let Some(declared) = S::KIND else {
        return match field {
            Some(field) => Err(RepositoryError::configuration(
                format!(
                    "Sort key field '{}' is declared in the entity {} but the repository has no sort key.",
                    field.attribute,
                    schema.entity_name()
                ),
                format!(
                    "Either remove the sort key marker from the entity or declare the repository \
                     sort key type as one of:\n{ALLOWED_KEY_TYPES}"
                ),
            )),
            None => Ok(None),
        };
    };

    let field = field.ok_or_else(|| {
        RepositoryError::configuration(
            format!("Sort key is not defined in the entity {}.", schema.entity_name()),
            "Mark the field holding the sort key with FieldSchema::sort_key().\n\n\
             If the table has no sort key, declare the repository sort key type as NoSortKey \
             and leave the entity without a sort key field.",
        )
    })?;

    if field.kind.key_kind() != Some(declared) {
        return Err(RepositoryError::configuration(
            format!(
                "Sort key type mismatch between the entity and the repository.\n\
                 Sort Key Type (In Entity): {}\n\
                 Sort Key Type (In Repo): {}",
                field.kind,
                S::type_name()
            ),
            format!(
                "Make sure both types match and are one of the following types:\n{ALLOWED_KEY_TYPES}"
            ),
        ));
    }

    Ok(Some(KeyAttribute {
        name: field.attribute.clone(),
        kind: declared,
    }))
}
