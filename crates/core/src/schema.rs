//! Declarative entity metadata.
//!
//! An entity type describes its table and fields through [`Entity::schema`].
//! The repository derives its key model from this description once, when it
//! is constructed.

use std::fmt;

use serde::{de::DeserializeOwned, Serialize};

use crate::key::{attribute_name_from_accessor, KeyKind};

/// A record type stored as one row per value.
///
/// The serialized attribute names must match the field names declared in
/// the schema.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn schema() -> EntitySchema;
}

/// Declared type of an entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Key(KeyKind),
    /// Any type that cannot be used as a key, named for error messages.
    Other(&'static str),
}

impl AttributeKind {
    pub fn key_kind(self) -> Option<KeyKind> {
        match self {
            Self::Key(kind) => Some(kind),
            Self::Other(_) => None,
        }
    }

    pub fn type_name(self) -> &'static str {
        match self {
            Self::Key(kind) => kind.type_name(),
            Self::Other(name) => name,
        }
    }
}

impl From<KeyKind> for AttributeKind {
    fn from(kind: KeyKind) -> Self {
        Self::Key(kind)
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Marks a field as part of the table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMarker {
    Partition,
    Sort,
}

/// A single field of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    pub attribute: String,
    pub kind: AttributeKind,
    pub marker: Option<KeyMarker>,
}

impl FieldSchema {
    pub fn new(attribute: impl Into<String>, kind: impl Into<AttributeKind>) -> Self {
        Self {
            attribute: attribute.into(),
            kind: kind.into(),
            marker: None,
        }
    }

    /// Declares a field by its accessor name (`getCreatedAt` → `createdAt`).
    pub fn accessor(accessor: &str, kind: impl Into<AttributeKind>) -> Self {
        Self::new(attribute_name_from_accessor(accessor), kind)
    }

    pub fn partition_key(mut self) -> Self {
        self.marker = Some(KeyMarker::Partition);
        self
    }

    pub fn sort_key(mut self) -> Self {
        self.marker = Some(KeyMarker::Sort);
        self
    }
}

/// Table and field metadata of an entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    entity_name: String,
    table_name: Option<String>,
    fields: Vec<FieldSchema>,
}

impl EntitySchema {
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            table_name: None,
            fields: Vec::new(),
        }
    }

    /// Starts a schema named after `E`'s bare type name.
    pub fn of<E: ?Sized>() -> Self {
        Self::new(crate::key::short_type_name::<E>())
    }

    /// Overrides the table name, which otherwise defaults to the entity name.
    pub fn table(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// Explicit table name if declared, else the entity name.
    pub fn table_name(&self) -> &str {
        self.table_name.as_deref().unwrap_or(&self.entity_name)
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn marked(&self, marker: KeyMarker) -> impl Iterator<Item = &FieldSchema> {
        self.fields
            .iter()
            .filter(move |field| field.marker == Some(marker))
    }
}
