//! Core types for tablerepo.
//!
//! Everything in this crate is pure: the key model that ties an entity type
//! to its partition/sort key declaration, the structured scan conditions, and
//! the contract a table store backend has to fulfil. Backends and the
//! repositories built on top of them live in the `tablerepo` crate.

pub mod key;
pub mod schema;
pub mod storage;

pub use key::{
    attribute_name_from_accessor, to_native_value, Key, KeyAttribute, KeyDescriptor, KeyKind,
    KeyType, KeyValue, NoSortKey,
};
pub use schema::{AttributeKind, Entity, EntitySchema, FieldSchema, KeyMarker};
pub use storage::{
    Comparator, Condition, Expression, Item, RepositoryError, Result, ScanPage, ScanRequest,
    SharedStore, TableStore,
};
