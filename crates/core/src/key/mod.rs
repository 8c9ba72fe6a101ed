//! Key model.
//!
//! Derives and validates the partition/sort key declaration of an entity
//! and converts typed key values into the store's attribute encoding.

mod descriptor;
mod naming;
mod value;

pub use descriptor::{Key, KeyAttribute, KeyDescriptor};
pub use naming::attribute_name_from_accessor;
pub use value::{to_native_value, KeyKind, KeyType, KeyValue, NoSortKey};

pub(crate) use value::short_type_name;
