use serde::{Deserialize, Serialize};

use tablerepo_core::{Entity, EntitySchema, FieldSchema, KeyKind};

/// Entity keyed by partition key `id` and sort key `sort`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableWithSort {
    pub id: String,
    pub sort: String,
    pub title: String,
}

impl TableWithSort {
    pub fn new(id: impl Into<String>, sort: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sort: sort.into(),
            title: title.into(),
        }
    }

    /// The rows the demo and the tests start from.
    pub fn samples() -> Vec<Self> {
        vec![
            Self::new("test1", "sort11", "Record Title 1"),
            Self::new("test2", "sort21", "Record Title 2"),
            Self::new("test2", "sort22", "Record Title 3"),
            Self::new("test2", "sort23", "Record Title 4"),
            Self::new("test3", "sort31", "Record Title 5"),
            Self::new("test3", "sort32", "Record Title 6"),
        ]
    }
}

impl Entity for TableWithSort {
    fn schema() -> EntitySchema {
        EntitySchema::of::<Self>()
            .field(FieldSchema::new("id", KeyKind::String).partition_key())
            .field(FieldSchema::new("sort", KeyKind::String).sort_key())
            .field(FieldSchema::new("title", KeyKind::String))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablerepo_core::KeyDescriptor;

    #[test]
    fn test_schema() {
        let descriptor = KeyDescriptor::derive::<String, String>(&TableWithSort::schema()).unwrap();

        assert_eq!(descriptor.table_name(), "TableWithSort");
        assert_eq!(descriptor.partition_key().name, "id");
        assert_eq!(descriptor.sort_key().unwrap().name, "sort");
    }

    #[test]
    fn test_key_of_serialized_entity() {
        let item: tablerepo_core::Item =
            serde_dynamo::to_item(TableWithSort::new("test2", "sort21", "Record Title 2")).unwrap();
        let descriptor = KeyDescriptor::derive::<String, String>(&TableWithSort::schema()).unwrap();

        let key = descriptor.key_of(&item).unwrap();
        assert_eq!(key.to_string(), "id=test2, sort=sort21");
    }
}
