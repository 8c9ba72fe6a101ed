use serde::{Deserialize, Serialize};

use tablerepo_core::{Entity, EntitySchema, FieldSchema, KeyKind};

/// Entity stored in table `Test`, keyed by partition key `id` only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableWithPartition {
    pub id: String,
    pub test: String,
}

impl TableWithPartition {
    pub fn new(id: impl Into<String>, test: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            test: test.into(),
        }
    }

    /// The rows the demo and the tests start from.
    pub fn samples() -> Vec<Self> {
        ["test1", "test2", "test3"]
            .into_iter()
            .map(|id| Self::new(id, "some value goes here"))
            .collect()
    }
}

impl Entity for TableWithPartition {
    fn schema() -> EntitySchema {
        EntitySchema::of::<Self>()
            .table("Test")
            .field(FieldSchema::accessor("getId", KeyKind::String).partition_key())
            .field(FieldSchema::accessor("getTest", KeyKind::String))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablerepo_core::{KeyDescriptor, NoSortKey};

    #[test]
    fn test_schema() {
        let descriptor =
            KeyDescriptor::derive::<String, NoSortKey>(&TableWithPartition::schema()).unwrap();

        assert_eq!(descriptor.entity_name(), "TableWithPartition");
        assert_eq!(descriptor.table_name(), "Test");
        assert_eq!(descriptor.partition_key().name, "id");
        assert!(!descriptor.has_sort_key());
    }

    #[test]
    fn test_serialized_attributes_match_schema() {
        let value = serde_json::to_value(TableWithPartition::new("test1", "x")).unwrap();
        let object = value.as_object().unwrap();

        for field in TableWithPartition::schema().fields() {
            assert!(object.contains_key(&field.attribute), "{}", field.attribute);
        }
    }
}
