//! Entities used by the demo binary and the repository tests.

mod table_with_partition;
mod table_with_sort;

pub use table_with_partition::TableWithPartition;
pub use table_with_sort::TableWithSort;
