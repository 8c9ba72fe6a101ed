use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;

use super::Condition;

/// A single row in its store-native attribute encoding.
pub type Item = HashMap<String, AttributeValue>;

/// Parameters of a table scan.
///
/// Built fluently and handed to the store one page at a time. `page_size`
/// is the number of rows the store evaluates per request (before the filter
/// is applied), `max_items` caps the number of matching rows returned across
/// all pages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanRequest {
    pub consistent_read: bool,
    pub page_size: Option<i32>,
    pub max_items: Option<usize>,
    pub filter: Option<Condition>,
}

impl ScanRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consistent_read(mut self, consistent_read: bool) -> Self {
        self.consistent_read = consistent_read;
        self
    }

    pub fn page_size(mut self, page_size: i32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    pub fn filter(mut self, filter: Condition) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// One page of scan results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPage {
    pub items: Vec<Item>,
    /// Key of the last evaluated row; `None` once the table is exhausted.
    pub last_evaluated_key: Option<Item>,
}
