//! DynamoDB storage backend implementation.
//!
//! This module provides a DynamoDB-based implementation of the `TableStore`
//! trait using `aws-sdk-dynamodb`, plus client construction from a
//! [`StoreConfig`](crate::config::StoreConfig).

mod client;
mod error;
mod store;

pub use client::create_client;
pub use store::DynamoDbStore;
