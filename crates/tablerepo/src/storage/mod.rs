//! Table store backends.
//!
//! This module provides concrete implementations of the `TableStore` trait
//! defined in `tablerepo_core::storage`. The backends are selected at
//! compile time via feature flags.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): in-process store, used by the tests and the demo
//! - `dynamodb`: AWS DynamoDB backend using `aws-sdk-dynamodb`
//!
//! Both backends can be compiled in at the same time.
//!
//! # Examples
//!
//! Build with DynamoDB:
//! ```bash
//! cargo build -p tablerepo --features dynamodb
//! ```

#[cfg(not(any(feature = "inmemory", feature = "dynamodb")))]
compile_error!(
    "No storage backend selected. Enable 'inmemory' or 'dynamodb' feature. \
    Example: cargo build -p tablerepo --features dynamodb"
);

#[cfg(feature = "inmemory")]
pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryStore;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbStore;
