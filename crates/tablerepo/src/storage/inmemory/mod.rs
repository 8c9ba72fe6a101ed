//! In-memory storage backend for testing.
//!
//! This module provides an in-memory implementation of the `TableStore`
//! trait that keeps every table in a `BTreeMap` wrapped in `Arc<RwLock<_>>`.
//! Tables must be created with their key attribute names before use, the
//! same way a real table exists before a repository is bound to it.
//!
//! # Example
//!
//! ```rust,ignore
//! use tablerepo::storage::InMemoryStore;
//!
//! let store = InMemoryStore::new();
//! store.create_table("Test", "id", None).await;
//! ```

mod store;

pub use store::InMemoryStore;
