//! Typed repositories over partition/sort key table stores.
//!
//! The key model, entity schemas and the store trait live in
//! [`tablerepo_core`] and are re-exported here. This crate adds the
//! repositories, the store backends and the startup configuration.

pub mod config;
pub mod diagnostics;
pub mod models;
pub mod repository;
pub mod storage;

pub use tablerepo_core::*;
