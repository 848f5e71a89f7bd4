//! Database layer for Branch
//!
//! This module provides the storage layer with:
//! - Connection setup with foreign key enforcement
//! - Idempotent schema application, versioned via `user_version`
//! - The [`Repository`] contract with SQLite and in-memory backends

pub mod connection;
pub mod memory;
pub mod repo;
pub mod schema;

pub use connection::{connect, initialize, initialize_from_config, StorageLocation};
pub use memory::MemoryRepository;
pub use repo::{Database, Repository};
pub use schema::{apply_schema, current_schema_objects, SchemaObjects, SCHEMA_VERSION};
