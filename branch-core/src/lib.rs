//! # branch-core
//!
//! Core library for Branch - a reading-first companion that captures idea
//! fragments mid-reading so they can be developed later.
//!
//! This library provides:
//! - Domain types for documents, reading sessions and idea fragments
//! - Database storage layer with SQLite
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Guarantees
//!
//! A captured fragment is never deleted as a side effect. Removing a
//! document deletes its reading sessions, but fragments only lose their
//! document and session references.
//!
//! ## Example
//!
//! ```rust,no_run
//! use branch_core::{Config, Database, Document, IdeaFragment, Repository};
//!
//! let config = Config::load().expect("failed to load config");
//! let db = Database::from_config(&config.storage).expect("failed to open database");
//!
//! let doc = Document::new("Research Paper").with_page_count(100);
//! db.upsert_document(&doc).expect("failed to save document");
//!
//! let fragment = IdeaFragment::new("compare with chapter 3").with_document(doc.id);
//! db.upsert_fragment(&fragment).expect("failed to save fragment");
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::{Database, MemoryRepository, Repository, StorageLocation};
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod types;
