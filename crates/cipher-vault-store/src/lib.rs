//! # Cipher Vault Store
//!
//! Storage abstraction for the vault's audit trail. Provides a trait-based
//! interface with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The audit trail is the one piece of vault state whose loss is fatal: a
//! request may only take effect once its audit record is durably written.
//! [`AuditStore`] hides where that record goes.
//!
//! ## Key Types
//!
//! - [`AuditStore`] - The async trait for audit persistence
//! - [`SqliteAuditStore`] - SQLite-based persistent storage
//! - [`MemoryAuditStore`] - In-memory storage for tests and ephemeral vaults
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cipher_vault_store::{AuditStore, SqliteAuditStore};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteAuditStore::open("audit.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteAuditStore::open_memory().unwrap();
//!
//!     let total = store.len().await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Gapless ids**: the store assigns log ids; the n-th record has id n
//! - **All or nothing**: a failed append writes nothing
//! - **Append-only**: SQLite triggers reject updates and deletes

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryAuditStore;
pub use sqlite::SqliteAuditStore;
pub use traits::AuditStore;
