//! # Cipher Vault
//!
//! Access control, reputation and an audit trail for encrypted data
//! entries. The vault never holds plaintext: entries point at ciphertext
//! stored elsewhere, and the vault decides who may see or change that
//! pointer.
//!
//! ## Overview
//!
//! - **Entries**: owned records with a data type, visibility flag, opaque
//!   ciphertext handle and metadata hash. Deactivation is a soft delete.
//! - **Permissions**: per-entry Read/Write/Admin grants with optional expiry
//! - **Reputation**: a bounded score per identity, moved by request outcomes
//! - **Audit**: every mutating request, allowed or denied, writes exactly one
//!   record before it takes effect
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cipher_vault::{AccessController, VaultConfig};
//! use cipher_vault::core::{AuditFilter, CiphertextHandle, Identity};
//! use cipher_vault::store::SqliteAuditStore;
//!
//! async fn example() {
//!     let store = SqliteAuditStore::open("audit.db").unwrap();
//!     let vault = AccessController::new(store, VaultConfig::default());
//!
//!     let alice = Identity::derive("alice");
//!     let bob = Identity::derive("bob");
//!
//!     // Private financial record
//!     let created = vault
//!         .create_vault_entry(alice, 2, CiphertextHandle::from_bytes([7; 32]), false, "QmFin")
//!         .await
//!         .unwrap();
//!
//!     // Read access for a minute
//!     vault.grant_access(alice, bob, created.value, 1, 60).await.unwrap();
//!
//!     let history = vault
//!         .audit_trail(AuditFilter::for_entry(created.value))
//!         .collect_all()
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `cipher_vault::core` - identities, entries, audit records, clocks
//! - `cipher_vault::store` - audit store trait, SQLite and memory backends
//! - `cipher_vault::perms` - permission levels, grants and the registry

pub mod audit;
pub mod config;
pub mod controller;
pub mod entries;
pub mod error;
pub mod events;
mod locks;
pub mod reputation;
pub mod request;
pub mod state;

// Re-export component crates
pub use cipher_vault_core as core;
pub use cipher_vault_perms as perms;
pub use cipher_vault_store as store;

// Re-export main types for convenience
pub use audit::{AuditCursor, AuditLog};
pub use config::{ReputationConfig, VaultConfig};
pub use controller::AccessController;
pub use entries::EntryStore;
pub use error::{Disposition, Result, VaultError};
pub use events::{Committed, Observed, VaultEvent};
pub use reputation::{ActionOutcome, LinearPolicy, ReputationEngine, ReputationPolicy};
pub use request::RequestPhase;
pub use state::{Mutation, VaultState, VaultStats};

// Re-export commonly used core types
pub use cipher_vault_core::{
    Action, AuditFilter, AuditOutcome, AuditRecord, CiphertextHandle, DataType, EntryId,
    EntryView, Identity, LogId, VaultEntry,
};
pub use cipher_vault_perms::{PermissionGrant, PermissionLevel};
