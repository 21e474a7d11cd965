//! # Cipher Vault Permissions
//!
//! Per-entry, per-identity access grants with optional expiry.
//!
//! ## Overview
//!
//! A grant gives an identity one of three ordered levels on an entry:
//!
//! - **Read**: see the entry's handle and metadata
//! - **Write**: Read, plus replace the handle and metadata
//! - **Admin**: Write, plus deactivate the entry and manage other grants
//!
//! Owners implicitly hold every level on their entries. Public entries are
//! readable by anyone.
//!
//! ## Expiry
//!
//! A grant issued with a non-zero duration lapses at `granted_at + duration`.
//! A lapsed grant stops authorizing immediately, with no call needed, but it
//! stays stored until it is revoked or purged so the history remains
//! queryable.
//!
//! ## Usage
//!
//! ```rust
//! use cipher_vault_core::{CiphertextHandle, DataType, EntryId, Identity, VaultEntry};
//! use cipher_vault_perms::{PermissionLevel, PermissionRegistry};
//!
//! let owner = Identity::derive("owner");
//! let reader = Identity::derive("reader");
//! let entry = VaultEntry {
//!     id: EntryId(1),
//!     owner,
//!     data_type: DataType::Document,
//!     ciphertext_handle: CiphertextHandle::from_bytes([0; 32]),
//!     is_public: false,
//!     metadata_hash: "QmDoc".into(),
//!     active: true,
//!     created_at: 0,
//!     last_modified: 0,
//! };
//!
//! let mut registry = PermissionRegistry::new();
//! registry.grant(&owner, reader, &entry, PermissionLevel::Read, 60, 0).unwrap();
//! assert!(registry.is_authorized(&reader, &entry, PermissionLevel::Read, 59));
//! assert!(!registry.is_authorized(&reader, &entry, PermissionLevel::Read, 60));
//! ```

pub mod error;
pub mod grant;
pub mod registry;

pub use error::{PermsError, Result};
pub use grant::{PermissionGrant, PermissionLevel};
pub use registry::PermissionRegistry;
