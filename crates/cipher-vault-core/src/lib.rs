//! # Cipher Vault Core
//!
//! Pure primitives for the Cipher Vault: identities, vault entries, audit
//! records and clocks.
//!
//! This crate contains no I/O, no storage, no locking. It is plain data plus
//! the validation rules that every other crate relies on.
//!
//! ## Key Types
//!
//! - [`Identity`] - Fixed-width opaque actor token (account-address shaped)
//! - [`EntryId`] - Sequential vault entry identifier, never reused
//! - [`LogId`] - Gapless audit log identifier
//! - [`VaultEntry`] - An entry record pointing at an external ciphertext
//! - [`CiphertextHandle`] - Opaque reference to an encrypted payload
//! - [`AuditRecord`] - One immutable line of the audit trail
//! - [`Clock`] - Source of "now" in seconds since the Unix epoch
//!
//! ## Ciphertext
//!
//! The vault never sees plaintext or ciphertext bytes. A [`CiphertextHandle`]
//! is compared and stored, never dereferenced.

pub mod audit;
pub mod clock;
pub mod entry;
pub mod error;
pub mod identity;
pub mod types;
pub mod validation;

pub use audit::{Action, AuditFilter, AuditOutcome, AuditRecord, NewAuditRecord};
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CiphertextHandle, DataType, EntryView, VaultEntry};
pub use error::{CoreError, ValidationError};
pub use identity::Identity;
pub use types::{EntryId, LogId, Timestamp};
pub use validation::{validate_data_type, validate_metadata_hash};
