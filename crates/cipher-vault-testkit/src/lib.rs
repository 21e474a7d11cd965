//! # Cipher Vault Testkit
//!
//! Testing utilities for the Cipher Vault.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a controller on a manual clock, named identities, handles
//! - **Fault injection**: an audit store whose appends can be made to fail
//! - **Generators**: proptest strategies for inputs and whole request scripts
//!
//! ## Test Fixtures
//!
//! ```rust
//! use cipher_vault::core::DataType;
//! use cipher_vault_testkit::fixtures::{identity, TestVault};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let tv = TestVault::new();
//! let alice = identity("alice");
//! let entry = tv.create_entry(alice, DataType::Financial, false).await;
//!
//! tv.advance(61);
//! assert_eq!(tv.vault.get_user_reputation(alice).await, 1);
//! # let _ = entry;
//! # }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use cipher_vault_testkit::generators::op_script;
//!
//! proptest! {
//!     #[test]
//!     fn scripts_never_break_bounds(ops in op_script(4, 64)) {
//!         // run each op against a TestVault
//!     }
//! }
//! ```

pub mod faulty;
pub mod fixtures;
pub mod generators;

pub use faulty::FaultyAuditStore;
pub use fixtures::{handle, identity, parties, random_identity, TestVault, START_TIME};
pub use generators::{op_script, OpOutcome, VaultOp};
