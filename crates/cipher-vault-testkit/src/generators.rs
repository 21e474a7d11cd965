//! Proptest generators for property-based testing.

use proptest::prelude::*;

use cipher_vault::{Committed, VaultError};
use cipher_vault_core::{CiphertextHandle, DataType, EntryId, Identity};
use cipher_vault_perms::PermissionLevel;
use cipher_vault_store::AuditStore;

use crate::fixtures::{parties, TestVault};

/// Generate a random identity.
pub fn identity() -> impl Strategy<Value = Identity> {
    any::<[u8; 20]>().prop_map(Identity::from_bytes)
}

/// Generate a random ciphertext handle.
pub fn ciphertext_handle() -> impl Strategy<Value = CiphertextHandle> {
    any::<[u8; 32]>().prop_map(CiphertextHandle::from_bytes)
}

/// Generate a valid data type.
pub fn data_type() -> impl Strategy<Value = DataType> {
    prop::sample::select(DataType::ALL.to_vec())
}

/// Generate a valid permission level.
pub fn permission_level() -> impl Strategy<Value = PermissionLevel> {
    prop::sample::select(PermissionLevel::ALL.to_vec())
}

/// Data type codes, mostly valid, sometimes not.
pub fn data_type_code() -> impl Strategy<Value = u8> {
    prop_oneof![8 => 1u8..=4, 1 => Just(0u8), 1 => 5u8..=255]
}

/// Permission level codes, mostly valid, sometimes not.
pub fn level_code() -> impl Strategy<Value = u8> {
    prop_oneof![8 => 1u8..=3, 1 => Just(0u8), 1 => 4u8..=255]
}

/// Content-address shaped metadata hash.
pub fn metadata_hash() -> impl Strategy<Value = String> {
    "Qm[1-9A-HJ-NP-Za-km-z]{44}".prop_map(String::from)
}

/// Metadata hashes including ones validation must reject.
pub fn any_metadata_hash() -> impl Strategy<Value = String> {
    prop_oneof![
        8 => metadata_hash(),
        1 => Just(String::new()),
        1 => Just("   ".to_string()),
    ]
}

/// Grant durations, with zero (no expiry) well represented.
pub fn duration() -> impl Strategy<Value = u64> {
    prop_oneof![Just(0u64), 1u64..=600]
}

/// One request against a vault, addressed by actor index and entry number.
#[derive(Debug, Clone)]
pub enum VaultOp {
    Create {
        actor: usize,
        data_type: u8,
        is_public: bool,
        metadata_hash: String,
    },
    Update {
        actor: usize,
        entry: u64,
        is_public: bool,
        metadata_hash: String,
    },
    Deactivate {
        actor: usize,
        entry: u64,
    },
    Grant {
        actor: usize,
        grantee: usize,
        entry: u64,
        level: u8,
        duration: u64,
    },
    Revoke {
        actor: usize,
        grantee: usize,
        entry: u64,
    },
    Read {
        actor: usize,
        entry: u64,
    },
    Advance(u64),
}

/// What running a [`VaultOp`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpOutcome {
    /// Applied and audited.
    Committed,
    /// Refused and audited.
    Denied,
    /// Refused before reaching the audit log.
    Rejected,
    /// Succeeded without an audit record (plain reads, clock moves).
    Unrecorded,
}

impl OpOutcome {
    /// Whether the op added exactly one audit record.
    pub fn is_audited(self) -> bool {
        matches!(self, OpOutcome::Committed | OpOutcome::Denied)
    }
}

fn vault_op(actors: usize, max_entry: u64) -> BoxedStrategy<VaultOp> {
    let actor = 0..actors;
    let entry = 1..=max_entry;
    prop_oneof![
        3 => (actor.clone(), data_type_code(), any::<bool>(), any_metadata_hash()).prop_map(
            |(actor, data_type, is_public, metadata_hash)| VaultOp::Create {
                actor,
                data_type,
                is_public,
                metadata_hash,
            }
        ),
        2 => (actor.clone(), entry.clone(), any::<bool>(), any_metadata_hash()).prop_map(
            |(actor, entry, is_public, metadata_hash)| VaultOp::Update {
                actor,
                entry,
                is_public,
                metadata_hash,
            }
        ),
        1 => (actor.clone(), entry.clone())
            .prop_map(|(actor, entry)| VaultOp::Deactivate { actor, entry }),
        3 => (actor.clone(), actor.clone(), entry.clone(), level_code(), duration()).prop_map(
            |(actor, grantee, entry, level, duration)| VaultOp::Grant {
                actor,
                grantee,
                entry,
                level,
                duration,
            }
        ),
        1 => (actor.clone(), actor.clone(), entry.clone())
            .prop_map(|(actor, grantee, entry)| VaultOp::Revoke { actor, grantee, entry }),
        2 => (actor, entry).prop_map(|(actor, entry)| VaultOp::Read { actor, entry }),
        1 => (1u64..=120).prop_map(VaultOp::Advance),
    ]
    .boxed()
}

/// A script of up to `max_len` ops among `actors` identities.
pub fn op_script(actors: usize, max_len: usize) -> impl Strategy<Value = Vec<VaultOp>> {
    let actors = actors.max(1);
    prop::collection::vec(vault_op(actors, 1 + max_len as u64 / 3), 0..=max_len)
}

fn classify<T>(result: Result<Committed<T>, VaultError>) -> OpOutcome {
    match result {
        Ok(_) => OpOutcome::Committed,
        Err(VaultError::Unauthorized { log_id: Some(_), .. }) => OpOutcome::Denied,
        Err(_) => OpOutcome::Rejected,
    }
}

impl VaultOp {
    /// Run this op. Actor indexes pick from [`parties`]`(actors)`.
    pub async fn apply<S: AuditStore + 'static>(&self, tv: &TestVault<S>, actors: usize) -> OpOutcome {
        let who = parties(actors.max(1));
        let at = |i: usize| who[i % who.len()];
        let vault = &tv.vault;

        match self {
            VaultOp::Create {
                actor,
                data_type,
                is_public,
                metadata_hash,
            } => classify(
                vault
                    .create_vault_entry(
                        at(*actor),
                        *data_type,
                        CiphertextHandle::from_bytes([*data_type; 32]),
                        *is_public,
                        metadata_hash.clone(),
                    )
                    .await,
            ),
            VaultOp::Update {
                actor,
                entry,
                is_public,
                metadata_hash,
            } => classify(
                vault
                    .update_vault_entry(
                        at(*actor),
                        EntryId(*entry),
                        CiphertextHandle::from_bytes([0xAB; 32]),
                        *is_public,
                        metadata_hash.clone(),
                    )
                    .await,
            ),
            VaultOp::Deactivate { actor, entry } => {
                classify(vault.deactivate_vault_entry(at(*actor), EntryId(*entry)).await)
            }
            VaultOp::Grant {
                actor,
                grantee,
                entry,
                level,
                duration,
            } => classify(
                vault
                    .grant_access(at(*actor), at(*grantee), EntryId(*entry), *level, *duration)
                    .await,
            ),
            VaultOp::Revoke {
                actor,
                grantee,
                entry,
            } => classify(
                vault
                    .revoke_access(at(*actor), at(*grantee), EntryId(*entry))
                    .await,
            ),
            VaultOp::Read { actor, entry } => {
                match vault.get_vault_entry_info(at(*actor), EntryId(*entry)).await {
                    Ok(read) if read.log_id.is_some() => OpOutcome::Committed,
                    Ok(_) => OpOutcome::Unrecorded,
                    Err(err) => classify::<()>(Err(err)),
                }
            }
            VaultOp::Advance(secs) => {
                tv.advance(*secs);
                OpOutcome::Unrecorded
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cipher_vault_core::validate_metadata_hash;

    proptest! {
        #[test]
        fn test_metadata_hashes_validate(hash in metadata_hash()) {
            prop_assert!(validate_metadata_hash(&hash).is_ok());
        }

        #[test]
        fn test_valid_codes_round_trip(dt in data_type(), level in permission_level()) {
            prop_assert_eq!(DataType::try_from(dt.as_u8()).unwrap(), dt);
            prop_assert_eq!(PermissionLevel::try_from(level.as_u8()).unwrap(), level);
        }

        #[test]
        fn test_scripts_respect_bounds(ops in op_script(3, 20)) {
            prop_assert!(ops.len() <= 20);
            for op in ops {
                match op {
                    VaultOp::Create { actor, .. }
                    | VaultOp::Update { actor, .. }
                    | VaultOp::Deactivate { actor, .. }
                    | VaultOp::Read { actor, .. } => prop_assert!(actor < 3),
                    VaultOp::Grant { actor, grantee, .. } | VaultOp::Revoke { actor, grantee, .. } => {
                        prop_assert!(actor < 3 && grantee < 3);
                    }
                    VaultOp::Advance(secs) => prop_assert!(secs >= 1),
                }
            }
        }
    }
}
