//! Record-or-abort: a failed audit append leaves no trace anywhere.

use cipher_vault::core::DataType;
use cipher_vault::{Disposition, EntryId, PermissionLevel, VaultError};
use cipher_vault_testkit::{handle, identity, TestVault};

#[tokio::test]
async fn failed_append_rolls_back_update() {
    let tv = TestVault::faulty();
    let owner = identity("owner");
    let entry = tv.create_entry(owner, DataType::Document, false).await;
    let before = tv.vault.get_vault_entry_info(owner, entry).await.unwrap().value;

    tv.store.arm();
    let err = tv
        .vault
        .update_vault_entry(owner, entry, handle(0xEE), true, "QmChanged")
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::StorageFault { entry_id, .. } if entry_id == entry));
    assert_eq!(err.disposition(), Disposition::RecheckState);
    tv.store.disarm();

    let after = tv.vault.get_vault_entry_info(owner, entry).await.unwrap().value;
    assert_eq!(before, after);
    assert_eq!(tv.audit_len().await, 1);
    assert_eq!(tv.vault.get_user_reputation(owner).await, 1);
}

#[tokio::test]
async fn failed_append_burns_the_reserved_entry_id() {
    let tv = TestVault::faulty();
    let owner = identity("owner");

    tv.store.arm();
    let err = tv
        .vault
        .create_vault_entry(owner, 1, handle(1), false, "QmDoc")
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::StorageFault { .. }));
    tv.store.disarm();

    let stats = tv.vault.stats().await.unwrap();
    assert_eq!(stats.total_entries, 0);
    assert_eq!(stats.known_identities, 0);

    // Entry 1 was reserved by the failed request and is never handed out.
    let entry = tv.create_entry(owner, DataType::Document, false).await;
    assert_eq!(entry, EntryId(2));
    assert!(matches!(
        tv.vault.get_vault_entry_info(owner, EntryId(1)).await,
        Err(VaultError::EntryNotFound { .. })
    ));
}

#[tokio::test]
async fn failed_append_leaves_grants_untouched() {
    let tv = TestVault::faulty();
    let owner = identity("owner");
    let bob = identity("bob");
    let entry = tv.create_entry(owner, DataType::Media, false).await;
    tv.vault.grant_access(owner, bob, entry, 1, 0).await.unwrap();

    tv.store.arm();
    assert!(tv.vault.revoke_access(owner, bob, entry).await.is_err());
    assert!(tv.vault.grant_access(owner, identity("carol"), entry, 3, 0).await.is_err());
    assert!(tv.vault.deactivate_vault_entry(owner, entry).await.is_err());
    tv.store.disarm();

    assert!(tv.vault.is_authorized(bob, entry, PermissionLevel::Read).await);
    assert!(!tv.vault.is_authorized(identity("carol"), entry, PermissionLevel::Read).await);
    assert!(tv.vault.get_vault_entry_info(owner, entry).await.unwrap().value.is_active());
    assert_eq!(tv.store.rejected(), 3);
    assert_eq!(tv.audit_len().await, 2);
}

#[tokio::test]
async fn failed_denial_record_skips_the_penalty() {
    let tv = TestVault::faulty();
    let owner = identity("owner");
    let mallory = identity("mallory");
    let entry = tv.create_entry(owner, DataType::Personal, false).await;

    // Earn a point first so a penalty would be visible.
    let own = tv.create_entry(mallory, DataType::Personal, false).await;
    assert_ne!(own, entry);
    assert_eq!(tv.vault.get_user_reputation(mallory).await, 1);

    tv.store.arm();
    let err = tv
        .vault
        .update_vault_entry(mallory, entry, handle(3), false, "QmEvil")
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::StorageFault { .. }));
    tv.store.disarm();

    assert_eq!(tv.vault.get_user_reputation(mallory).await, 1);
    assert_eq!(tv.audit_len().await, 2);
}

#[tokio::test]
async fn log_stays_gapless_across_faults() {
    let tv = TestVault::faulty();
    let owner = identity("owner");
    tv.create_entry(owner, DataType::Document, false).await;

    tv.store.arm();
    let _ = tv.vault.create_vault_entry(owner, 1, handle(2), false, "QmLost").await;
    tv.store.disarm();

    let committed = tv
        .vault
        .create_vault_entry(owner, 1, handle(3), false, "QmKept")
        .await
        .unwrap();
    assert_eq!(committed.log_id.get(), 2);
}
