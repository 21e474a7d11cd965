//! Vault entries.
//!
//! An entry is the vault's record of one externally stored encrypted payload:
//! who owns it, what kind of data it holds, and whether it is still live.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, ValidationError};
use crate::identity::Identity;
use crate::types::{EntryId, Timestamp};

/// Category of the data an entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DataType {
    Document = 1,
    Financial = 2,
    Media = 3,
    Personal = 4,
}

impl DataType {
    /// Every data type, in code order.
    pub const ALL: [DataType; 4] = [
        DataType::Document,
        DataType::Financial,
        DataType::Media,
        DataType::Personal,
    ];

    /// Convert from the wire code.
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            1 => Some(DataType::Document),
            2 => Some(DataType::Financial),
            3 => Some(DataType::Media),
            4 => Some(DataType::Personal),
            _ => None,
        }
    }

    /// The wire code.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for DataType {
    type Error = ValidationError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_u8(code).ok_or(ValidationError::InvalidDataType(code))
    }
}

/// Width of a ciphertext handle in bytes.
pub const HANDLE_LEN: usize = 32;

/// Opaque reference to an encrypted payload held outside the vault.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CiphertextHandle(pub [u8; HANDLE_LEN]);

impl CiphertextHandle {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; HANDLE_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; HANDLE_LEN] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))?;
        let arr: [u8; HANDLE_LEN] = bytes.try_into().map_err(|_| CoreError::InvalidLength {
            expected: HANDLE_LEN,
            what: "ciphertext handle",
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CiphertextHandle({})", &self.to_hex()[..16])
    }
}

impl From<[u8; HANDLE_LEN]> for CiphertextHandle {
    fn from(bytes: [u8; HANDLE_LEN]) -> Self {
        Self(bytes)
    }
}

/// A vault entry record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultEntry {
    /// Sequential identifier.
    pub id: EntryId,

    /// Creator of the entry. Never changes.
    pub owner: Identity,

    /// What kind of data the ciphertext holds.
    pub data_type: DataType,

    /// Where the encrypted payload lives.
    pub ciphertext_handle: CiphertextHandle,

    /// Public entries are readable without a grant.
    pub is_public: bool,

    /// Content-addressed pointer to off-vault metadata.
    pub metadata_hash: String,

    /// False once the entry has been deactivated.
    pub active: bool,

    pub created_at: Timestamp,
    pub last_modified: Timestamp,
}

impl VaultEntry {
    /// Check whether `actor` owns this entry.
    pub fn is_owned_by(&self, actor: &Identity) -> bool {
        &self.owner == actor
    }

    /// The view handed to readers: full for live entries, a tombstone otherwise.
    pub fn view(&self) -> EntryView {
        if self.active {
            EntryView::Live(self.clone())
        } else {
            EntryView::Tombstone {
                id: self.id,
                owner: self.owner,
                last_modified: self.last_modified,
            }
        }
    }
}

/// What a reader gets back for an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryView {
    /// A live entry with every field.
    Live(VaultEntry),

    /// A deactivated entry. The payload handle and metadata are withheld.
    Tombstone {
        id: EntryId,
        owner: Identity,
        last_modified: Timestamp,
    },
}

impl EntryView {
    /// Entry id regardless of liveness.
    pub fn id(&self) -> EntryId {
        match self {
            EntryView::Live(entry) => entry.id,
            EntryView::Tombstone { id, .. } => *id,
        }
    }

    /// Owner regardless of liveness.
    pub fn owner(&self) -> Identity {
        match self {
            EntryView::Live(entry) => entry.owner,
            EntryView::Tombstone { owner, .. } => *owner,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, EntryView::Live(_))
    }

    /// The full entry, if live.
    pub fn as_live(&self) -> Option<&VaultEntry> {
        match self {
            EntryView::Live(entry) => Some(entry),
            EntryView::Tombstone { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(active: bool) -> VaultEntry {
        VaultEntry {
            id: EntryId(4),
            owner: Identity::derive("owner"),
            data_type: DataType::Media,
            ciphertext_handle: CiphertextHandle::from_bytes([9; HANDLE_LEN]),
            is_public: false,
            metadata_hash: "bafyexample".into(),
            active,
            created_at: 10,
            last_modified: 20,
        }
    }

    #[test]
    fn test_data_type_codes() {
        for dt in DataType::ALL {
            assert_eq!(DataType::try_from(dt.as_u8()).unwrap(), dt);
        }
        assert_eq!(
            DataType::try_from(0),
            Err(ValidationError::InvalidDataType(0))
        );
        assert_eq!(
            DataType::try_from(5),
            Err(ValidationError::InvalidDataType(5))
        );
    }

    #[test]
    fn test_tombstone_hides_payload() {
        let view = sample(false).view();
        assert!(!view.is_active());
        assert!(view.as_live().is_none());
        assert_eq!(view.id(), EntryId(4));
        assert_eq!(view.owner(), Identity::derive("owner"));
    }

    #[test]
    fn test_live_view_is_full_entry() {
        let entry = sample(true);
        assert_eq!(entry.view(), EntryView::Live(entry.clone()));
    }

    #[test]
    fn test_handle_hex_roundtrip() {
        let handle = CiphertextHandle::from_bytes([0x5a; HANDLE_LEN]);
        assert_eq!(CiphertextHandle::from_hex(&handle.to_hex()).unwrap(), handle);
        assert!(CiphertextHandle::from_hex("00ff").is_err());
    }

    #[test]
    fn test_entry_json() {
        let entry = sample(true);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["data_type"], "Media");
        assert_eq!(json["id"], 4);
        let back: VaultEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }
}
