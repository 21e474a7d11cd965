//! Actor identities.
//!
//! An identity is a fixed-width opaque token supplied by whatever layer
//! authenticates callers. The core only compares identities; it never
//! authenticates them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Width of an identity in bytes.
pub const IDENTITY_LEN: usize = 20;

/// A 20-byte actor identity, rendered as `0x`-prefixed hex.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identity(pub [u8; IDENTITY_LEN]);

impl Identity {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }

    /// Derive a deterministic identity from a label.
    ///
    /// Handy for fixtures and for mapping external names onto identities.
    pub fn derive(label: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"cipher-vault-identity-v0:");
        hasher.update(label.as_bytes());
        let digest = hasher.finalize();
        let mut arr = [0u8; IDENTITY_LEN];
        arr.copy_from_slice(&digest.as_bytes()[..IDENTITY_LEN]);
        Self(arr)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; IDENTITY_LEN] {
        &self.0
    }

    /// Convert to `0x`-prefixed hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from hex, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)?;
        let arr: [u8; IDENTITY_LEN] = bytes
            .try_into()
            .map_err(|_| CoreError::InvalidLength {
                expected: IDENTITY_LEN,
                what: "identity",
            })?;
        Ok(Self(arr))
    }

    /// The zero identity (sentinel).
    pub const ZERO: Self = Self([0u8; IDENTITY_LEN]);
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", &self.to_hex()[..10])
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Identity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl AsRef<[u8]> for Identity {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; IDENTITY_LEN]> for Identity {
    fn from(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Identity {
    type Error = CoreError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; IDENTITY_LEN] = slice.try_into().map_err(|_| CoreError::InvalidLength {
            expected: IDENTITY_LEN,
            what: "identity",
        })?;
        Ok(Self(arr))
    }
}
