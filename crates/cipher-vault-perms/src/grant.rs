//! Permission levels and grants.
//!
//! A grant gives one identity a capability tier on one entry, optionally
//! until a deadline.

use serde::{Deserialize, Serialize};

use cipher_vault_core::{EntryId, Identity, Timestamp, ValidationError};

/// Ordered capability tier. Each level implies the ones below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PermissionLevel {
    Read = 1,
    Write = 2,
    Admin = 3,
}

impl PermissionLevel {
    pub const ALL: [PermissionLevel; 3] = [
        PermissionLevel::Read,
        PermissionLevel::Write,
        PermissionLevel::Admin,
    ];

    /// The wire code.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// The bit this level occupies in a permission mask.
    pub fn mask_bit(self) -> u32 {
        1 << (self.as_u8() - 1)
    }

    /// Check whether holding `self` satisfies a `required` level.
    pub fn satisfies(self, required: PermissionLevel) -> bool {
        self >= required
    }
}

impl TryFrom<u8> for PermissionLevel {
    type Error = ValidationError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(PermissionLevel::Read),
            2 => Ok(PermissionLevel::Write),
            3 => Ok(PermissionLevel::Admin),
            other => Err(ValidationError::InvalidPermissionLevel(other)),
        }
    }
}

/// A stored grant, keyed by (entry, grantee).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub entry_id: EntryId,
    pub grantee: Identity,
    pub level: PermissionLevel,
    pub granted_by: Identity,
    pub granted_at: Timestamp,

    /// Exclusive deadline. `None` means the grant never lapses.
    pub expires_at: Option<Timestamp>,
}

impl PermissionGrant {
    /// Build a grant issued at `now` lasting `duration` seconds.
    ///
    /// A zero duration means no expiry, as does a deadline past the end of
    /// the clock, so `expires_at` is always strictly after `granted_at` when
    /// present.
    pub fn issue(
        entry_id: EntryId,
        grantee: Identity,
        level: PermissionLevel,
        granted_by: Identity,
        now: Timestamp,
        duration: u64,
    ) -> Self {
        let expires_at = match duration {
            0 => None,
            secs => now.checked_add(secs),
        };
        Self {
            entry_id,
            grantee,
            level,
            granted_by,
            granted_at: now,
            expires_at,
        }
    }

    /// A grant is authoritative strictly before its deadline.
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.expires_at.map_or(true, |deadline| now < deadline)
    }

    /// Active and at least `required`.
    pub fn permits(&self, required: PermissionLevel, now: Timestamp) -> bool {
        self.is_active(now) && self.level.satisfies(required)
    }
}
