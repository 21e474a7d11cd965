//! Request lifecycle.
//!
//! ```text
//! Received -> Authorizing -> Authorized -> Mutating -> Recording -> Completed
//!                        \-> Denied ------------------/         \-> Failed
//! ```
//!
//! Any step after authorization may end in `Failed`, which leaves no effect.

use serde::{Deserialize, Serialize};
use tracing::trace;

use cipher_vault_core::{Action, EntryId, Identity};

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestPhase {
    Received,
    Authorizing,
    Authorized,
    Denied,
    /// The change is staged but not applied.
    Mutating,
    /// The audit record is being written.
    Recording,
    Completed,
    Failed,
}

impl RequestPhase {
    /// Check whether moving from `self` to `next` is a legal step.
    pub fn can_advance_to(self, next: RequestPhase) -> bool {
        use RequestPhase::*;
        matches!(
            (self, next),
            (Received, Authorizing)
                | (Authorizing, Authorized)
                | (Authorizing, Denied)
                | (Authorized, Mutating)
                | (Denied, Recording)
                | (Mutating, Recording)
                | (Recording, Completed)
                | (Authorized, Failed)
                | (Mutating, Failed)
                | (Recording, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RequestPhase::Completed | RequestPhase::Failed)
    }
}

/// Tracks one request through its phases and traces each step.
#[derive(Debug, Clone)]
pub(crate) struct Request {
    action: Action,
    actor: Identity,
    entry_id: Option<EntryId>,
    phase: RequestPhase,
}

impl Request {
    pub(crate) fn new(action: Action, actor: Identity, entry_id: Option<EntryId>) -> Self {
        trace!(?action, %actor, ?entry_id, "request received");
        Self {
            action,
            actor,
            entry_id,
            phase: RequestPhase::Received,
        }
    }

    /// Creates learn their entry id only once it is reserved.
    pub(crate) fn set_entry(&mut self, entry_id: EntryId) {
        self.entry_id = Some(entry_id);
    }

    pub(crate) fn advance(&mut self, next: RequestPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal request transition {:?} -> {:?}",
            self.phase,
            next
        );
        trace!(
            action = ?self.action,
            actor = %self.actor,
            entry_id = ?self.entry_id,
            from = ?self.phase,
            to = ?next,
            "request phase"
        );
        self.phase = next;
    }

    pub(crate) fn phase(&self) -> RequestPhase {
        self.phase
    }
}
