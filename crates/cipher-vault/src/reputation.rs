//! Bounded per-identity trust scores.
//!
//! Scores start at zero, move by a policy-defined delta per recorded
//! outcome, and are clamped to `[0, max_reputation]`. Nothing outside the
//! engine can set a score.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use cipher_vault_core::{Action, Identity};

use crate::config::ReputationConfig;

/// How a request ended, as far as reputation is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionOutcome {
    Success,
    Unauthorized,
    Invalid,
}

/// The scoring formula.
pub trait ReputationPolicy: Send + Sync + fmt::Debug {
    /// Signed change for `action` ending in `outcome`.
    fn delta(&self, action: Action, outcome: ActionOutcome) -> i64;
}

/// Flat reward for productive writes, flat penalty for denials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearPolicy {
    pub success_increment: u32,
    pub unauthorized_penalty: u32,
}

impl From<&ReputationConfig> for LinearPolicy {
    fn from(config: &ReputationConfig) -> Self {
        Self {
            success_increment: config.success_increment,
            unauthorized_penalty: config.unauthorized_penalty,
        }
    }
}

impl ReputationPolicy for LinearPolicy {
    fn delta(&self, action: Action, outcome: ActionOutcome) -> i64 {
        match outcome {
            ActionOutcome::Success => match action {
                Action::Create | Action::Update | Action::GrantAccess => {
                    i64::from(self.success_increment)
                }
                Action::Read | Action::Delete | Action::RevokeAccess => 0,
            },
            ActionOutcome::Unauthorized => -i64::from(self.unauthorized_penalty),
            ActionOutcome::Invalid => 0,
        }
    }
}

/// Owns every reputation score.
#[derive(Debug)]
pub struct ReputationEngine {
    scores: HashMap<Identity, u32>,
    max_reputation: u32,
    policy: Box<dyn ReputationPolicy>,
}

impl ReputationEngine {
    /// Engine using [`LinearPolicy`] built from `config`.
    pub fn new(config: &ReputationConfig) -> Self {
        Self::with_policy(config.max_reputation, LinearPolicy::from(config))
    }

    pub fn with_policy(max_reputation: u32, policy: impl ReputationPolicy + 'static) -> Self {
        Self {
            scores: HashMap::new(),
            max_reputation,
            policy: Box::new(policy),
        }
    }

    /// Apply the policy for one outcome and return the new score.
    ///
    /// The first call for an identity creates its score.
    pub fn record(&mut self, actor: Identity, action: Action, outcome: ActionOutcome) -> u32 {
        let delta = self.policy.delta(action, outcome);
        let max = i64::from(self.max_reputation);
        let score = self.scores.entry(actor).or_insert(0);
        let next = (i64::from(*score) + delta).clamp(0, max);
        // Clamped to [0, u32::MAX] above.
        *score = next as u32;
        *score
    }

    /// Current score; zero for identities never seen.
    pub fn get(&self, actor: &Identity) -> u32 {
        self.scores.get(actor).copied().unwrap_or(0)
    }

    /// Identities that have a score.
    pub fn known_identities(&self) -> usize {
        self.scores.len()
    }

    pub fn max_reputation(&self) -> u32 {
        self.max_reputation
    }
}

impl Default for ReputationEngine {
    fn default() -> Self {
        Self::new(&ReputationConfig::default())
    }
}
