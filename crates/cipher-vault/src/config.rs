//! Vault configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the access controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Reputation scoring parameters.
    pub reputation: ReputationConfig,
    /// Whether successful reads are also written to the audit trail.
    pub audit_reads: bool,
    /// Records fetched per audit cursor page.
    pub audit_page_size: usize,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            reputation: ReputationConfig::default(),
            audit_reads: false,
            audit_page_size: 256,
        }
    }
}

/// Parameters for the default reputation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReputationConfig {
    /// Upper bound for every score.
    pub max_reputation: u32,
    /// Added for each successful create, update or grant.
    pub success_increment: u32,
    /// Subtracted for each denied request.
    pub unauthorized_penalty: u32,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            max_reputation: 1000,
            success_increment: 1,
            unauthorized_penalty: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VaultConfig::default();
        assert_eq!(config.reputation.max_reputation, 1000);
        assert_eq!(config.reputation.success_increment, 1);
        assert_eq!(config.reputation.unauthorized_penalty, 2);
        assert!(!config.audit_reads);
        assert_eq!(config.audit_page_size, 256);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: VaultConfig =
            serde_json::from_str(r#"{"audit_reads": true, "reputation": {"max_reputation": 50}}"#)
                .unwrap();
        assert!(config.audit_reads);
        assert_eq!(config.audit_page_size, 256);
        assert_eq!(config.reputation.max_reputation, 50);
        assert_eq!(config.reputation.unauthorized_penalty, 2);
    }
}
