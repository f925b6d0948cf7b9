use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Address;

/// Deployment-level configuration of a single pool instance.
///
/// `name`, `chain_id` and `pool_address` form the typed-data domain that
/// every financing authorization is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Domain name. Signatures only verify against the same name.
    #[serde(default = "default_name")]
    pub name: String,
    /// Domain version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Chain id of the deployment.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Pool identity (the typed-data `verifyingContract`).
    #[serde(default)]
    pub pool_address: Address,
    /// Initial trusted pricing signer.
    #[serde(default)]
    pub trusted_signer: Address,
    /// Initial admin.
    #[serde(default)]
    pub admin: Address,
}

fn default_name() -> String {
    "ArcPool".into()
}
fn default_version() -> String {
    "1".into()
}
fn default_chain_id() -> u64 {
    421_614
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            version: default_version(),
            chain_id: default_chain_id(),
            pool_address: Address::ZERO,
            trusted_signer: Address::ZERO,
            admin: Address::ZERO,
        }
    }
}

impl PoolConfig {
    /// Reject configurations a pool cannot be created from.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.is_empty() {
            return Err(CoreError::InvalidConfig("pool name must not be empty".into()));
        }
        if self.trusted_signer.is_zero() {
            return Err(CoreError::InvalidConfig(
                "trusted_signer must be a non-zero address".into(),
            ));
        }
        if self.admin.is_zero() {
            return Err(CoreError::InvalidConfig("admin must be a non-zero address".into()));
        }
        Ok(())
    }
}
