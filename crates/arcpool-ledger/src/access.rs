use arcpool_core::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::auth::AuthorizationVerifier;
use crate::error::{AccessError, LedgerError, ValidationError};

/// Admin role and the pause switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    admins: BTreeSet<Address>,
    paused: bool,
}

impl AccessControl {
    pub fn new(admin: Address) -> Self {
        Self {
            admins: BTreeSet::from([admin]),
            paused: false,
        }
    }

    pub fn is_admin(&self, account: &Address) -> bool {
        self.admins.contains(account)
    }

    pub fn admins(&self) -> impl Iterator<Item = &Address> {
        self.admins.iter()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn require_admin(&self, caller: &Address) -> Result<(), AccessError> {
        if !self.is_admin(caller) {
            return Err(AccessError::NotAdmin(*caller));
        }
        Ok(())
    }

    pub fn require_not_paused(&self) -> Result<(), AccessError> {
        if self.paused {
            return Err(AccessError::Paused);
        }
        Ok(())
    }

    /// Rotate the verifier's trusted signer. Returns the previous signer.
    pub fn update_signer(
        &self,
        verifier: &mut AuthorizationVerifier,
        caller: &Address,
        new_signer: Address,
    ) -> Result<Address, LedgerError> {
        self.require_admin(caller)?;
        if new_signer.is_zero() {
            return Err(ValidationError::ZeroAddress.into());
        }
        Ok(verifier.set_trusted_signer(new_signer))
    }

    /// Returns `true` if the pool was not already paused.
    pub fn pause(&mut self, caller: &Address) -> Result<bool, AccessError> {
        self.require_admin(caller)?;
        Ok(!std::mem::replace(&mut self.paused, true))
    }

    /// Returns `true` if the pool was paused.
    pub fn unpause(&mut self, caller: &Address) -> Result<bool, AccessError> {
        self.require_admin(caller)?;
        Ok(std::mem::replace(&mut self.paused, false))
    }

    /// Returns `true` if `account` was not already an admin.
    pub fn grant_admin(&mut self, caller: &Address, account: Address) -> Result<bool, LedgerError> {
        self.require_admin(caller)?;
        if account.is_zero() {
            return Err(ValidationError::ZeroAddress.into());
        }
        Ok(self.admins.insert(account))
    }

    /// Returns `true` if `account` was an admin.
    pub fn revoke_admin(&mut self, caller: &Address, account: &Address) -> Result<bool, AccessError> {
        self.require_admin(caller)?;
        if !self.admins.contains(account) {
            return Ok(false);
        }
        if self.admins.len() == 1 {
            return Err(AccessError::LastAdmin(*account));
        }
        Ok(self.admins.remove(account))
    }
}
