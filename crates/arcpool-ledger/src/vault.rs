use arcpool_core::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{LedgerError, LiquidityError, ValidationError};
use crate::math::{mul_div_ceil, mul_div_floor};

/// Price scale for `share_price_e18`.
pub const PRICE_SCALE: u128 = 1_000_000_000_000_000_000;

/// Share/asset accounting for LP capital.
///
/// LP positions are share balances only; asset value is always derived from
/// `shares * total_assets / total_shares`. Repayments grow `total_assets`
/// without touching any balance, so every position appreciates on the next
/// read. Deposits and redemptions round down and withdrawals round the
/// burned shares up, so rounding never favours the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareVault {
    #[serde(with = "arcpool_core::types::amount_string")]
    total_shares: u128,
    #[serde(with = "arcpool_core::types::amount_string")]
    available_liquidity: u128,
    #[serde(with = "arcpool_core::types::amount_string")]
    utilized_liquidity: u128,
    balances: BTreeMap<Address, u128>,
}

impl ShareVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Available plus utilized liquidity.
    pub fn total_assets(&self) -> u128 {
        self.available_liquidity + self.utilized_liquidity
    }

    pub fn total_supply(&self) -> u128 {
        self.total_shares
    }

    pub fn available_liquidity(&self) -> u128 {
        self.available_liquidity
    }

    pub fn utilized_liquidity(&self) -> u128 {
        self.utilized_liquidity
    }

    pub fn share_balance(&self, lp: &Address) -> u128 {
        self.balances.get(lp).copied().unwrap_or(0)
    }

    /// Current asset value of an LP's shares.
    pub fn asset_value(&self, lp: &Address) -> u128 {
        // shares <= total_shares, so the quotient is bounded by total_assets.
        self.assets_for_shares(self.share_balance(lp)).unwrap_or(0)
    }

    /// LP positions with a non-zero balance.
    pub fn positions(&self) -> impl Iterator<Item = (&Address, &u128)> {
        self.balances.iter()
    }

    pub fn lp_count(&self) -> usize {
        self.balances.len()
    }

    /// Assets per share, scaled by 1e18. Exactly `PRICE_SCALE` while empty.
    pub fn share_price_e18(&self) -> u128 {
        if self.total_shares == 0 {
            return PRICE_SCALE;
        }
        mul_div_floor(self.total_assets(), PRICE_SCALE, self.total_shares).unwrap_or(u128::MAX)
    }

    /// Shares minted for a deposit of `assets` (floor).
    pub fn preview_deposit(&self, assets: u128) -> Result<u128, ValidationError> {
        if self.total_shares == 0 {
            return Ok(assets);
        }
        mul_div_floor(assets, self.total_shares, self.total_assets())
            .ok_or(ValidationError::AmountOverflow("deposit shares"))
    }

    /// Shares that must be burned to withdraw `assets` (ceiling).
    pub fn shares_for_assets(&self, assets: u128) -> Result<u128, ValidationError> {
        if self.total_shares == 0 {
            return Ok(assets);
        }
        mul_div_ceil(assets, self.total_shares, self.total_assets())
            .ok_or(ValidationError::AmountOverflow("shares for assets"))
    }

    /// Assets paid out for redeeming `shares` (floor).
    pub fn assets_for_shares(&self, shares: u128) -> Result<u128, ValidationError> {
        if self.total_shares == 0 {
            return Ok(shares);
        }
        mul_div_floor(shares, self.total_assets(), self.total_shares)
            .ok_or(ValidationError::AmountOverflow("assets for shares"))
    }

    /// Mint shares for `amount` of deposited assets. Returns the shares minted.
    pub fn deposit(&mut self, lp: Address, amount: u128) -> Result<u128, LedgerError> {
        if amount == 0 {
            return Err(ValidationError::ZeroAmount.into());
        }
        let shares = self.preview_deposit(amount)?;
        if shares == 0 {
            return Err(ValidationError::DepositTooSmall { amount }.into());
        }
        self.total_assets()
            .checked_add(amount)
            .ok_or(ValidationError::AmountOverflow("total assets"))?;
        let total_shares = self
            .total_shares
            .checked_add(shares)
            .ok_or(ValidationError::AmountOverflow("total shares"))?;

        self.available_liquidity += amount;
        self.total_shares = total_shares;
        *self.balances.entry(lp).or_insert(0) += shares;
        Ok(shares)
    }

    /// Withdraw exactly `amount` assets, burning the shares that cover it.
    /// Returns the shares burned.
    pub fn withdraw_assets(&mut self, lp: &Address, amount: u128) -> Result<u128, LedgerError> {
        if amount == 0 {
            return Err(ValidationError::ZeroAmount.into());
        }
        let shares = self.shares_for_assets(amount)?;
        let balance = self.share_balance(lp);
        if balance < shares {
            return Err(LiquidityError::InsufficientShares {
                balance,
                required: shares,
            }
            .into());
        }
        self.ensure_available(amount)?;

        self.burn(lp, shares);
        self.available_liquidity -= amount;
        Ok(shares)
    }

    /// Burn exactly `shares`. Returns the assets paid out.
    pub fn redeem_shares(&mut self, lp: &Address, shares: u128) -> Result<u128, LedgerError> {
        if shares == 0 {
            return Err(ValidationError::ZeroAmount.into());
        }
        let balance = self.share_balance(lp);
        if balance < shares {
            return Err(LiquidityError::InsufficientShares {
                balance,
                required: shares,
            }
            .into());
        }
        let assets = self.assets_for_shares(shares)?;
        self.ensure_available(assets)?;

        self.burn(lp, shares);
        self.available_liquidity -= assets;
        Ok(assets)
    }

    pub(crate) fn ensure_available(&self, requested: u128) -> Result<(), LiquidityError> {
        if requested > self.available_liquidity {
            return Err(LiquidityError::InsufficientLiquidity {
                available: self.available_liquidity,
                requested,
            });
        }
        Ok(())
    }

    /// Move `amount` from available to utilized. Callers check availability
    /// first with `ensure_available`.
    pub(crate) fn deploy(&mut self, amount: u128) {
        self.available_liquidity -= amount;
        self.utilized_liquidity += amount;
    }

    /// Retire `principal` from utilized and credit the whole `payment` to
    /// available. Anything above principal is interest for every LP.
    pub(crate) fn settle(&mut self, principal: u128, payment: u128) {
        self.utilized_liquidity -= principal;
        self.available_liquidity += payment;
    }

    /// Headroom check for `settle`: the new total must fit in `u128`.
    pub(crate) fn can_settle(&self, principal: u128, payment: u128) -> bool {
        (self.total_assets() - principal).checked_add(payment).is_some()
    }

    fn burn(&mut self, lp: &Address, shares: u128) {
        if let Some(balance) = self.balances.get_mut(lp) {
            *balance -= shares;
            if *balance == 0 {
                self.balances.remove(lp);
            }
        }
        self.total_shares -= shares;
    }
}
