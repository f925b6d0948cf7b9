//! The pool aggregate: vault, financing ledger, verifier and access control
//! under one owner.

use arcpool_core::types::amount_string;
use arcpool_core::{Address, InvoiceId, PoolConfig, Timestamp};
use arcpool_crypto::TypedDataDomain;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::access::AccessControl;
use crate::auth::AuthorizationVerifier;
use crate::error::LedgerError;
use crate::events::PoolEvent;
use crate::financing::{
    FinancingLedger, FinancingRecord, FinancingStatus, FinancingTerms, LedgerTotals, RepaymentQuote,
};
use crate::vault::ShareVault;

const BPS_DENOMINATOR: u128 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatus {
    /// Available plus utilized liquidity.
    #[serde(with = "amount_string")]
    pub total: u128,
    #[serde(with = "amount_string")]
    pub available: u128,
    #[serde(with = "amount_string")]
    pub utilized: u128,
    /// Cumulative principal ever advanced.
    #[serde(with = "amount_string")]
    pub financed: u128,
    #[serde(with = "amount_string")]
    pub total_shares: u128,
    #[serde(with = "amount_string")]
    pub total_interest_earned: u128,
    pub utilization_bps: u32,
    #[serde(with = "amount_string")]
    pub share_price_e18: u128,
    pub paused: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LpPosition {
    pub address: Address,
    #[serde(with = "amount_string")]
    pub shares: u128,
    #[serde(with = "amount_string")]
    pub asset_value: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositReceipt {
    #[serde(with = "amount_string")]
    pub assets: u128,
    #[serde(with = "amount_string")]
    pub shares: u128,
    #[serde(with = "amount_string")]
    pub new_total_pool_size: u128,
}

/// Result of `withdraw_assets` or `redeem_shares`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    #[serde(with = "amount_string")]
    pub assets: u128,
    #[serde(with = "amount_string")]
    pub shares: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepaymentReceipt {
    pub invoice_id: InvoiceId,
    #[serde(with = "amount_string")]
    pub amount: u128,
    #[serde(with = "amount_string")]
    pub principal: u128,
    #[serde(with = "amount_string")]
    pub interest: u128,
}

/// Status plus the pool's signing identity, read together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolSummary {
    #[serde(flatten)]
    pub status: PoolStatus,
    pub trusted_signer: Address,
    pub domain: TypedDataDomain,
}

/// Everything known about one invoice at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceView {
    pub invoice_id: InvoiceId,
    pub used: bool,
    pub status: FinancingStatus,
    pub record: Option<FinancingRecord>,
    /// Present while the invoice is financed and unpaid.
    pub quote: Option<RepaymentQuote>,
}

/// Undo state for one staged operation. Copies the vault, verifier and
/// access control; financing records are journaled by the ledger instead.
pub(crate) struct Checkpoint {
    vault: ShareVault,
    verifier: AuthorizationVerifier,
    access: AccessControl,
    totals: LedgerTotals,
    events: usize,
}

/// A broken accounting identity. Any of these means a bug, never bad input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("LP share balances sum to {sum}, total_shares is {total}")]
    ShareSupply { sum: u128, total: u128 },

    #[error("utilized liquidity {utilized} != outstanding principal {outstanding}")]
    Utilization { utilized: u128, outstanding: u128 },

    #[error("total_financed {recorded} != sum of payouts {sum}")]
    Financed { recorded: u128, sum: u128 },

    #[error("used invoice set does not match financing records")]
    UsedInvoices,

    #[error("{0} holds a zero share balance")]
    ZeroBalance(Address),

    #[error("{shares} shares outstanding with no assets")]
    UnbackedShares { shares: u128 },
}

/// The full state of one pool.
///
/// Operations either succeed completely or return an error with the pool
/// untouched. Successful mutations queue events that the owner drains with
/// [`Pool::take_events`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    vault: ShareVault,
    ledger: FinancingLedger,
    verifier: AuthorizationVerifier,
    access: AccessControl,
    #[serde(skip)]
    pending_events: Vec<PoolEvent>,
}

impl Pool {
    pub fn new(config: &PoolConfig) -> Self {
        Self {
            vault: ShareVault::new(),
            ledger: FinancingLedger::new(),
            verifier: AuthorizationVerifier::new(
                TypedDataDomain::from_config(config),
                config.trusted_signer,
            ),
            access: AccessControl::new(config.admin),
            pending_events: Vec::new(),
        }
    }

    pub fn vault(&self) -> &ShareVault {
        &self.vault
    }

    pub fn ledger(&self) -> &FinancingLedger {
        &self.ledger
    }

    pub fn verifier(&self) -> &AuthorizationVerifier {
        &self.verifier
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn domain(&self) -> &TypedDataDomain {
        self.verifier.domain()
    }

    /// Drain the events produced since the last call.
    pub fn take_events(&mut self) -> Vec<PoolEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Put back a financing record read from a store. Snapshots carry only
    /// the pool head, so loading is the head followed by every record.
    pub fn restore_record(&mut self, record: FinancingRecord) {
        self.ledger.restore(record);
    }

    pub(crate) fn begin(&mut self) -> Checkpoint {
        Checkpoint {
            vault: self.vault.clone(),
            verifier: self.verifier.clone(),
            access: self.access.clone(),
            totals: self.ledger.begin(),
            events: self.pending_events.len(),
        }
    }

    /// Financing records created or changed since `begin`.
    pub(crate) fn changed_records(&self) -> Vec<&FinancingRecord> {
        self.ledger.touched()
    }

    pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
        self.vault = checkpoint.vault;
        self.verifier = checkpoint.verifier;
        self.access = checkpoint.access;
        self.ledger.rollback(checkpoint.totals);
        self.pending_events.truncate(checkpoint.events);
    }

    pub(crate) fn release(&mut self, _checkpoint: Checkpoint) {
        self.ledger.release();
    }

    // --- LP operations ---

    pub fn deposit(&mut self, lp: Address, amount: u128) -> Result<DepositReceipt, LedgerError> {
        self.access.require_not_paused()?;
        let shares = self.vault.deposit(lp, amount)?;
        let new_total_pool_size = self.vault.total_assets();
        self.pending_events.push(PoolEvent::Deposit {
            lp,
            assets: amount,
            shares,
            new_total_pool_size,
        });
        Ok(DepositReceipt {
            assets: amount,
            shares,
            new_total_pool_size,
        })
    }

    pub fn withdraw_assets(
        &mut self,
        lp: Address,
        amount: u128,
    ) -> Result<WithdrawalReceipt, LedgerError> {
        let shares = self.vault.withdraw_assets(&lp, amount)?;
        Ok(self.withdrawn(lp, amount, shares))
    }

    pub fn redeem_shares(
        &mut self,
        lp: Address,
        shares: u128,
    ) -> Result<WithdrawalReceipt, LedgerError> {
        let assets = self.vault.redeem_shares(&lp, shares)?;
        Ok(self.withdrawn(lp, assets, shares))
    }

    fn withdrawn(&mut self, lp: Address, assets: u128, shares: u128) -> WithdrawalReceipt {
        self.pending_events
            .push(PoolEvent::Withdrawal { lp, assets, shares });
        WithdrawalReceipt { assets, shares }
    }

    // --- Financing ---

    pub fn withdraw_financing(
        &mut self,
        supplier: Address,
        terms: FinancingTerms,
        signature: &[u8],
        now: Timestamp,
    ) -> Result<FinancingRecord, LedgerError> {
        self.access.require_not_paused()?;
        let record = self.ledger.withdraw_financing(
            &mut self.vault,
            &self.verifier,
            supplier,
            terms,
            signature,
            now,
        )?;
        self.pending_events.push(PoolEvent::FinancingWithdrawn {
            invoice_id: record.invoice_id,
            supplier,
            payout_amount: record.payout_amount,
            timestamp: now,
        });
        Ok(record)
    }

    pub fn repay(
        &mut self,
        invoice_id: &InvoiceId,
        payer: Address,
        payment: u128,
        now: Timestamp,
    ) -> Result<RepaymentReceipt, LedgerError> {
        let settlement = self
            .ledger
            .repay(&mut self.vault, invoice_id, payer, payment, now)?;
        self.pending_events.push(PoolEvent::Repayment {
            invoice_id: *invoice_id,
            payer,
            amount: payment,
            interest: settlement.interest,
            timestamp: now,
        });
        Ok(RepaymentReceipt {
            invoice_id: *invoice_id,
            amount: payment,
            principal: settlement.principal,
            interest: settlement.interest,
        })
    }

    // --- Administration ---

    /// Returns the previous signer.
    pub fn update_signer(
        &mut self,
        caller: &Address,
        new_signer: Address,
    ) -> Result<Address, LedgerError> {
        let old = self
            .access
            .update_signer(&mut self.verifier, caller, new_signer)?;
        self.pending_events.push(PoolEvent::SignerUpdated {
            old,
            new: new_signer,
        });
        Ok(old)
    }

    /// Returns `false` if the pool was already paused.
    pub fn pause(&mut self, caller: &Address) -> Result<bool, LedgerError> {
        let changed = self.access.pause(caller)?;
        if changed {
            self.pending_events.push(PoolEvent::Paused { by: *caller });
        }
        Ok(changed)
    }

    /// Returns `false` if the pool was not paused.
    pub fn unpause(&mut self, caller: &Address) -> Result<bool, LedgerError> {
        let changed = self.access.unpause(caller)?;
        if changed {
            self.pending_events.push(PoolEvent::Unpaused { by: *caller });
        }
        Ok(changed)
    }

    pub fn grant_admin(&mut self, caller: &Address, account: Address) -> Result<bool, LedgerError> {
        let changed = self.access.grant_admin(caller, account)?;
        if changed {
            self.pending_events.push(PoolEvent::AdminGranted {
                account,
                by: *caller,
            });
        }
        Ok(changed)
    }

    pub fn revoke_admin(&mut self, caller: &Address, account: Address) -> Result<bool, LedgerError> {
        let changed = self.access.revoke_admin(caller, &account)?;
        if changed {
            self.pending_events.push(PoolEvent::AdminRevoked {
                account,
                by: *caller,
            });
        }
        Ok(changed)
    }

    // --- Reads ---

    pub fn pool_status(&self) -> PoolStatus {
        let total = self.vault.total_assets();
        let utilized = self.vault.utilized_liquidity();
        let utilization_bps = if total == 0 {
            0
        } else {
            // utilized <= total, so this is at most 10_000.
            (utilized.saturating_mul(BPS_DENOMINATOR) / total).min(BPS_DENOMINATOR) as u32
        };
        PoolStatus {
            total,
            available: self.vault.available_liquidity(),
            utilized,
            financed: self.ledger.total_financed(),
            total_shares: self.vault.total_supply(),
            total_interest_earned: self.ledger.total_interest_earned(),
            utilization_bps,
            share_price_e18: self.vault.share_price_e18(),
            paused: self.access.is_paused(),
        }
    }

    pub fn summary(&self) -> PoolSummary {
        PoolSummary {
            status: self.pool_status(),
            trusted_signer: self.trusted_signer(),
            domain: self.domain().clone(),
        }
    }

    pub fn invoice_view(&self, invoice_id: &InvoiceId, now: Timestamp) -> InvoiceView {
        let record = self.ledger.record(invoice_id).cloned();
        let quote = record
            .as_ref()
            .filter(|r| !r.repaid)
            .map(|r| self.ledger.late_fee_policy().quote(r.repayment_amount, r.due_date, now));
        InvoiceView {
            invoice_id: *invoice_id,
            used: self.ledger.is_invoice_used(invoice_id),
            status: self.ledger.status(invoice_id),
            record,
            quote,
        }
    }

    pub fn total_assets(&self) -> u128 {
        self.vault.total_assets()
    }

    pub fn total_supply(&self) -> u128 {
        self.vault.total_supply()
    }

    pub fn lp_share_balance(&self, lp: &Address) -> u128 {
        self.vault.share_balance(lp)
    }

    pub fn lp_asset_value(&self, lp: &Address) -> u128 {
        self.vault.asset_value(lp)
    }

    pub fn lp_position(&self, lp: &Address) -> LpPosition {
        LpPosition {
            address: *lp,
            shares: self.vault.share_balance(lp),
            asset_value: self.vault.asset_value(lp),
        }
    }

    pub fn shares_for_assets(&self, assets: u128) -> Result<u128, LedgerError> {
        Ok(self.vault.shares_for_assets(assets)?)
    }

    pub fn assets_for_shares(&self, shares: u128) -> Result<u128, LedgerError> {
        Ok(self.vault.assets_for_shares(shares)?)
    }

    pub fn preview_deposit(&self, assets: u128) -> Result<u128, LedgerError> {
        Ok(self.vault.preview_deposit(assets)?)
    }

    pub fn is_invoice_used(&self, invoice_id: &InvoiceId) -> bool {
        self.ledger.is_invoice_used(invoice_id)
    }

    pub fn financing_record(&self, invoice_id: &InvoiceId) -> Option<&FinancingRecord> {
        self.ledger.record(invoice_id)
    }

    pub fn minimum_repayment(
        &self,
        invoice_id: &InvoiceId,
        now: Timestamp,
    ) -> Result<RepaymentQuote, LedgerError> {
        self.ledger.quote(invoice_id, now)
    }

    pub fn trusted_signer(&self) -> Address {
        self.verifier.trusted_signer()
    }

    pub fn total_interest_earned(&self) -> u128 {
        self.ledger.total_interest_earned()
    }

    pub fn is_admin(&self, account: &Address) -> bool {
        self.access.is_admin(account)
    }

    pub fn is_paused(&self) -> bool {
        self.access.is_paused()
    }

    /// Recompute every accounting identity from scratch.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut sum = 0u128;
        for (lp, shares) in self.vault.positions() {
            if *shares == 0 {
                return Err(InvariantViolation::ZeroBalance(*lp));
            }
            sum += shares;
        }
        if sum != self.vault.total_supply() {
            return Err(InvariantViolation::ShareSupply {
                sum,
                total: self.vault.total_supply(),
            });
        }
        if self.vault.total_supply() > 0 && self.vault.total_assets() == 0 {
            return Err(InvariantViolation::UnbackedShares {
                shares: self.vault.total_supply(),
            });
        }

        let mut outstanding = 0u128;
        let mut financed = 0u128;
        for record in self.ledger.records() {
            financed += record.payout_amount;
            if !record.repaid {
                outstanding += record.payout_amount;
            }
        }
        if outstanding != self.vault.utilized_liquidity() {
            return Err(InvariantViolation::Utilization {
                utilized: self.vault.utilized_liquidity(),
                outstanding,
            });
        }
        if financed != self.ledger.total_financed() {
            return Err(InvariantViolation::Financed {
                recorded: self.ledger.total_financed(),
                sum: financed,
            });
        }

        let used: BTreeSet<&InvoiceId> = self.ledger.used_invoices().collect();
        let recorded: BTreeSet<&InvoiceId> = self.ledger.records().map(|r| &r.invoice_id).collect();
        if used != recorded {
            return Err(InvariantViolation::UsedInvoices);
        }
        Ok(())
    }
}
