//! Per-invoice financing records and repayment settlement.

use arcpool_core::types::amount_string;
use arcpool_core::{Address, InvoiceId, Timestamp, SECONDS_PER_DAY};
use arcpool_crypto::FinancingRequest;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::auth::AuthorizationVerifier;
use crate::error::{LedgerError, ReplayError, ValidationError};
use crate::math::mul_div_floor;
use crate::vault::ShareVault;

const BPS_DENOMINATOR: u128 = 10_000;

/// Financing terms as presented by the supplier alongside the signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancingTerms {
    pub invoice_id: InvoiceId,
    #[serde(with = "amount_string")]
    pub payout_amount: u128,
    #[serde(with = "amount_string")]
    pub repayment_amount: u128,
    pub due_date: Timestamp,
    #[serde(with = "amount_string")]
    pub nonce: u128,
    pub deadline: Timestamp,
}

impl FinancingTerms {
    /// The typed-data message these terms were signed as, with the calling
    /// supplier bound in.
    pub fn into_request(self, supplier: Address) -> FinancingRequest {
        FinancingRequest {
            invoice_id: self.invoice_id,
            supplier,
            payout_amount: self.payout_amount,
            repayment_amount: self.repayment_amount,
            due_date: self.due_date,
            nonce: self.nonce,
            deadline: self.deadline,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancingStatus {
    Unfinanced,
    Financed,
    Repaid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancingRecord {
    pub invoice_id: InvoiceId,
    pub supplier: Address,
    #[serde(with = "amount_string")]
    pub payout_amount: u128,
    #[serde(with = "amount_string")]
    pub repayment_amount: u128,
    pub due_date: Timestamp,
    pub created_at: Timestamp,
    pub repaid: bool,
    #[serde(with = "amount_string")]
    pub nonce: u128,
    /// Amount the buyer actually paid. Zero until repaid.
    #[serde(with = "amount_string")]
    pub amount_paid: u128,
    pub repaid_at: Option<Timestamp>,
    pub repaid_by: Option<Address>,
}

impl FinancingRecord {
    pub fn status(&self) -> FinancingStatus {
        if self.repaid {
            FinancingStatus::Repaid
        } else {
            FinancingStatus::Financed
        }
    }

    /// Interest the pool earns on the contracted repayment.
    pub fn expected_interest(&self) -> u128 {
        self.repayment_amount - self.payout_amount
    }
}

/// Overdue penalty: a fixed share of the repayment per full day late, capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LateFeePolicy {
    pub bps_per_day: u32,
    pub cap_bps: u32,
}

impl Default for LateFeePolicy {
    /// 1% per day, at most 30%.
    fn default() -> Self {
        Self {
            bps_per_day: 100,
            cap_bps: 3_000,
        }
    }
}

impl LateFeePolicy {
    pub fn days_late(due_date: Timestamp, now: Timestamp) -> u64 {
        now.saturating_sub(due_date) / SECONDS_PER_DAY
    }

    pub fn quote(&self, repayment_amount: u128, due_date: Timestamp, now: Timestamp) -> RepaymentQuote {
        let days_late = Self::days_late(due_date, now);
        let rate_bps = (days_late as u128)
            .saturating_mul(self.bps_per_day as u128)
            .min(self.cap_bps as u128);
        // rate_bps <= cap_bps, so the quotient never exceeds repayment_amount.
        let late_fee = mul_div_floor(repayment_amount, rate_bps, BPS_DENOMINATOR).unwrap_or(0);
        RepaymentQuote {
            repayment_amount,
            late_fee,
            days_late,
            total_due: repayment_amount.saturating_add(late_fee),
        }
    }
}

/// What a buyer must pay to settle an invoice at a given time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepaymentQuote {
    #[serde(with = "amount_string")]
    pub repayment_amount: u128,
    #[serde(with = "amount_string")]
    pub late_fee: u128,
    pub days_late: u64,
    #[serde(with = "amount_string")]
    pub total_due: u128,
}

/// Result of a successful repayment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Settlement {
    pub principal: u128,
    pub interest: u128,
}

/// Running totals, restored on rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LedgerTotals {
    total_interest_earned: u128,
    total_financed: u128,
}

/// A record as it was before the current operation touched it.
type PreImage = (InvoiceId, Option<FinancingRecord>);

/// Financing records, the used-invoice set, and the interest tally.
///
/// Only the totals and the fee policy serialize. Records grow with history,
/// so stores keep each one under its own key and hand them back through
/// [`FinancingLedger::restore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancingLedger {
    #[serde(skip)]
    records: BTreeMap<InvoiceId, FinancingRecord>,
    #[serde(skip)]
    used_invoices: BTreeSet<InvoiceId>,
    #[serde(with = "amount_string")]
    total_interest_earned: u128,
    #[serde(with = "amount_string")]
    total_financed: u128,
    late_fee: LateFeePolicy,
    /// Open while an operation is being staged; `None` otherwise.
    #[serde(skip)]
    journal: Option<Vec<PreImage>>,
}

impl FinancingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_late_fee(late_fee: LateFeePolicy) -> Self {
        Self {
            late_fee,
            ..Self::default()
        }
    }

    pub fn record(&self, invoice_id: &InvoiceId) -> Option<&FinancingRecord> {
        self.records.get(invoice_id)
    }

    pub fn records(&self) -> impl Iterator<Item = &FinancingRecord> {
        self.records.values()
    }

    pub fn is_invoice_used(&self, invoice_id: &InvoiceId) -> bool {
        self.used_invoices.contains(invoice_id)
    }

    pub fn used_invoices(&self) -> impl Iterator<Item = &InvoiceId> {
        self.used_invoices.iter()
    }

    pub fn status(&self, invoice_id: &InvoiceId) -> FinancingStatus {
        self.record(invoice_id)
            .map(FinancingRecord::status)
            .unwrap_or(FinancingStatus::Unfinanced)
    }

    pub fn total_interest_earned(&self) -> u128 {
        self.total_interest_earned
    }

    pub fn total_financed(&self) -> u128 {
        self.total_financed
    }

    pub fn late_fee_policy(&self) -> LateFeePolicy {
        self.late_fee
    }

    /// Put back a record read from a store.
    pub fn restore(&mut self, record: FinancingRecord) {
        self.used_invoices.insert(record.invoice_id);
        self.records.insert(record.invoice_id, record);
    }

    /// Start journaling record writes so they can be listed or undone.
    pub(crate) fn begin(&mut self) -> LedgerTotals {
        self.journal = Some(Vec::new());
        LedgerTotals {
            total_interest_earned: self.total_interest_earned,
            total_financed: self.total_financed,
        }
    }

    /// Records written since `begin`, each once, in invoice-id order.
    pub(crate) fn touched(&self) -> Vec<&FinancingRecord> {
        let ids: BTreeSet<&InvoiceId> = self
            .journal
            .iter()
            .flatten()
            .map(|(id, _)| id)
            .collect();
        ids.into_iter().filter_map(|id| self.records.get(id)).collect()
    }

    /// Undo every record write since `begin` and reset the totals.
    pub(crate) fn rollback(&mut self, totals: LedgerTotals) {
        for (id, previous) in self.journal.take().into_iter().flatten().rev() {
            match previous {
                Some(record) => {
                    self.records.insert(id, record);
                }
                None => {
                    self.records.remove(&id);
                    self.used_invoices.remove(&id);
                }
            }
        }
        self.total_interest_earned = totals.total_interest_earned;
        self.total_financed = totals.total_financed;
    }

    /// Keep the writes since `begin`.
    pub(crate) fn release(&mut self) {
        self.journal = None;
    }

    fn put(&mut self, record: FinancingRecord) {
        let id = record.invoice_id;
        let previous = self.records.insert(id, record);
        if let Some(journal) = &mut self.journal {
            journal.push((id, previous));
        }
    }

    /// Advance `payout_amount` from available liquidity to `supplier`.
    ///
    /// Checks run in a fixed order: replay, authorization, terms, liquidity.
    /// Nothing is mutated unless all of them pass.
    pub fn withdraw_financing(
        &mut self,
        vault: &mut ShareVault,
        verifier: &AuthorizationVerifier,
        supplier: Address,
        terms: FinancingTerms,
        signature: &[u8],
        now: Timestamp,
    ) -> Result<FinancingRecord, LedgerError> {
        let invoice_id = terms.invoice_id;
        if self.is_invoice_used(&invoice_id) {
            return Err(ReplayError::InvoiceAlreadyFinanced(invoice_id).into());
        }

        let request = terms.into_request(supplier);
        verifier.verify(&request, signature, now)?;

        if request.payout_amount == 0 {
            return Err(ValidationError::ZeroAmount.into());
        }
        if request.repayment_amount <= request.payout_amount {
            return Err(ValidationError::RepaymentNotAbovePayout {
                payout: request.payout_amount,
                repayment: request.repayment_amount,
            }
            .into());
        }
        vault.ensure_available(request.payout_amount)?;
        let total_financed = self
            .total_financed
            .checked_add(request.payout_amount)
            .ok_or(ValidationError::AmountOverflow("total financed"))?;

        let record = FinancingRecord {
            invoice_id,
            supplier,
            payout_amount: request.payout_amount,
            repayment_amount: request.repayment_amount,
            due_date: request.due_date,
            created_at: now,
            repaid: false,
            nonce: request.nonce,
            amount_paid: 0,
            repaid_at: None,
            repaid_by: None,
        };
        self.used_invoices.insert(invoice_id);
        self.put(record.clone());
        self.total_financed = total_financed;
        vault.deploy(request.payout_amount);
        Ok(record)
    }

    /// Minimum payment that settles `invoice_id` at `now`.
    pub fn quote(&self, invoice_id: &InvoiceId, now: Timestamp) -> Result<RepaymentQuote, LedgerError> {
        let record = self
            .record(invoice_id)
            .ok_or(LedgerError::NotFound(*invoice_id))?;
        Ok(self.late_fee.quote(record.repayment_amount, record.due_date, now))
    }

    /// Settle an invoice. The whole `payment` returns to available liquidity
    /// and everything above principal counts as interest.
    pub(crate) fn repay(
        &mut self,
        vault: &mut ShareVault,
        invoice_id: &InvoiceId,
        payer: Address,
        payment: u128,
        now: Timestamp,
    ) -> Result<Settlement, LedgerError> {
        let record = self
            .records
            .get(invoice_id)
            .ok_or(LedgerError::NotFound(*invoice_id))?;
        if record.repaid {
            return Err(ReplayError::AlreadyRepaid(*invoice_id).into());
        }
        let quote = self.late_fee.quote(record.repayment_amount, record.due_date, now);
        if payment < quote.total_due {
            return Err(ValidationError::PaymentBelowMinimum {
                payment,
                minimum: quote.total_due,
            }
            .into());
        }

        let principal = record.payout_amount;
        let interest = payment - principal;
        let total_interest = self
            .total_interest_earned
            .checked_add(interest)
            .ok_or(ValidationError::AmountOverflow("total interest"))?;
        if !vault.can_settle(principal, payment) {
            return Err(ValidationError::AmountOverflow("total assets").into());
        }

        let repaid = FinancingRecord {
            repaid: true,
            amount_paid: payment,
            repaid_at: Some(now),
            repaid_by: Some(payer),
            ..record.clone()
        };
        self.put(repaid);
        self.total_interest_earned = total_interest;
        vault.settle(principal, payment);
        Ok(Settlement {
            principal,
            interest,
        })
    }
}
