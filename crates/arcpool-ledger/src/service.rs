//! Single-writer pool service.
//!
//! Every mutation runs against the live pool under the write lock, after a
//! checkpoint of its small components is taken and with financing-record
//! writes journaled. The result is committed to the store together with its
//! events; a rejected operation or a failed write rolls back to the
//! checkpoint, so readers only ever see committed state.

use arcpool_core::{Address, InvoiceId, PoolConfig, Timestamp};
use arcpool_crypto::TypedDataDomain;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use crate::clock::Clock;
use crate::error::LedgerError;
use crate::financing::{FinancingRecord, FinancingTerms, RepaymentQuote};
use crate::pool::{
    DepositReceipt, InvoiceView, LpPosition, Pool, PoolStatus, PoolSummary, RepaymentReceipt,
    WithdrawalReceipt,
};
use crate::store::{LedgerStore, SequencedEvent, StoreError};

pub struct PoolService {
    pool: RwLock<Pool>,
    store: Box<dyn LedgerStore>,
    clock: Box<dyn Clock>,
}

impl PoolService {
    /// Restore the pool from `store`, or create and persist a fresh one from
    /// `config` if the store is empty. A stored pool must carry the same
    /// typed-data domain as `config`.
    pub fn open(
        config: &PoolConfig,
        store: Box<dyn LedgerStore>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, StoreError> {
        config.validate()?;
        let expected = TypedDataDomain::from_config(config);

        let pool = match store.load()? {
            Some(pool) => {
                if pool.domain() != &expected {
                    return Err(StoreError::ConfigMismatch(format!(
                        "stored domain {}/{} chain {} at {}, configured {}/{} chain {} at {}",
                        pool.domain().name,
                        pool.domain().version,
                        pool.domain().chain_id,
                        pool.domain().verifying_contract,
                        expected.name,
                        expected.version,
                        expected.chain_id,
                        expected.verifying_contract,
                    )));
                }
                pool.check_invariants()
                    .map_err(|e| StoreError::Corrupt(e.to_string()))?;
                tracing::info!(
                    total_assets = pool.total_assets(),
                    total_shares = pool.total_supply(),
                    "restored pool from store"
                );
                pool
            }
            None => {
                let pool = Pool::new(config);
                store.commit(&pool, &[], &[])?;
                tracing::info!(
                    pool = %config.pool_address,
                    chain_id = config.chain_id,
                    signer = %config.trusted_signer,
                    admin = %config.admin,
                    "created new pool"
                );
                pool
            }
        };

        Ok(Self {
            pool: RwLock::new(pool),
            store,
            clock,
        })
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn read(&self) -> RwLockReadGuard<'_, Pool> {
        self.pool.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn transact<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut Pool, Timestamp) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let mut pool = self.pool.write().unwrap_or_else(PoisonError::into_inner);
        let now = self.clock.now();
        let checkpoint = pool.begin();

        let value = match f(&mut pool, now) {
            Ok(value) => value,
            Err(e) => {
                pool.rollback(checkpoint);
                tracing::warn!(op, kind = %e.kind(), error = %e, "operation rejected");
                return Err(e);
            }
        };
        debug_assert!(pool.check_invariants().is_ok(), "{op} broke an invariant");

        let events = pool.take_events();
        if events.is_empty() {
            pool.release(checkpoint);
            return Ok(value);
        }
        let committed = self.store.commit(&pool, &pool.changed_records(), &events);
        match committed {
            Ok(committed) => {
                pool.release(checkpoint);
                for entry in &committed {
                    tracing::info!(op, seq = entry.seq, event = entry.event.name(), "event committed");
                }
                Ok(value)
            }
            Err(e) => {
                pool.rollback(checkpoint);
                tracing::error!(op, error = %e, "commit failed, pool unchanged");
                Err(e.into())
            }
        }
    }

    // --- Mutations ---

    pub fn deposit(&self, lp: Address, amount: u128) -> Result<DepositReceipt, LedgerError> {
        self.transact("deposit", |pool, _| pool.deposit(lp, amount))
    }

    pub fn withdraw_assets(&self, lp: Address, amount: u128) -> Result<WithdrawalReceipt, LedgerError> {
        self.transact("withdraw_assets", |pool, _| pool.withdraw_assets(lp, amount))
    }

    pub fn redeem_shares(&self, lp: Address, shares: u128) -> Result<WithdrawalReceipt, LedgerError> {
        self.transact("redeem_shares", |pool, _| pool.redeem_shares(lp, shares))
    }

    pub fn withdraw_financing(
        &self,
        supplier: Address,
        terms: FinancingTerms,
        signature: &[u8],
    ) -> Result<FinancingRecord, LedgerError> {
        self.transact("withdraw_financing", |pool, now| {
            pool.withdraw_financing(supplier, terms, signature, now)
        })
    }

    pub fn repay(
        &self,
        invoice_id: &InvoiceId,
        payer: Address,
        payment: u128,
    ) -> Result<RepaymentReceipt, LedgerError> {
        self.transact("repay", |pool, now| pool.repay(invoice_id, payer, payment, now))
    }

    pub fn update_signer(&self, caller: &Address, new_signer: Address) -> Result<Address, LedgerError> {
        self.transact("update_signer", |pool, _| pool.update_signer(caller, new_signer))
    }

    pub fn pause(&self, caller: &Address) -> Result<bool, LedgerError> {
        self.transact("pause", |pool, _| pool.pause(caller))
    }

    pub fn unpause(&self, caller: &Address) -> Result<bool, LedgerError> {
        self.transact("unpause", |pool, _| pool.unpause(caller))
    }

    pub fn grant_admin(&self, caller: &Address, account: Address) -> Result<bool, LedgerError> {
        self.transact("grant_admin", |pool, _| pool.grant_admin(caller, account))
    }

    pub fn revoke_admin(&self, caller: &Address, account: Address) -> Result<bool, LedgerError> {
        self.transact("revoke_admin", |pool, _| pool.revoke_admin(caller, account))
    }

    // --- Reads ---

    pub fn pool_status(&self) -> PoolStatus {
        self.read().pool_status()
    }

    /// Status, signer and domain from a single read.
    pub fn pool_summary(&self) -> PoolSummary {
        self.read().summary()
    }

    /// Record, used flag and repayment quote from a single read, quoted
    /// against the service clock.
    pub fn invoice_view(&self, invoice_id: &InvoiceId) -> InvoiceView {
        let now = self.clock.now();
        self.read().invoice_view(invoice_id, now)
    }

    pub fn lp_position(&self, lp: &Address) -> LpPosition {
        self.read().lp_position(lp)
    }

    pub fn lp_share_balance(&self, lp: &Address) -> u128 {
        self.read().lp_share_balance(lp)
    }

    pub fn lp_asset_value(&self, lp: &Address) -> u128 {
        self.read().lp_asset_value(lp)
    }

    pub fn total_assets(&self) -> u128 {
        self.read().total_assets()
    }

    pub fn total_supply(&self) -> u128 {
        self.read().total_supply()
    }

    pub fn shares_for_assets(&self, assets: u128) -> Result<u128, LedgerError> {
        self.read().shares_for_assets(assets)
    }

    pub fn assets_for_shares(&self, shares: u128) -> Result<u128, LedgerError> {
        self.read().assets_for_shares(shares)
    }

    pub fn preview_deposit(&self, assets: u128) -> Result<u128, LedgerError> {
        self.read().preview_deposit(assets)
    }

    pub fn is_invoice_used(&self, invoice_id: &InvoiceId) -> bool {
        self.read().is_invoice_used(invoice_id)
    }

    pub fn financing_record(&self, invoice_id: &InvoiceId) -> Option<FinancingRecord> {
        self.read().financing_record(invoice_id).cloned()
    }

    /// Quote against the service clock.
    pub fn minimum_repayment(&self, invoice_id: &InvoiceId) -> Result<RepaymentQuote, LedgerError> {
        let now = self.clock.now();
        self.read().minimum_repayment(invoice_id, now)
    }

    pub fn trusted_signer(&self) -> Address {
        self.read().trusted_signer()
    }

    pub fn total_interest_earned(&self) -> u128 {
        self.read().total_interest_earned()
    }

    pub fn is_admin(&self, account: &Address) -> bool {
        self.read().is_admin(account)
    }

    pub fn domain(&self) -> TypedDataDomain {
        self.read().domain().clone()
    }

    /// A consistent copy of the whole pool, financing history included.
    /// Meant for inspection and tests; request paths use the targeted reads.
    pub fn snapshot(&self) -> Pool {
        self.read().clone()
    }

    pub fn events_since(&self, from: u64, limit: usize) -> Result<Vec<SequencedEvent>, LedgerError> {
        Ok(self.store.events_since(from, limit)?)
    }
}
