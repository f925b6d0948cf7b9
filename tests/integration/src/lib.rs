//! Fixtures shared by the cross-crate scenarios in `tests/`.

use std::sync::Arc;

use arcpool_core::{Address, InvoiceId, PoolConfig, Timestamp, SECONDS_PER_DAY};
use arcpool_crypto::{invoice_id, sign_financing_request, KeyPair, RecoverableSignature};
use arcpool_ledger::{
    FinancingRecord, FinancingTerms, LedgerError, ManualClock, MemoryStore, Pool, PoolService,
};

/// One USDC in base units.
pub const USDC: u128 = 1_000_000;
/// 2025-01-01T00:00:00Z.
pub const START: Timestamp = 1_735_689_600;

pub fn admin() -> Address {
    Address::new([0xad; 20])
}

pub fn supplier() -> Address {
    Address::new([0x5a; 20])
}

pub fn buyer() -> Address {
    Address::new([0xb0; 20])
}

pub fn lp(n: u8) -> Address {
    Address::new([n; 20])
}

pub fn config_for(signer: &KeyPair) -> PoolConfig {
    PoolConfig {
        pool_address: Address::new([0xcc; 20]),
        trusted_signer: signer.address(),
        admin: admin(),
        ..PoolConfig::default()
    }
}

/// Terms for `reference`, due 30 days after `now` and signable for an hour.
pub fn terms(reference: &str, payout: u128, repayment: u128, now: Timestamp) -> FinancingTerms {
    FinancingTerms {
        invoice_id: invoice_id(reference),
        payout_amount: payout,
        repayment_amount: repayment,
        due_date: now + 30 * SECONDS_PER_DAY,
        nonce: 1,
        deadline: now + 3_600,
    }
}

pub fn sign(pool: &Pool, terms: &FinancingTerms, supplier: Address, signer: &KeyPair) -> RecoverableSignature {
    sign_financing_request(&terms.clone().into_request(supplier), pool.domain(), signer)
}

/// A bare pool plus its pricing signer, for scenarios that drive time by hand.
pub struct PoolFixture {
    pub pool: Pool,
    pub signer: KeyPair,
}

impl PoolFixture {
    pub fn new() -> Self {
        let signer = KeyPair::generate();
        let pool = Pool::new(&config_for(&signer));
        Self { pool, signer }
    }

    pub fn finance(
        &mut self,
        reference: &str,
        payout: u128,
        repayment: u128,
        now: Timestamp,
    ) -> Result<FinancingRecord, LedgerError> {
        let terms = terms(reference, payout, repayment, now);
        let sig = sign(&self.pool, &terms, supplier(), &self.signer);
        self.pool
            .withdraw_financing(supplier(), terms, &sig.to_bytes(), now)
    }
}

impl Default for PoolFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A service over an in-memory store with a hand-driven clock.
pub struct ServiceFixture {
    pub service: PoolService,
    pub clock: Arc<ManualClock>,
    pub signer: KeyPair,
}

impl ServiceFixture {
    pub fn new() -> Self {
        let signer = KeyPair::generate();
        let clock = Arc::new(ManualClock::new(START));
        let service = PoolService::open(
            &config_for(&signer),
            Box::new(MemoryStore::new()),
            Box::new(Arc::clone(&clock)),
        )
        .expect("open service");
        Self {
            service,
            clock,
            signer,
        }
    }

    pub fn finance(&self, reference: &str, payout: u128, repayment: u128) -> Result<InvoiceId, LedgerError> {
        let terms = terms(reference, payout, repayment, self.service.now());
        let request = terms.clone().into_request(supplier());
        let sig = sign_financing_request(&request, &self.service.domain(), &self.signer);
        self.service
            .withdraw_financing(supplier(), terms, &sig.to_bytes())
            .map(|record| record.invoice_id)
    }
}

impl Default for ServiceFixture {
    fn default() -> Self {
        Self::new()
    }
}
