//! Integration test: the service's commit path and the event log.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arcpool_core::SECONDS_PER_DAY;
use arcpool_integration_tests::{admin, buyer, config_for, lp, ServiceFixture, START, USDC};
use arcpool_crypto::KeyPair;
use arcpool_ledger::{
    ErrorKind, FinancingRecord, LedgerStore, ManualClock, MemoryStore, Pool, PoolEvent,
    PoolService, SequencedEvent, StoreError,
};

#[derive(Default)]
struct SwitchableStore {
    inner: MemoryStore,
    offline: AtomicBool,
}

/// Handle the service owns while the test keeps the switch.
struct Switchable(Arc<SwitchableStore>);

impl LedgerStore for Switchable {
    fn load(&self) -> Result<Option<Pool>, StoreError> {
        self.0.inner.load()
    }

    fn commit(
        &self,
        pool: &Pool,
        records: &[&FinancingRecord],
        events: &[PoolEvent],
    ) -> Result<Vec<SequencedEvent>, StoreError> {
        if self.0.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("store offline".into()));
        }
        self.0.inner.commit(pool, records, events)
    }

    fn events_since(&self, from: u64, limit: usize) -> Result<Vec<SequencedEvent>, StoreError> {
        self.0.inner.events_since(from, limit)
    }
}

#[test]
fn test_failed_commit_leaves_pool_untouched() {
    let signer = KeyPair::generate();
    let store = Arc::new(SwitchableStore::default());
    let service = PoolService::open(
        &config_for(&signer),
        Box::new(Switchable(Arc::clone(&store))),
        Box::new(ManualClock::new(START)),
    )
    .unwrap();
    service.deposit(lp(1), 1_000 * USDC).unwrap();
    let before = service.snapshot();

    store.offline.store(true, Ordering::SeqCst);
    let err = service.deposit(lp(2), 500 * USDC).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert!(service.pause(&admin()).is_err());
    assert_eq!(service.snapshot(), before);

    store.offline.store(false, Ordering::SeqCst);
    service.deposit(lp(2), 500 * USDC).unwrap();
    assert_eq!(service.total_assets(), 1_500 * USDC);
    assert_eq!(service.events_since(0, 10).unwrap().len(), 2);
}

#[test]
fn test_event_log_records_lifecycle_in_order() {
    let fx = ServiceFixture::new();
    fx.service.deposit(lp(1), 10_000 * USDC).unwrap();
    let id = fx.finance("INV-LOG", 5_000 * USDC, 5_150 * USDC).unwrap();
    fx.clock.advance(31 * SECONDS_PER_DAY);

    let quote = fx.service.minimum_repayment(&id).unwrap();
    assert_eq!(quote.days_late, 1);
    fx.service.repay(&id, buyer(), quote.total_due).unwrap();

    let events = fx.service.events_since(0, 100).unwrap();
    let names: Vec<_> = events.iter().map(|e| e.event.name()).collect();
    assert_eq!(names, vec!["Deposit", "FinancingWithdrawn", "Repayment"]);
    assert_eq!(events.iter().map(|e| e.seq).collect::<Vec<_>>(), vec![0, 1, 2]);

    match &events[2].event {
        PoolEvent::Repayment {
            amount, interest, timestamp, ..
        } => {
            assert_eq!(*amount, quote.total_due);
            assert_eq!(*interest, quote.total_due - 5_000 * USDC);
            assert_eq!(*timestamp, START + 31 * SECONDS_PER_DAY);
        }
        other => panic!("expected repayment, got {:?}", other),
    }

    let json = serde_json::to_value(&events[0]).unwrap();
    assert_eq!(json["seq"], 0);
    assert_eq!(json["type"], "deposit");
    assert_eq!(json["assets"], "10000000000");
}

#[test]
fn test_rejected_operations_are_not_logged() {
    let fx = ServiceFixture::new();
    assert!(fx.service.deposit(lp(1), 0).is_err());
    assert!(fx.finance("INV-DRY", 1_000 * USDC, 1_100 * USDC).is_err());
    assert!(fx.service.events_since(0, 10).unwrap().is_empty());
    assert_eq!(fx.service.total_assets(), 0);
}

#[test]
fn test_expired_authorization_via_clock() {
    let fx = ServiceFixture::new();
    fx.service.deposit(lp(1), 10_000 * USDC).unwrap();

    let terms = arcpool_integration_tests::terms("INV-SLOW", 1_000 * USDC, 1_100 * USDC, START);
    let request = terms.clone().into_request(arcpool_integration_tests::supplier());
    let sig = arcpool_crypto::sign_financing_request(&request, &fx.service.domain(), &fx.signer);

    fx.clock.advance(3_601);
    let err = fx
        .service
        .withdraw_financing(arcpool_integration_tests::supplier(), terms, &sig.to_bytes())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert!(!fx.service.is_invoice_used(&request.invoice_id));
}
