//! Integration test: signed financing, replay protection and repayment.

use arcpool_core::{Address, PoolConfig, SECONDS_PER_DAY};
use arcpool_crypto::{sign_financing_request, KeyPair, TypedDataDomain};
use arcpool_integration_tests::{buyer, lp, sign, supplier, terms, PoolFixture, START, USDC};
use arcpool_ledger::{
    AuthorizationError, ErrorKind, FinancingStatus, LedgerError, Pool, ReplayError, ValidationError,
};

fn funded() -> PoolFixture {
    let mut fx = PoolFixture::new();
    fx.pool.deposit(lp(1), 100_000 * USDC).unwrap();
    fx
}

#[test]
fn test_full_financing_lifecycle() {
    let mut fx = funded();
    let record = fx.finance("INV-2024-001", 9_000 * USDC, 9_200 * USDC, START).unwrap();
    let id = record.invoice_id;
    assert_eq!(fx.pool.ledger().status(&id), FinancingStatus::Financed);
    assert!(fx.pool.is_invoice_used(&id));

    let status = fx.pool.pool_status();
    assert_eq!(status.utilized, 9_000 * USDC);
    assert_eq!(status.available, 91_000 * USDC);
    assert_eq!(status.utilization_bps, 900);

    let receipt = fx.pool.repay(&id, buyer(), 9_200 * USDC, START + SECONDS_PER_DAY).unwrap();
    assert_eq!(receipt.principal, 9_000 * USDC);
    assert_eq!(receipt.interest, 200 * USDC);
    assert_eq!(fx.pool.ledger().status(&id), FinancingStatus::Repaid);

    let repaid = fx.pool.financing_record(&id).unwrap();
    assert_eq!(repaid.amount_paid, 9_200 * USDC);
    assert_eq!(repaid.repaid_by, Some(buyer()));
    assert_eq!(fx.pool.pool_status().utilized, 0);
    assert_eq!(fx.pool.total_assets(), 100_200 * USDC);
    fx.pool.check_invariants().unwrap();
}

#[test]
fn test_invoice_cannot_be_financed_twice() {
    let mut fx = funded();
    let first = fx.finance("INV-REPLAY", 1_000 * USDC, 1_050 * USDC, START).unwrap();

    // Fresh signature, different nonce: still the same invoice.
    let mut again = terms("INV-REPLAY", 1_000 * USDC, 1_050 * USDC, START);
    again.nonce = 2;
    let sig = sign(&fx.pool, &again, supplier(), &fx.signer);
    let err = fx
        .pool
        .withdraw_financing(supplier(), again, &sig.to_bytes(), START)
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::Replay(ReplayError::InvoiceAlreadyFinanced(first.invoice_id))
    );

    // Repayment doesn't free the id either.
    fx.pool.repay(&first.invoice_id, buyer(), 1_050 * USDC, START).unwrap();
    let err = fx.finance("INV-REPLAY", 1_000 * USDC, 1_050 * USDC, START).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Replay);
}

#[test]
fn test_rejects_untrusted_or_altered_authorizations() {
    let mut fx = funded();
    let before = fx.pool.clone();

    // Signed by someone else.
    let rogue = KeyPair::generate();
    let t = terms("INV-AUTH", 1_000 * USDC, 1_100 * USDC, START);
    let sig = sign(&fx.pool, &t, supplier(), &rogue);
    let err = fx.pool.withdraw_financing(supplier(), t, &sig.to_bytes(), START).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Authorization(AuthorizationError::InvalidSigner { .. })
    ));

    // Payout raised after signing.
    let t = terms("INV-AUTH", 1_000 * USDC, 1_100 * USDC, START);
    let sig = sign(&fx.pool, &t, supplier(), &fx.signer);
    let mut inflated = t.clone();
    inflated.payout_amount = 1_099 * USDC;
    let err = fx
        .pool
        .withdraw_financing(supplier(), inflated, &sig.to_bytes(), START)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    // Another supplier presenting the same signature.
    let err = fx
        .pool
        .withdraw_financing(Address::new([0x66; 20]), t.clone(), &sig.to_bytes(), START)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    // Past the deadline.
    let err = fx
        .pool
        .withdraw_financing(supplier(), t.clone(), &sig.to_bytes(), t.deadline + 1)
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Authorization(AuthorizationError::Expired { .. })
    ));

    // Garbage signature bytes.
    let err = fx
        .pool
        .withdraw_financing(supplier(), t, &[0u8; 12], START)
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Authorization(AuthorizationError::MalformedSignature(_))
    ));

    assert_eq!(fx.pool, before);
}

#[test]
fn test_signature_is_bound_to_pool_domain() {
    let mut fx = funded();
    let t = terms("INV-DOMAIN", 1_000 * USDC, 1_100 * USDC, START);
    let request = t.clone().into_request(supplier());
    let other_chain = TypedDataDomain::new(1, fx.pool.domain().verifying_contract);
    let sig = sign_financing_request(&request, &other_chain, &fx.signer);

    let err = fx.pool.withdraw_financing(supplier(), t, &sig.to_bytes(), START).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
}

#[test]
fn test_deadline_is_inclusive() {
    let mut fx = funded();
    let t = terms("INV-EDGE", 1_000 * USDC, 1_100 * USDC, START);
    let sig = sign(&fx.pool, &t, supplier(), &fx.signer);
    let deadline = t.deadline;
    fx.pool
        .withdraw_financing(supplier(), t, &sig.to_bytes(), deadline)
        .unwrap();
}

#[test]
fn test_terms_validation() {
    let mut fx = funded();
    let err = fx.finance("INV-FLAT", 1_000 * USDC, 1_000 * USDC, START).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Validation(ValidationError::RepaymentNotAbovePayout { .. })
    ));

    let err = fx.finance("INV-BIG", 100_001 * USDC, 110_000 * USDC, START).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Liquidity);
    assert!(!fx.pool.is_invoice_used(&arcpool_crypto::invoice_id("INV-BIG")));
}

#[test]
fn test_repayment_must_cover_minimum() {
    let mut fx = funded();
    let record = fx.finance("INV-PAY", 9_000 * USDC, 9_200 * USDC, START).unwrap();
    let id = record.invoice_id;

    let err = fx.pool.repay(&id, buyer(), 9_200 * USDC - 1, START).unwrap_err();
    assert_eq!(
        err,
        LedgerError::Validation(ValidationError::PaymentBelowMinimum {
            payment: 9_200 * USDC - 1,
            minimum: 9_200 * USDC,
        })
    );

    fx.pool.repay(&id, buyer(), 9_200 * USDC, START).unwrap();
    let err = fx.pool.repay(&id, buyer(), 9_200 * USDC, START).unwrap_err();
    assert_eq!(err, LedgerError::Replay(ReplayError::AlreadyRepaid(id)));

    let unknown = arcpool_crypto::invoice_id("INV-NOPE");
    let err = fx.pool.repay(&unknown, buyer(), 1, START).unwrap_err();
    assert_eq!(err, LedgerError::NotFound(unknown));
}

#[test]
fn test_overpayment_counts_as_interest() {
    let mut fx = funded();
    let record = fx.finance("INV-TIP", 9_000 * USDC, 9_200 * USDC, START).unwrap();
    let receipt = fx.pool.repay(&record.invoice_id, buyer(), 9_300 * USDC, START).unwrap();
    assert_eq!(receipt.interest, 300 * USDC);
    assert_eq!(fx.pool.total_assets(), 100_300 * USDC);
}

#[test]
fn test_late_fee_schedule() {
    let mut fx = funded();
    let record = fx.finance("INV-LATE", 9_000 * USDC, 9_200 * USDC, START).unwrap();
    let id = record.invoice_id;
    let due = record.due_date;

    let on_time = fx.pool.minimum_repayment(&id, due).unwrap();
    assert_eq!(on_time.late_fee, 0);

    // Part of a day doesn't count.
    let grace = fx.pool.minimum_repayment(&id, due + SECONDS_PER_DAY - 1).unwrap();
    assert_eq!(grace.days_late, 0);

    let three = fx.pool.minimum_repayment(&id, due + 3 * SECONDS_PER_DAY).unwrap();
    assert_eq!(three.days_late, 3);
    assert_eq!(three.late_fee, 276 * USDC);
    assert_eq!(three.total_due, 9_476 * USDC);

    let capped = fx.pool.minimum_repayment(&id, due + 45 * SECONDS_PER_DAY).unwrap();
    assert_eq!(capped.late_fee, 2_760 * USDC);

    // The fee is owed, not optional.
    let late = due + 3 * SECONDS_PER_DAY;
    assert!(fx.pool.repay(&id, buyer(), 9_200 * USDC, late).is_err());
    let receipt = fx.pool.repay(&id, buyer(), 9_476 * USDC, late).unwrap();
    assert_eq!(receipt.interest, 476 * USDC);
}

#[test]
fn test_rotated_signer_invalidates_old_key() {
    let mut fx = funded();
    let replacement = KeyPair::generate();
    let admin = arcpool_integration_tests::admin();
    let old = fx.pool.update_signer(&admin, replacement.address()).unwrap();
    assert_eq!(old, fx.signer.address());

    let err = fx.finance("INV-ROTATE", 1_000 * USDC, 1_100 * USDC, START).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    fx.signer = replacement;
    fx.finance("INV-ROTATE", 1_000 * USDC, 1_100 * USDC, START).unwrap();
}

#[test]
fn test_pools_with_different_identity_do_not_share_signatures() {
    let signer = KeyPair::generate();
    let mut a = Pool::new(&PoolConfig {
        pool_address: Address::new([0xa1; 20]),
        trusted_signer: signer.address(),
        admin: arcpool_integration_tests::admin(),
        ..PoolConfig::default()
    });
    let mut b = Pool::new(&PoolConfig {
        pool_address: Address::new([0xb1; 20]),
        trusted_signer: signer.address(),
        admin: arcpool_integration_tests::admin(),
        ..PoolConfig::default()
    });
    a.deposit(lp(1), 10_000 * USDC).unwrap();
    b.deposit(lp(1), 10_000 * USDC).unwrap();

    let t = terms("INV-XPOOL", 1_000 * USDC, 1_100 * USDC, START);
    let sig = sign(&a, &t, supplier(), &signer);
    a.withdraw_financing(supplier(), t.clone(), &sig.to_bytes(), START).unwrap();
    let err = b.withdraw_financing(supplier(), t, &sig.to_bytes(), START).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
}
