//! Integration test: pausing, signer rotation and the admin role.

use arcpool_core::Address;
use arcpool_integration_tests::{admin, buyer, lp, PoolFixture, START, USDC};
use arcpool_ledger::{AccessError, ErrorKind, LedgerError, PoolEvent, ValidationError};

#[test]
fn test_pause_blocks_new_exposure_only() {
    let mut fx = PoolFixture::new();
    fx.pool.deposit(lp(1), 10_000 * USDC).unwrap();
    let record = fx.finance("INV-PAUSE", 4_000 * USDC, 4_100 * USDC, START).unwrap();

    assert!(fx.pool.pause(&admin()).unwrap());
    assert!(fx.pool.is_paused());

    let err = fx.pool.deposit(lp(2), 1_000 * USDC).unwrap_err();
    assert_eq!(err, LedgerError::Access(AccessError::Paused));
    let err = fx.finance("INV-PAUSE-2", 1_000 * USDC, 1_100 * USDC, START).unwrap_err();
    assert_eq!(err, LedgerError::Access(AccessError::Paused));

    // LPs can still leave and buyers can still settle.
    fx.pool.withdraw_assets(lp(1), 1_000 * USDC).unwrap();
    fx.pool.repay(&record.invoice_id, buyer(), 4_100 * USDC, START).unwrap();

    assert!(fx.pool.unpause(&admin()).unwrap());
    fx.pool.deposit(lp(2), 1_000 * USDC).unwrap();
}

#[test]
fn test_pause_is_idempotent() {
    let mut fx = PoolFixture::new();
    fx.pool.take_events();
    assert!(fx.pool.pause(&admin()).unwrap());
    assert!(!fx.pool.pause(&admin()).unwrap());
    assert_eq!(fx.pool.take_events(), vec![PoolEvent::Paused { by: admin() }]);

    assert!(fx.pool.unpause(&admin()).unwrap());
    assert!(!fx.pool.unpause(&admin()).unwrap());
    assert_eq!(fx.pool.take_events().len(), 1);
}

#[test]
fn test_admin_operations_require_admin() {
    let mut fx = PoolFixture::new();
    let outsider = Address::new([0x99; 20]);

    for err in [
        fx.pool.pause(&outsider).unwrap_err(),
        fx.pool.update_signer(&outsider, outsider).unwrap_err(),
        fx.pool.grant_admin(&outsider, outsider).unwrap_err(),
        fx.pool.revoke_admin(&outsider, admin()).unwrap_err(),
    ] {
        assert_eq!(err, LedgerError::Access(AccessError::NotAdmin(outsider)));
        assert_eq!(err.kind(), ErrorKind::Access);
    }
    assert!(!fx.pool.is_paused());
    assert_eq!(fx.pool.trusted_signer(), fx.signer.address());
}

#[test]
fn test_signer_cannot_be_zero() {
    let mut fx = PoolFixture::new();
    let err = fx.pool.update_signer(&admin(), Address::ZERO).unwrap_err();
    assert_eq!(err, LedgerError::Validation(ValidationError::ZeroAddress));
}

#[test]
fn test_last_admin_cannot_be_removed() {
    let mut fx = PoolFixture::new();
    let err = fx.pool.revoke_admin(&admin(), admin()).unwrap_err();
    assert_eq!(err, LedgerError::Access(AccessError::LastAdmin(admin())));

    let second = Address::new([0xae; 20]);
    assert!(fx.pool.grant_admin(&admin(), second).unwrap());
    assert!(!fx.pool.grant_admin(&admin(), second).unwrap());

    // The new admin can retire the original one, then becomes the last.
    assert!(fx.pool.revoke_admin(&second, admin()).unwrap());
    assert!(!fx.pool.is_admin(&admin()));
    let err = fx.pool.revoke_admin(&second, second).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Access);
    assert!(fx.pool.pause(&second).unwrap());
}
