//! Property test: no sequence of operations breaks pool accounting.

use arcpool_integration_tests::{admin, buyer, lp, PoolFixture, START, USDC};
use arcpool_core::SECONDS_PER_DAY;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Deposit { who: u8, amount: u128 },
    Withdraw { who: u8, amount: u128 },
    Redeem { who: u8, shares: u128 },
    Finance { payout: u128, margin: u128 },
    Repay { index: usize, extra: u128 },
    Wait { days: u64 },
    TogglePause,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (1u8..4, 1u128..50_000 * USDC).prop_map(|(who, amount)| Op::Deposit { who, amount }),
        2 => (1u8..4, 1u128..20_000 * USDC).prop_map(|(who, amount)| Op::Withdraw { who, amount }),
        2 => (1u8..4, 1u128..20_000 * USDC).prop_map(|(who, shares)| Op::Redeem { who, shares }),
        3 => (1u128..30_000 * USDC, 1u128..2_000 * USDC)
            .prop_map(|(payout, margin)| Op::Finance { payout, margin }),
        3 => (0usize..8, 0u128..100 * USDC).prop_map(|(index, extra)| Op::Repay { index, extra }),
        1 => (0u64..40).prop_map(|days| Op::Wait { days }),
        1 => Just(Op::TogglePause),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_pool_stays_solvent(ops in proptest::collection::vec(op(), 1..40)) {
        let mut fx = PoolFixture::new();
        let mut now = START;
        let mut invoices = Vec::new();

        for (step, op) in ops.into_iter().enumerate() {
            let before = fx.pool.clone();
            let result = match op {
                Op::Deposit { who, amount } => fx.pool.deposit(lp(who), amount).map(|_| ()),
                Op::Withdraw { who, amount } => fx.pool.withdraw_assets(lp(who), amount).map(|_| ()),
                Op::Redeem { who, shares } => fx.pool.redeem_shares(lp(who), shares).map(|_| ()),
                Op::Finance { payout, margin } => {
                    let reference = format!("INV-{}", step);
                    fx.finance(&reference, payout, payout + margin, now).map(|record| {
                        invoices.push(record.invoice_id);
                    })
                }
                Op::Repay { index, extra } => match invoices.get(index) {
                    Some(id) => {
                        let due = fx.pool.minimum_repayment(id, now).map(|q| q.total_due);
                        match due {
                            Ok(due) => fx.pool.repay(id, buyer(), due + extra, now).map(|_| ()),
                            Err(e) => Err(e),
                        }
                    }
                    None => Ok(()),
                },
                Op::Wait { days } => {
                    now += days * SECONDS_PER_DAY;
                    Ok(())
                }
                Op::TogglePause => {
                    if fx.pool.is_paused() {
                        fx.pool.unpause(&admin()).map(|_| ())
                    } else {
                        fx.pool.pause(&admin()).map(|_| ())
                    }
                }
            };

            if result.is_err() {
                prop_assert_eq!(&fx.pool, &before);
            }
            prop_assert!(fx.pool.check_invariants().is_ok());

            let status = fx.pool.pool_status();
            prop_assert_eq!(status.total, status.available + status.utilized);
            let owed: u128 = fx
                .pool
                .ledger()
                .records()
                .filter(|r| !r.repaid)
                .map(|r| r.payout_amount)
                .sum();
            prop_assert_eq!(status.utilized, owed);
            let lp_value: u128 = (1u8..4).map(|n| fx.pool.lp_asset_value(&lp(n))).sum();
            prop_assert!(lp_value <= status.total);
        }
    }
}
