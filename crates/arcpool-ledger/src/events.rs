use arcpool_core::{Address, InvoiceId, Timestamp};
use serde::{Deserialize, Serialize};

use arcpool_core::types::amount_string;

/// State changes emitted by successful pool operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PoolEvent {
    Deposit {
        lp: Address,
        #[serde(with = "amount_string")]
        assets: u128,
        #[serde(with = "amount_string")]
        shares: u128,
        #[serde(with = "amount_string")]
        new_total_pool_size: u128,
    },
    Withdrawal {
        lp: Address,
        #[serde(with = "amount_string")]
        assets: u128,
        #[serde(with = "amount_string")]
        shares: u128,
    },
    FinancingWithdrawn {
        invoice_id: InvoiceId,
        supplier: Address,
        #[serde(with = "amount_string")]
        payout_amount: u128,
        timestamp: Timestamp,
    },
    Repayment {
        invoice_id: InvoiceId,
        payer: Address,
        #[serde(with = "amount_string")]
        amount: u128,
        #[serde(with = "amount_string")]
        interest: u128,
        timestamp: Timestamp,
    },
    SignerUpdated {
        old: Address,
        new: Address,
    },
    Paused {
        by: Address,
    },
    Unpaused {
        by: Address,
    },
    AdminGranted {
        account: Address,
        by: Address,
    },
    AdminRevoked {
        account: Address,
        by: Address,
    },
}

impl PoolEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Deposit { .. } => "Deposit",
            Self::Withdrawal { .. } => "Withdrawal",
            Self::FinancingWithdrawn { .. } => "FinancingWithdrawn",
            Self::Repayment { .. } => "Repayment",
            Self::SignerUpdated { .. } => "SignerUpdated",
            Self::Paused { .. } => "Paused",
            Self::Unpaused { .. } => "Unpaused",
            Self::AdminGranted { .. } => "AdminGranted",
            Self::AdminRevoked { .. } => "AdminRevoked",
        }
    }
}
