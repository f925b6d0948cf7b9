use arcpool_core::{Address, InvoiceId, Timestamp};
use serde::Serialize;
use std::fmt;

use crate::store::StoreError;

/// Coarse error category, stable across variants. Surfaces map onto this
/// (HTTP status codes, CLI exit messages).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Authorization,
    Replay,
    Liquidity,
    NotFound,
    Access,
    Storage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::Authorization => "authorization",
            Self::Replay => "replay",
            Self::Liquidity => "liquidity",
            Self::NotFound => "not_found",
            Self::Access => "access",
            Self::Storage => "storage",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("amount must be greater than 0")]
    ZeroAmount,

    #[error("repayment amount {repayment} must be greater than payout amount {payout}")]
    RepaymentNotAbovePayout { payout: u128, repayment: u128 },

    #[error("payment {payment} is below the minimum due {minimum}")]
    PaymentBelowMinimum { payment: u128, minimum: u128 },

    #[error("deposit of {amount} is too small to mint a share")]
    DepositTooSmall { amount: u128 },

    #[error("arithmetic overflow computing {0}")]
    AmountOverflow(&'static str),

    #[error("address must be non-zero")]
    ZeroAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorizationError {
    #[error("signature expired: deadline {deadline} is before now {now}")]
    Expired { deadline: Timestamp, now: Timestamp },

    #[error("invalid signature: recovered {recovered}, trusted signer is {expected}")]
    InvalidSigner { expected: Address, recovered: Address },

    #[error("malformed signature: {0}")]
    MalformedSignature(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    #[error("invoice {0} already financed")]
    InvoiceAlreadyFinanced(InvoiceId),

    #[error("invoice {0} already repaid")]
    AlreadyRepaid(InvoiceId),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiquidityError {
    #[error("insufficient pool liquidity: available {available}, requested {requested}")]
    InsufficientLiquidity { available: u128, requested: u128 },

    #[error("insufficient shares: balance {balance}, required {required}")]
    InsufficientShares { balance: u128, required: u128 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("caller {0} is not an admin")]
    NotAdmin(Address),

    #[error("pool is paused")]
    Paused,

    #[error("cannot revoke {0}: it is the last admin")]
    LastAdmin(Address),
}

/// Every failure a ledger operation can report. All of them leave the pool
/// exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("authorization error: {0}")]
    Authorization(#[from] AuthorizationError),

    #[error("replay error: {0}")]
    Replay(#[from] ReplayError),

    #[error("liquidity error: {0}")]
    Liquidity(#[from] LiquidityError),

    #[error("financing record not found for invoice {0}")]
    NotFound(InvoiceId),

    #[error("access error: {0}")]
    Access(#[from] AccessError),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Authorization(_) => ErrorKind::Authorization,
            Self::Replay(_) => ErrorKind::Replay,
            Self::Liquidity(_) => ErrorKind::Liquidity,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Access(_) => ErrorKind::Access,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}
