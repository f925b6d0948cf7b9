//! ArcPool settlement ledger.
//!
//! LP capital is tracked as shares in a [`ShareVault`]. Suppliers draw
//! advances through the [`FinancingLedger`] by presenting a typed-data
//! authorization that the [`AuthorizationVerifier`] checks against the trusted
//! pricing signer. Buyer repayments flow back into the vault and raise the
//! share price for every LP at once. [`AccessControl`] gates signer rotation
//! and pausing. [`PoolService`] serializes every mutation and commits it
//! through a [`LedgerStore`] before it becomes visible.

pub mod access;
pub mod auth;
pub mod clock;
pub mod error;
pub mod events;
pub mod financing;
pub mod math;
pub mod pool;
pub mod service;
pub mod store;
pub mod vault;

pub use access::AccessControl;
pub use auth::AuthorizationVerifier;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{
    AccessError, AuthorizationError, ErrorKind, LedgerError, LiquidityError, ReplayError,
    ValidationError,
};
pub use events::PoolEvent;
pub use financing::{
    FinancingLedger, FinancingRecord, FinancingStatus, FinancingTerms, LateFeePolicy,
    RepaymentQuote,
};
pub use pool::{
    DepositReceipt, InvariantViolation, InvoiceView, LpPosition, Pool, PoolStatus, PoolSummary,
    RepaymentReceipt, WithdrawalReceipt,
};
pub use service::PoolService;
pub use store::{LedgerStore, MemoryStore, SequencedEvent, StoreError};
pub use vault::ShareVault;
