//! ArcPool core primitives.
//!
//! Fixed-width identities shared by every crate in the workspace: 20-byte
//! account addresses, 32-byte invoice ids, Unix-second timestamps, and the
//! deployment-level pool configuration.

pub mod config;
pub mod error;
pub mod types;

pub use config::PoolConfig;
pub use error::CoreError;
pub use types::{Address, InvoiceId, Timestamp, SECONDS_PER_DAY};
