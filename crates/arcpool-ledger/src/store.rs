//! Persistence seam for the pool.
//!
//! A store keeps the pool head (vault, verifier, access and totals), one entry
//! per financing record keyed by invoice id, and an append-only event log.
//! Each successful operation is one `commit`: the new head, the records it
//! touched and the events it produced land together or not at all.

use arcpool_core::InvoiceId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use crate::events::PoolEvent;
use crate::financing::FinancingRecord;
use crate::pool::Pool;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("storage backend failure: {0}")]
    Backend(String),

    #[error("stored data is corrupt: {0}")]
    Corrupt(String),

    #[error("stored pool does not match configuration: {0}")]
    ConfigMismatch(String),

    #[error("invalid pool configuration: {0}")]
    InvalidConfig(#[from] arcpool_core::CoreError),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// An event with its position in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencedEvent {
    pub seq: u64,
    #[serde(flatten)]
    pub event: PoolEvent,
}

pub trait LedgerStore: Send + Sync {
    /// The last committed pool with every stored record restored, if any.
    fn load(&self) -> Result<Option<Pool>, StoreError>;

    /// Atomically persist the head of `pool`, overwrite the entries of
    /// `records` and append `events`. Records not listed are left as stored.
    /// Returns the events with their assigned sequence numbers.
    fn commit(
        &self,
        pool: &Pool,
        records: &[&FinancingRecord],
        events: &[PoolEvent],
    ) -> Result<Vec<SequencedEvent>, StoreError>;

    /// Up to `limit` events with `seq >= from`, in order.
    fn events_since(&self, from: u64, limit: usize) -> Result<Vec<SequencedEvent>, StoreError>;
}

#[derive(Default)]
struct MemoryInner {
    head: Option<String>,
    records: BTreeMap<InvoiceId, String>,
    events: Vec<SequencedEvent>,
}

/// In-process store. Everything is kept serialized so a load always returns
/// an independent copy, as a disk store would.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .events
            .len()
    }

    pub fn record_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .len()
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<Option<Pool>, StoreError> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(head) = &inner.head else {
            return Ok(None);
        };
        let mut pool: Pool = serde_json::from_str(head)?;
        for json in inner.records.values() {
            pool.restore_record(serde_json::from_str(json)?);
        }
        Ok(Some(pool))
    }

    fn commit(
        &self,
        pool: &Pool,
        records: &[&FinancingRecord],
        events: &[PoolEvent],
    ) -> Result<Vec<SequencedEvent>, StoreError> {
        let head = serde_json::to_string(pool)?;
        let records = records
            .iter()
            .map(|r| Ok((r.invoice_id, serde_json::to_string(r)?)))
            .collect::<Result<Vec<_>, StoreError>>()?;
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let first = inner.events.len() as u64;
        let sequenced: Vec<SequencedEvent> = events
            .iter()
            .enumerate()
            .map(|(i, event)| SequencedEvent {
                seq: first + i as u64,
                event: event.clone(),
            })
            .collect();
        inner.head = Some(head);
        inner.records.extend(records);
        inner.events.extend(sequenced.iter().cloned());
        Ok(sequenced)
    }

    fn events_since(&self, from: u64, limit: usize) -> Result<Vec<SequencedEvent>, StoreError> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(inner
            .events
            .iter()
            .skip(from as usize)
            .take(limit)
            .cloned()
            .collect())
    }
}
