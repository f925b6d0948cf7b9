//! RocksDB storage backend for the ArcPool node.

use arcpool_ledger::{FinancingRecord, LedgerStore, Pool, PoolEvent, SequencedEvent, StoreError};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// Column family names for different data types.
const CF_POOL: &str = "pool";
const CF_RECORDS: &str = "records";
const CF_EVENTS: &str = "events";
const CF_META: &str = "meta";

const HEAD_KEY: &[u8] = b"head";
const NEXT_SEQ_KEY: &[u8] = b"next_seq";

fn backend(e: rocksdb::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// RocksDB-backed ledger store. Every commit is a single `WriteBatch`.
///
/// `pool` holds the pool head, `records` one financing record per 32-byte
/// invoice id, `events` the log keyed by big-endian sequence number.
pub struct RocksStore {
    db: DB,
    /// Next event sequence number. Held across a commit so sequence numbers
    /// are assigned in write order.
    next_seq: Mutex<u64>,
}

impl RocksStore {
    /// Open or create a RocksDB database at the given path with column families.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path).map_err(|e| StoreError::Backend(e.to_string()))?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_POOL, Options::default()),
            ColumnFamilyDescriptor::new(CF_RECORDS, Options::default()),
            ColumnFamilyDescriptor::new(CF_EVENTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_META, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors).map_err(backend)?;

        let next_seq = {
            let meta = db
                .cf_handle(CF_META)
                .ok_or_else(|| StoreError::Backend(format!("column family '{}' not found", CF_META)))?;
            match db.get_cf(meta, NEXT_SEQ_KEY).map_err(backend)? {
                Some(bytes) => decode_seq(&bytes)?,
                None => 0,
            }
        };
        tracing::debug!(path = %path.display(), next_seq, "opened ledger store");

        Ok(Self {
            db,
            next_seq: Mutex::new(next_seq),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Backend(format!("column family '{}' not found", name)))
    }
}

fn decode_seq(bytes: &[u8]) -> Result<u64, StoreError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StoreError::Corrupt(format!("sequence number has {} bytes", bytes.len())))?;
    Ok(u64::from_be_bytes(arr))
}

impl LedgerStore for RocksStore {
    fn load(&self) -> Result<Option<Pool>, StoreError> {
        let Some(head) = self.db.get_cf(self.cf(CF_POOL)?, HEAD_KEY).map_err(backend)? else {
            return Ok(None);
        };
        let mut pool: Pool =
            serde_json::from_slice(&head).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let mut restored = 0usize;
        for item in self.db.iterator_cf(self.cf(CF_RECORDS)?, IteratorMode::Start) {
            let (key, value) = item.map_err(backend)?;
            let record: FinancingRecord =
                serde_json::from_slice(&value).map_err(|e| StoreError::Corrupt(e.to_string()))?;
            if key.as_ref() != record.invoice_id.as_bytes() {
                return Err(StoreError::Corrupt(format!(
                    "record {} stored under a different key",
                    record.invoice_id
                )));
            }
            pool.restore_record(record);
            restored += 1;
        }
        tracing::debug!(records = restored, "loaded pool");
        Ok(Some(pool))
    }

    fn commit(
        &self,
        pool: &Pool,
        records: &[&FinancingRecord],
        events: &[PoolEvent],
    ) -> Result<Vec<SequencedEvent>, StoreError> {
        let head = serde_json::to_vec(pool)?;
        let mut next_seq = self.next_seq.lock().unwrap_or_else(PoisonError::into_inner);

        let mut batch = WriteBatch::default();
        batch.put_cf(self.cf(CF_POOL)?, HEAD_KEY, head);

        let records_cf = self.cf(CF_RECORDS)?;
        for record in records {
            batch.put_cf(records_cf, record.invoice_id.as_bytes(), serde_json::to_vec(record)?);
        }

        let events_cf = self.cf(CF_EVENTS)?;
        let mut sequenced = Vec::with_capacity(events.len());
        for (i, event) in events.iter().enumerate() {
            let entry = SequencedEvent {
                seq: *next_seq + i as u64,
                event: event.clone(),
            };
            batch.put_cf(events_cf, entry.seq.to_be_bytes(), serde_json::to_vec(&entry)?);
            sequenced.push(entry);
        }
        let new_next = *next_seq + events.len() as u64;
        batch.put_cf(self.cf(CF_META)?, NEXT_SEQ_KEY, new_next.to_be_bytes());

        self.db.write(batch).map_err(backend)?;
        *next_seq = new_next;
        Ok(sequenced)
    }

    fn events_since(&self, from: u64, limit: usize) -> Result<Vec<SequencedEvent>, StoreError> {
        let start = from.to_be_bytes();
        let iter = self
            .db
            .iterator_cf(self.cf(CF_EVENTS)?, IteratorMode::From(&start, Direction::Forward));
        let mut out = Vec::new();
        for item in iter.take(limit) {
            let (_, value) = item.map_err(backend)?;
            let entry: SequencedEvent =
                serde_json::from_slice(&value).map_err(|e| StoreError::Corrupt(e.to_string()))?;
            out.push(entry);
        }
        Ok(out)
    }
}
