//! Typed repository over the ledger port
//!
//! [`LedgerRepository`] reads and lists records by kind, and opens
//! [`LedgerTransaction`]s. A transaction keeps a working copy of every
//! record it touches, remembers the version of each key it read, and
//! writes everything in a single [`WriteBatch`] on commit. Reads made
//! after a staged write see the staged value.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::{
    errors::DomainError,
    newtypes::{RecordId, TxId},
    record::{LedgerRecord, RecordKind},
};
use crate::ports::{HistoryEntry, ILedger, LedgerEntry, WriteBatch, WriteOp};

// ============================================================================
// ScanStrategy
// ============================================================================

/// How a category of records is located for listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStrategy {
    /// Use the ledger's kind index
    KindIndex,
    /// Scan the half-open key range `[start, end)`
    KeyRange { start: String, end: String },
}

// ============================================================================
// Record decoding
// ============================================================================

#[derive(Deserialize)]
struct Envelope {
    doctype: Option<String>,
}

/// Kind declared by a stored value
enum Declared {
    Kind(RecordKind),
    Untagged,
    NotARecord,
}

fn declared_kind(bytes: &[u8]) -> Declared {
    match serde_json::from_slice::<Envelope>(bytes) {
        Ok(Envelope { doctype: None }) => Declared::Untagged,
        Ok(Envelope { doctype: Some(raw) }) => match raw.parse::<RecordKind>() {
            Ok(kind) => Declared::Kind(kind),
            Err(_) => Declared::NotARecord,
        },
        Err(_) => Declared::NotARecord,
    }
}

fn decode<T: LedgerRecord>(key: &str, bytes: &[u8]) -> Result<T> {
    match declared_kind(bytes) {
        Declared::Kind(found) if found != T::KIND => {
            return Err(DomainError::KindMismatch {
                id: key.to_string(),
                expected: T::KIND,
                found,
            }
            .into());
        }
        Declared::NotARecord => {
            return Err(DomainError::InvalidArgument(format!(
                "Value stored under '{key}' is not a {} record",
                T::KIND
            ))
            .into());
        }
        _ => {}
    }
    serde_json::from_slice(bytes).with_context(|| format!("Failed to decode {} '{key}'", T::KIND))
}

fn encode<T: LedgerRecord>(record: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(record)
        .with_context(|| format!("Failed to encode {} '{}'", T::KIND, record.record_id()))
}

// ============================================================================
// LedgerRepository
// ============================================================================

/// Typed access to ledger records
#[derive(Clone)]
pub struct LedgerRepository {
    ledger: Arc<dyn ILedger + Send + Sync>,
}

impl LedgerRepository {
    pub fn new(ledger: Arc<dyn ILedger + Send + Sync>) -> Self {
        Self { ledger }
    }

    /// Opens a transaction over this repository's ledger
    pub fn begin(&self) -> LedgerTransaction {
        LedgerTransaction::new(Arc::clone(&self.ledger))
    }

    /// Reads a record outside of any transaction
    pub async fn find<T: LedgerRecord>(&self, id: &RecordId) -> Result<Option<T>> {
        let bytes = self
            .ledger
            .get(id.as_str())
            .await
            .with_context(|| format!("Failed to read {} '{id}'", T::KIND))?;
        match bytes {
            Some(bytes) if !bytes.is_empty() => decode(id.as_str(), &bytes).map(Some),
            _ => Ok(None),
        }
    }

    /// Lists every record of kind `T` in key order
    ///
    /// With [`ScanStrategy::KeyRange`], entries in the range that declare
    /// another kind are skipped; undecodable entries fail the call.
    pub async fn list<T: LedgerRecord>(&self, strategy: &ScanStrategy) -> Result<Vec<T>> {
        let entries: Vec<LedgerEntry> = match strategy {
            ScanStrategy::KindIndex => self
                .ledger
                .scan_kind(T::KIND)
                .await
                .with_context(|| format!("Failed to scan {} records", T::KIND))?,
            ScanStrategy::KeyRange { start, end } => self
                .ledger
                .range_scan(start, end)
                .await
                .with_context(|| format!("Failed to scan keys [{start}, {end})"))?,
        };

        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.value.is_empty() {
                continue;
            }
            if let Declared::Kind(found) = declared_kind(&entry.value) {
                if found != T::KIND {
                    tracing::debug!(key = %entry.key, kind = %found, "Skipping record of another kind");
                    continue;
                }
            }
            records.push(decode::<T>(&entry.key, &entry.value)?);
        }
        Ok(records)
    }

    /// Reads the raw bytes stored under any key
    pub async fn raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.ledger
            .get(key)
            .await
            .with_context(|| format!("Failed to read key '{key}'"))
    }

    /// Reads the change history of any key
    pub async fn history(&self, key: &str) -> Result<Vec<HistoryEntry>> {
        self.ledger
            .history_scan(key)
            .await
            .with_context(|| format!("Failed to read history of '{key}'"))
    }
}

// ============================================================================
// LedgerTransaction
// ============================================================================

/// A unit of work against the ledger
///
/// Nothing reaches the ledger until [`LedgerTransaction::commit`]. Dropping
/// a transaction discards its staged writes.
pub struct LedgerTransaction {
    ledger: Arc<dyn ILedger + Send + Sync>,
    /// Version of each key as first read from the ledger
    reads: BTreeMap<String, Option<TxId>>,
    /// Staged state per key: `Some` for a put, `None` for a delete
    working: HashMap<String, Option<Vec<u8>>>,
    writes: Vec<WriteOp>,
}

impl LedgerTransaction {
    fn new(ledger: Arc<dyn ILedger + Send + Sync>) -> Self {
        Self {
            ledger,
            reads: BTreeMap::new(),
            working: HashMap::new(),
            writes: Vec::new(),
        }
    }

    async fn read_raw(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(staged) = self.working.get(key) {
            return Ok(staged.clone());
        }
        let current = self
            .ledger
            .get_versioned(key)
            .await
            .with_context(|| format!("Failed to read key '{key}'"))?;
        let (value, version) = match current {
            Some(current) => (Some(current.value), Some(current.version)),
            None => (None, None),
        };
        self.reads.entry(key.to_string()).or_insert(version);
        Ok(value.filter(|bytes| !bytes.is_empty()))
    }

    fn push_write(&mut self, op: WriteOp) {
        self.writes.retain(|existing| existing.key() != op.key());
        self.writes.push(op);
    }

    /// Returns true if any non-empty value is stored under `id`
    pub async fn exists(&mut self, id: &RecordId) -> Result<bool> {
        Ok(self.read_raw(id.as_str()).await?.is_some())
    }

    /// Reads a record, seeing writes staged earlier in this transaction
    pub async fn find<T: LedgerRecord>(&mut self, id: &RecordId) -> Result<Option<T>> {
        match self.read_raw(id.as_str()).await? {
            Some(bytes) => decode(id.as_str(), &bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Reads a record that must exist
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the key is absent or empty, and
    /// `DomainError::KindMismatch` if it holds another kind of record.
    pub async fn load<T: LedgerRecord>(&mut self, id: &RecordId) -> Result<T> {
        match self.find(id).await? {
            Some(record) => Ok(record),
            None => Err(DomainError::NotFound {
                kind: T::KIND,
                id: id.to_string(),
            }
            .into()),
        }
    }

    /// Fails with `DomainError::AlreadyExists` if `id` is taken
    pub async fn ensure_vacant(&mut self, kind: RecordKind, id: &RecordId) -> Result<()> {
        if self.exists(id).await? {
            return Err(DomainError::AlreadyExists {
                kind,
                id: id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Stages a full rewrite of `record` under its own id
    pub fn stage<T: LedgerRecord>(&mut self, record: &T) -> Result<()> {
        let value = encode(record)?;
        let key = record.record_id().to_string();
        self.working.insert(key.clone(), Some(value.clone()));
        self.push_write(WriteOp::Put {
            key,
            kind: Some(T::KIND),
            value,
        });
        Ok(())
    }

    /// Stages the deletion of `id`
    pub fn stage_delete(&mut self, id: &RecordId) {
        let key = id.to_string();
        self.working.insert(key.clone(), None);
        self.push_write(WriteOp::Delete { key });
    }

    /// Number of keys with staged writes
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// Sends the read set and staged writes to the ledger as one batch
    ///
    /// # Errors
    ///
    /// Fails if the ledger rejects the batch, including with
    /// [`crate::ports::ReadConflict`] when a key read by this transaction
    /// was modified in the meantime. Nothing is written in that case.
    pub async fn commit(self) -> Result<TxId> {
        let batch = WriteBatch {
            reads: self
                .reads
                .into_iter()
                .map(|(key, version)| crate::ports::ReadVersion { key, version })
                .collect(),
            writes: self.writes,
        };
        let write_count = batch.writes.len();
        let tx_id = self
            .ledger
            .commit(batch)
            .await
            .context("Failed to commit ledger transaction")?;
        tracing::trace!(tx_id = %tx_id, writes = write_count, "Committed ledger transaction");
        Ok(tx_id)
    }
}
