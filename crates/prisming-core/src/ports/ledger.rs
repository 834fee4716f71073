//! Ledger port (driven/secondary port)
//!
//! This module defines the interface to the key-value ledger that holds
//! every record: single-key reads and writes, ordered range and kind
//! scans, per-key change history, and atomic multi-key commits.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific.
//!   The one failure the core must recognise, a stale read set, is the
//!   [`ReadConflict`] error, which adapters return inside the `anyhow::Error`.
//! - Keys are plain strings and values opaque bytes; typed access lives
//!   in [`crate::repository`].
//! - Every write receives a [`TxId`]. The id of the last transaction that
//!   wrote a key is that key's version.

use chrono::{DateTime, Utc};

use crate::domain::{newtypes::TxId, record::RecordKind};

// ============================================================================
// Value types
// ============================================================================

/// A stored value together with the transaction that wrote it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedValue {
    pub value: Vec<u8>,
    pub version: TxId,
}

/// A key/value pair returned by scans
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub key: String,
    pub value: Vec<u8>,
}

/// One change to a key, as recorded by the history index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub tx_id: TxId,
    pub timestamp: DateTime<Utc>,
    /// `None` when the transaction deleted the key
    pub value: Option<Vec<u8>>,
}

impl HistoryEntry {
    pub fn is_delete(&self) -> bool {
        self.value.is_none()
    }
}

// ============================================================================
// WriteBatch
// ============================================================================

/// A single write inside a [`WriteBatch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Store `value` under `key`. `kind` tags the key for kind scans;
    /// untagged writes keep whatever tag the key already had.
    Put {
        key: String,
        kind: Option<RecordKind>,
        value: Vec<u8>,
    },
    /// Remove `key` and its kind tag
    Delete { key: String },
}

impl WriteOp {
    pub fn key(&self) -> &str {
        match self {
            WriteOp::Put { key, .. } | WriteOp::Delete { key } => key,
        }
    }
}

/// Version of a key observed by a transaction before it wrote anything
///
/// `version: None` records that the key was absent when read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadVersion {
    pub key: String,
    pub version: Option<TxId>,
}

/// An ordered set of writes applied atomically, guarded by a read set
///
/// Adapters must apply either every operation or none, and must reject
/// the batch with [`ReadConflict`] if any key in `reads` no longer has
/// the recorded version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    pub reads: Vec<ReadVersion>,
    pub writes: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tagged put
    pub fn put(mut self, key: impl Into<String>, kind: Option<RecordKind>, value: Vec<u8>) -> Self {
        self.writes.push(WriteOp::Put {
            key: key.into(),
            kind,
            value,
        });
        self
    }

    /// Adds a delete
    pub fn delete(mut self, key: impl Into<String>) -> Self {
        self.writes.push(WriteOp::Delete { key: key.into() });
        self
    }

    /// Adds a read-set guard
    pub fn expect_version(mut self, key: impl Into<String>, version: Option<TxId>) -> Self {
        self.reads.push(ReadVersion {
            key: key.into(),
            version,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Returned by [`ILedger::commit`] when a key changed after it was read
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Read conflict on key '{key}': it was modified by another transaction")]
pub struct ReadConflict {
    pub key: String,
}

// ============================================================================
// ILedger trait
// ============================================================================

/// Port trait for the key-value ledger
///
/// ## Implementation Notes
///
/// - Scans return entries in ascending byte order of their keys.
/// - `range_scan` is half-open: `start <= key < end`.
/// - `history_scan` returns entries oldest first and includes deletions.
/// - `put` and `delete` behave like a one-operation `commit` with no read set.
#[async_trait::async_trait]
pub trait ILedger: Send + Sync {
    /// Reads the current value of a key
    async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;

    /// Reads the current value of a key along with its version
    async fn get_versioned(&self, key: &str) -> anyhow::Result<Option<VersionedValue>>;

    /// Writes a single untagged value
    async fn put(&self, key: &str, value: &[u8]) -> anyhow::Result<TxId>;

    /// Deletes a single key. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> anyhow::Result<TxId>;

    /// Lists entries whose key falls in `[start, end)`
    async fn range_scan(&self, start: &str, end: &str) -> anyhow::Result<Vec<LedgerEntry>>;

    /// Lists entries tagged with `kind`
    async fn scan_kind(&self, kind: RecordKind) -> anyhow::Result<Vec<LedgerEntry>>;

    /// Lists every recorded change to `key`, oldest first
    async fn history_scan(&self, key: &str) -> anyhow::Result<Vec<HistoryEntry>>;

    /// Applies a batch atomically and returns its transaction id
    async fn commit(&self, batch: WriteBatch) -> anyhow::Result<TxId>;
}
