//! SQLite implementation of ILedger
//!
//! This module provides the concrete SQLite-based implementation of the
//! ledger port defined in prisming-core.
//!
//! ## Storage Layout
//!
//! | Table                 | Purpose                                        |
//! |-----------------------|------------------------------------------------|
//! | `ledger_state`        | Current value, kind tag and version per key    |
//! | `ledger_transactions` | One row per committed batch                    |
//! | `ledger_history`      | Every put and delete, ordered by `seq`         |
//!
//! Transaction ids are stored as 32-character hex strings and timestamps
//! as RFC 3339 text. A batch is applied inside a single SQL transaction,
//! so either all of its writes land or none do.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use prisming_core::domain::{RecordKind, TxId};
use prisming_core::ports::{
    HistoryEntry, ILedger, LedgerEntry, ReadConflict, VersionedValue, WriteBatch, WriteOp,
};

use crate::LedgerError;

/// SQLite-based implementation of the ledger port
///
/// All operations go through the connection pool. Commits take a
/// connection for the whole batch.
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    /// Creates a new ledger instance with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Number of batches committed so far
    pub async fn transaction_count(&self) -> anyhow::Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ledger_transactions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

// ============================================================================
// Row conversion helpers
// ============================================================================

fn parse_tx_id(raw: &str) -> Result<TxId, LedgerError> {
    TxId::from_str(raw)
        .map_err(|e| LedgerError::CorruptRow(format!("Invalid transaction id '{raw}': {e}")))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, LedgerError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| LedgerError::CorruptRow(format!("Invalid timestamp '{raw}': {e}")))
}

fn entry_from_row(row: &SqliteRow) -> LedgerEntry {
    LedgerEntry {
        key: row.get("key"),
        value: row.get("value"),
    }
}

fn history_from_row(row: &SqliteRow) -> Result<HistoryEntry, LedgerError> {
    let tx_id: String = row.get("tx_id");
    let recorded_at: String = row.get("recorded_at");
    Ok(HistoryEntry {
        tx_id: parse_tx_id(&tx_id)?,
        timestamp: parse_timestamp(&recorded_at)?,
        value: row.get("value"),
    })
}

// ============================================================================
// ILedger implementation
// ============================================================================

#[async_trait::async_trait]
impl ILedger for SqliteLedger {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let value: Option<Vec<u8>> =
            sqlx::query_scalar("SELECT value FROM ledger_state WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        tracing::trace!(key, found = value.is_some(), "Ledger get");
        Ok(value)
    }

    async fn get_versioned(&self, key: &str) -> anyhow::Result<Option<VersionedValue>> {
        let row = sqlx::query("SELECT value, version FROM ledger_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => {
                let version: String = r.get("version");
                Ok(Some(VersionedValue {
                    value: r.get("value"),
                    version: parse_tx_id(&version)?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &[u8]) -> anyhow::Result<TxId> {
        self.commit(WriteBatch::new().put(key, None, value.to_vec()))
            .await
    }

    async fn delete(&self, key: &str) -> anyhow::Result<TxId> {
        self.commit(WriteBatch::new().delete(key)).await
    }

    async fn range_scan(&self, start: &str, end: &str) -> anyhow::Result<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            "SELECT key, value FROM ledger_state WHERE key >= ? AND key < ? ORDER BY key",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(start, end, count = rows.len(), "Ledger range scan");
        Ok(rows.iter().map(entry_from_row).collect())
    }

    async fn scan_kind(&self, kind: RecordKind) -> anyhow::Result<Vec<LedgerEntry>> {
        let rows = sqlx::query("SELECT key, value FROM ledger_state WHERE kind = ? ORDER BY key")
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(kind = %kind, count = rows.len(), "Ledger kind scan");
        Ok(rows.iter().map(entry_from_row).collect())
    }

    async fn history_scan(&self, key: &str) -> anyhow::Result<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            "SELECT tx_id, value, recorded_at FROM ledger_history WHERE key = ? ORDER BY seq",
        )
        .bind(key)
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            entries.push(history_from_row(row)?);
        }
        Ok(entries)
    }

    async fn commit(&self, batch: WriteBatch) -> anyhow::Result<TxId> {
        let tx_id = TxId::new();
        let tx_id_str = tx_id.to_string();
        let now = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await?;

        // Writing first takes the write lock through the busy handler. A read
        // first would make the later upgrade fail with SQLITE_BUSY at once.
        sqlx::query(
            "INSERT INTO ledger_transactions (tx_id, committed_at, op_count) VALUES (?, ?, ?)",
        )
        .bind(&tx_id_str)
        .bind(&now)
        .bind(batch.writes.len() as i64)
        .execute(&mut *tx)
        .await?;

        // Read set is checked under the write lock
        for read in &batch.reads {
            let current: Option<String> =
                sqlx::query_scalar("SELECT version FROM ledger_state WHERE key = ?")
                    .bind(&read.key)
                    .fetch_optional(&mut *tx)
                    .await?;
            let expected = read.version.map(|v| v.to_string());
            if current != expected {
                tracing::debug!(key = %read.key, "Read set is stale, rejecting batch");
                return Err(ReadConflict {
                    key: read.key.clone(),
                }
                .into());
            }
        }

        for op in &batch.writes {
            match op {
                WriteOp::Put { key, kind, value } => {
                    sqlx::query(
                        r#"
                        INSERT INTO ledger_state (key, kind, value, version, updated_at)
                        VALUES (?, ?, ?, ?, ?)
                        ON CONFLICT(key) DO UPDATE SET
                            kind = COALESCE(excluded.kind, ledger_state.kind),
                            value = excluded.value,
                            version = excluded.version,
                            updated_at = excluded.updated_at
                        "#,
                    )
                    .bind(key)
                    .bind(kind.map(|k| k.as_str()))
                    .bind(value)
                    .bind(&tx_id_str)
                    .bind(&now)
                    .execute(&mut *tx)
                    .await?;

                    sqlx::query(
                        "INSERT INTO ledger_history (key, tx_id, value, recorded_at) VALUES (?, ?, ?, ?)",
                    )
                    .bind(key)
                    .bind(&tx_id_str)
                    .bind(value)
                    .bind(&now)
                    .execute(&mut *tx)
                    .await?;

                    tracing::trace!(key = %key, tx_id = %tx_id, "Staged put");
                }
                WriteOp::Delete { key } => {
                    let result = sqlx::query("DELETE FROM ledger_state WHERE key = ?")
                        .bind(key)
                        .execute(&mut *tx)
                        .await?;

                    if result.rows_affected() > 0 {
                        sqlx::query(
                            "INSERT INTO ledger_history (key, tx_id, value, recorded_at) VALUES (?, ?, NULL, ?)",
                        )
                        .bind(key)
                        .bind(&tx_id_str)
                        .bind(&now)
                        .execute(&mut *tx)
                        .await?;
                    }

                    tracing::trace!(
                        key = %key,
                        tx_id = %tx_id,
                        existed = result.rows_affected() > 0,
                        "Staged delete"
                    );
                }
            }
        }

        tx.commit().await?;

        tracing::debug!(
            tx_id = %tx_id,
            reads = batch.reads.len(),
            writes = batch.writes.len(),
            "Committed ledger batch"
        );
        Ok(tx_id)
    }
}
