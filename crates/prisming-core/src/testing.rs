//! In-memory ledger used by unit tests

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::Utc;

use crate::domain::{newtypes::TxId, record::RecordKind};
use crate::ports::{
    HistoryEntry, ILedger, LedgerEntry, ReadConflict, VersionedValue, WriteBatch, WriteOp,
};

struct Stored {
    kind: Option<RecordKind>,
    value: Vec<u8>,
    version: TxId,
}

#[derive(Default)]
struct State {
    values: BTreeMap<String, Stored>,
    history: BTreeMap<String, Vec<HistoryEntry>>,
}

/// Ledger that keeps everything in a mutex-guarded map
#[derive(Default)]
pub(crate) struct MemoryLedger {
    state: Mutex<State>,
    fail_commits: AtomicBool,
}

impl MemoryLedger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Makes every following commit fail before touching any key
    pub(crate) fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn commit_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        let mut ids: Vec<TxId> = state
            .history
            .values()
            .flatten()
            .map(|entry| entry.tx_id)
            .collect();
        ids.sort_by_key(|id| *id.as_uuid());
        ids.dedup();
        ids.len()
    }
}

#[async_trait::async_trait]
impl ILedger for MemoryLedger {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.get_versioned(key).await?.map(|v| v.value))
    }

    async fn get_versioned(&self, key: &str) -> anyhow::Result<Option<VersionedValue>> {
        let state = self.state.lock().unwrap();
        Ok(state.values.get(key).map(|stored| VersionedValue {
            value: stored.value.clone(),
            version: stored.version,
        }))
    }

    async fn put(&self, key: &str, value: &[u8]) -> anyhow::Result<TxId> {
        self.commit(WriteBatch::new().put(key, None, value.to_vec()))
            .await
    }

    async fn delete(&self, key: &str) -> anyhow::Result<TxId> {
        self.commit(WriteBatch::new().delete(key)).await
    }

    async fn range_scan(&self, start: &str, end: &str) -> anyhow::Result<Vec<LedgerEntry>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .values
            .range(start.to_string()..end.to_string())
            .map(|(key, stored)| LedgerEntry {
                key: key.clone(),
                value: stored.value.clone(),
            })
            .collect())
    }

    async fn scan_kind(&self, kind: RecordKind) -> anyhow::Result<Vec<LedgerEntry>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .values
            .iter()
            .filter(|(_, stored)| stored.kind == Some(kind))
            .map(|(key, stored)| LedgerEntry {
                key: key.clone(),
                value: stored.value.clone(),
            })
            .collect())
    }

    async fn history_scan(&self, key: &str) -> anyhow::Result<Vec<HistoryEntry>> {
        let state = self.state.lock().unwrap();
        Ok(state.history.get(key).cloned().unwrap_or_default())
    }

    async fn commit(&self, batch: WriteBatch) -> anyhow::Result<TxId> {
        if self.fail_commits.load(Ordering::SeqCst) {
            anyhow::bail!("simulated ledger outage");
        }
        let mut state = self.state.lock().unwrap();
        for read in &batch.reads {
            let current = state.values.get(&read.key).map(|stored| stored.version);
            if current != read.version {
                return Err(ReadConflict {
                    key: read.key.clone(),
                }
                .into());
            }
        }

        let tx_id = TxId::new();
        let timestamp = Utc::now();
        for op in batch.writes {
            match op {
                WriteOp::Put { key, kind, value } => {
                    let kind = kind.or_else(|| state.values.get(&key).and_then(|s| s.kind));
                    state.history.entry(key.clone()).or_default().push(HistoryEntry {
                        tx_id,
                        timestamp,
                        value: Some(value.clone()),
                    });
                    state.values.insert(
                        key,
                        Stored {
                            kind,
                            value,
                            version: tx_id,
                        },
                    );
                }
                WriteOp::Delete { key } => {
                    if state.values.remove(&key).is_some() {
                        state.history.entry(key).or_default().push(HistoryEntry {
                            tx_id,
                            timestamp,
                            value: None,
                        });
                    }
                }
            }
        }
        Ok(tx_id)
    }
}
