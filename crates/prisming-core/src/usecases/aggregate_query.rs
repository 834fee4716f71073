//! Aggregate query use case
//!
//! Read-only access to the ledger: raw key lookups, a snapshot of every
//! record grouped by kind, and the change history of an asset.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::{
    config::QueryConfig,
    domain::{
        Asset, AssetHistoryEntry, DomainError, Donor, LedgerRecord, LedgerSnapshot, Need, Npo,
        Recipient, RecordId,
    },
    ports::ILedger,
    repository::LedgerRepository,
};

/// Use case for queries that span the whole ledger
pub struct AggregateQueryUseCase {
    repository: LedgerRepository,
    query: QueryConfig,
}

impl AggregateQueryUseCase {
    /// Creates a new AggregateQueryUseCase
    ///
    /// `query` selects how `read_everything` locates each record category.
    pub fn new(ledger: Arc<dyn ILedger + Send + Sync>, query: QueryConfig) -> Self {
        Self {
            repository: LedgerRepository::new(ledger),
            query,
        }
    }

    /// Returns the bytes stored under any key
    ///
    /// # Errors
    ///
    /// Returns `DomainError::KeyNotFound` if nothing is stored under `key`.
    pub async fn query(&self, key: &str) -> Result<Vec<u8>> {
        match self.repository.raw(key).await? {
            Some(bytes) => Ok(bytes),
            None => Err(DomainError::KeyNotFound {
                key: key.to_string(),
            }
            .into()),
        }
    }

    /// Lists every donor, NPO, recipient, asset and need in key order
    pub async fn read_everything(&self) -> Result<LedgerSnapshot> {
        let snapshot = LedgerSnapshot {
            donors: self.list::<Donor>().await?,
            npos: self.list::<Npo>().await?,
            recipients: self.list::<Recipient>().await?,
            assets: self.list::<Asset>().await?,
            needs: self.list::<Need>().await?,
        };
        debug!(
            records = snapshot.len(),
            scan_mode = ?self.query.scan_mode,
            "Read everything"
        );
        Ok(snapshot)
    }

    /// Returns every recorded change of an asset, oldest first
    ///
    /// A deletion is flagged and carries the zero-valued [`Asset`]. A key with no
    /// history yields an empty list.
    pub async fn get_history(&self, asset_id: &RecordId) -> Result<Vec<AssetHistoryEntry>> {
        let entries = self.repository.history(asset_id.as_str()).await?;
        entries
            .into_iter()
            .map(|entry| match entry.value.as_deref() {
                Some(bytes) if !bytes.is_empty() => {
                    let value = serde_json::from_slice(bytes).with_context(|| {
                        format!("Failed to decode history of '{asset_id}' at {}", entry.tx_id)
                    })?;
                    Ok(AssetHistoryEntry::written(entry.tx_id, entry.timestamp, value))
                }
                _ => Ok(AssetHistoryEntry::deleted(entry.tx_id, entry.timestamp)),
            })
            .collect()
    }

    async fn list<T: LedgerRecord>(&self) -> Result<Vec<T>> {
        let strategy = self.query.scan_strategy(T::KIND);
        self.repository.list(&strategy).await
    }
}
