//! Read-only views assembled by the aggregate query service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    asset::Asset, donor::Donor, need::Need, newtypes::TxId, npo::Npo, recipient::Recipient,
};

/// Every record in the ledger, grouped by kind and in key order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(rename = "Donors")]
    pub donors: Vec<Donor>,
    #[serde(rename = "NPOs")]
    pub npos: Vec<Npo>,
    #[serde(rename = "Recipients")]
    pub recipients: Vec<Recipient>,
    #[serde(rename = "Assets")]
    pub assets: Vec<Asset>,
    #[serde(rename = "Needs")]
    pub needs: Vec<Need>,
}

impl LedgerSnapshot {
    /// Total number of records across all kinds
    pub fn len(&self) -> usize {
        self.donors.len()
            + self.npos.len()
            + self.recipients.len()
            + self.assets.len()
            + self.needs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One entry of an asset's change history
///
/// A deletion is flagged by `isDelete` and carries the zero-valued [`Asset`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetHistoryEntry {
    #[serde(rename = "txId")]
    pub tx_id: TxId,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "isDelete", default)]
    pub is_delete: bool,
    pub value: Asset,
}

impl AssetHistoryEntry {
    /// Builds the entry for a stored version of the asset
    pub fn written(tx_id: TxId, timestamp: DateTime<Utc>, value: Asset) -> Self {
        Self {
            tx_id,
            timestamp,
            is_delete: false,
            value,
        }
    }

    /// Builds the entry for the asset's deletion
    pub fn deleted(tx_id: TxId, timestamp: DateTime<Utc>) -> Self {
        Self {
            tx_id,
            timestamp,
            is_delete: true,
            value: Asset::default(),
        }
    }

    /// Returns true if this entry records the asset's deletion
    pub fn is_deletion(&self) -> bool {
        self.is_delete
    }
}
