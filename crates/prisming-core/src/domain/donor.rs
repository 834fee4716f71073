//! Donor domain entity
//!
//! A Donor proposes assets to NPOs and earns credit each time one of
//! its assets fulfils a declared need.

use serde::{Deserialize, Serialize};

use super::{
    links,
    newtypes::RecordId,
    record::{LedgerRecord, RecordKind},
};

/// A person or organisation donating physical assets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donor {
    #[serde(rename = "doctype")]
    kind: RecordKind,
    id: RecordId,
    name: String,
    phone: String,
    /// Number of approved donations that matched an open need
    credit: u64,
    /// Assets proposed by this donor and not yet deleted
    #[serde(rename = "assetArray", default, deserialize_with = "links::null_as_empty")]
    asset_ids: Vec<RecordId>,
}

impl Donor {
    /// Creates a donor with zero credit and no assets
    pub fn new(id: RecordId, name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            kind: RecordKind::Donor,
            id,
            name: name.into(),
            phone: phone.into(),
            credit: 0,
            asset_ids: Vec::new(),
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn credit(&self) -> u64 {
        self.credit
    }

    pub fn asset_ids(&self) -> &[RecordId] {
        &self.asset_ids
    }

    /// Records a newly proposed asset. Returns false if it was already listed.
    pub fn attach_asset(&mut self, asset_id: &RecordId) -> bool {
        links::attach(&mut self.asset_ids, asset_id)
    }

    /// Forgets a deleted asset. Returns false if it was not listed.
    pub fn detach_asset(&mut self, asset_id: &RecordId) -> bool {
        links::detach(&mut self.asset_ids, asset_id)
    }

    /// Adds one unit of credit for a need-matching donation
    pub fn award_credit(&mut self) {
        self.credit = self.credit.saturating_add(1);
    }
}

impl LedgerRecord for Donor {
    const KIND: RecordKind = RecordKind::Donor;

    fn record_id(&self) -> &RecordId {
        &self.id
    }
}
