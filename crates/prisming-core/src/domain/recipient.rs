//! Recipient domain entity

use serde::{Deserialize, Serialize};

use super::{
    links,
    newtypes::RecordId,
    record::{LedgerRecord, RecordKind},
};

/// A person or organisation that borrows or is given assets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    #[serde(rename = "doctype")]
    kind: RecordKind,
    id: RecordId,
    name: String,
    /// Free-form category, e.g. "individual" or "shelter"
    #[serde(rename = "type")]
    recipient_type: String,
    /// Assets lent or given to this recipient and not yet returned
    #[serde(rename = "assetarray", default, deserialize_with = "links::null_as_empty")]
    asset_ids: Vec<RecordId>,
}

impl Recipient {
    pub fn new(id: RecordId, name: impl Into<String>, recipient_type: impl Into<String>) -> Self {
        Self {
            kind: RecordKind::Recipient,
            id,
            name: name.into(),
            recipient_type: recipient_type.into(),
            asset_ids: Vec::new(),
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn recipient_type(&self) -> &str {
        &self.recipient_type
    }

    pub fn asset_ids(&self) -> &[RecordId] {
        &self.asset_ids
    }

    pub fn attach_asset(&mut self, asset_id: &RecordId) -> bool {
        links::attach(&mut self.asset_ids, asset_id)
    }

    pub fn detach_asset(&mut self, asset_id: &RecordId) -> bool {
        links::detach(&mut self.asset_ids, asset_id)
    }
}

impl LedgerRecord for Recipient {
    const KIND: RecordKind = RecordKind::Recipient;

    fn record_id(&self) -> &RecordId {
        &self.id
    }
}
