//! NPO domain entity

use serde::{Deserialize, Serialize};

use super::{
    links,
    newtypes::RecordId,
    record::{LedgerRecord, RecordKind},
};

/// A nonprofit organisation that receives proposed assets and declares needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Npo {
    #[serde(rename = "doctype")]
    kind: RecordKind,
    id: RecordId,
    name: String,
    /// Assets proposed to this NPO and not yet deleted
    #[serde(rename = "assetsarray", default, deserialize_with = "links::null_as_empty")]
    asset_ids: Vec<RecordId>,
    /// Needs declared by this NPO, in declaration order. Never pruned.
    #[serde(rename = "needs", default, deserialize_with = "links::null_as_empty")]
    need_ids: Vec<RecordId>,
}

impl Npo {
    pub fn new(id: RecordId, name: impl Into<String>) -> Self {
        Self {
            kind: RecordKind::Npo,
            id,
            name: name.into(),
            asset_ids: Vec::new(),
            need_ids: Vec::new(),
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn asset_ids(&self) -> &[RecordId] {
        &self.asset_ids
    }

    /// Declared needs, in the order approval scans them
    pub fn need_ids(&self) -> &[RecordId] {
        &self.need_ids
    }

    pub fn attach_asset(&mut self, asset_id: &RecordId) -> bool {
        links::attach(&mut self.asset_ids, asset_id)
    }

    pub fn detach_asset(&mut self, asset_id: &RecordId) -> bool {
        links::detach(&mut self.asset_ids, asset_id)
    }

    /// Appends a need. There is no way to remove one.
    pub fn declare_need(&mut self, need_id: &RecordId) -> bool {
        links::attach(&mut self.need_ids, need_id)
    }
}

impl LedgerRecord for Npo {
    const KIND: RecordKind = RecordKind::Npo;

    fn record_id(&self) -> &RecordId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> RecordId {
        RecordId::new(s).unwrap()
    }

    #[test]
    fn needs_keep_declaration_order() {
        let mut npo = Npo::new(id("n1"), "Helping Hands");
        npo.declare_need(&id("e2"));
        npo.declare_need(&id("e1"));
        assert!(!npo.declare_need(&id("e2")));
        assert_eq!(npo.need_ids(), &[id("e2"), id("e1")]);
    }

    #[test]
    fn json_shape_uses_ledger_keys() {
        let npo = Npo::new(id("n1"), "Helping Hands");
        let value = serde_json::to_value(&npo).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "doctype": "NPO",
                "id": "n1",
                "name": "Helping Hands",
                "assetsarray": [],
                "needs": [],
            })
        );
    }
}
