//! Record kinds and the trait shared by every persisted entity

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{errors::DomainError, newtypes::RecordId};

/// Discriminator stored in the `doctype` field of every record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordKind {
    Donor,
    #[serde(rename = "NPO")]
    Npo,
    Recipient,
    Asset,
    Need,
}

impl RecordKind {
    /// All kinds, in the order categories appear in a ledger snapshot
    pub const ALL: [RecordKind; 5] = [
        RecordKind::Donor,
        RecordKind::Npo,
        RecordKind::Recipient,
        RecordKind::Asset,
        RecordKind::Need,
    ];

    /// Returns the stable name of this kind, as stored in the ledger
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Donor => "Donor",
            RecordKind::Npo => "NPO",
            RecordKind::Recipient => "Recipient",
            RecordKind::Asset => "Asset",
            RecordKind::Need => "Need",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecordKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DomainError::InvalidArgument(format!("Unknown record kind: {s}")))
    }
}

/// An entity that can be stored in the ledger under its own id
///
/// The typed repository uses [`LedgerRecord::KIND`] to tag writes for the
/// kind index and to reject keys that hold a record of another kind.
pub trait LedgerRecord: Serialize + DeserializeOwned + Send + Sync {
    /// Kind written to the `doctype` field and the ledger kind index
    const KIND: RecordKind;

    /// The key this record is stored under
    fn record_id(&self) -> &RecordId;
}
