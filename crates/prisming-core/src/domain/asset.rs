//! Asset domain entity and its lifecycle state machine
//!
//! An Asset is a physical donated item. It is proposed by a donor to an
//! NPO, approved by that NPO, then lent or given to recipients and
//! returned. The donor and NPO references are fixed at proposal time.
//!
//! ## State Machine
//!
//! ```text
//! Proposed --approve--> Approved
//! Approved --borrow---> Borrowed
//! Approved --give-----> Given
//! Borrowed --return---> Approved
//! Given    --return---> Approved
//! Approved --return---> Approved
//! ```
//!
//! `return` on an Approved asset is accepted and leaves it Approved so
//! that handing an asset back twice is harmless. Deletion is not a
//! transition; it removes the record from any state.

use serde::{Deserialize, Serialize};

use super::{
    errors::DomainError,
    newtypes::RecordId,
    recipient::Recipient,
    record::{LedgerRecord, RecordKind},
};

// ============================================================================
// AssetStatus / AssetEvent
// ============================================================================

/// Lifecycle status of an asset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetStatus {
    /// Offered by a donor, awaiting the NPO's approval
    #[default]
    Proposed,
    /// Accepted by the NPO and available for custody changes
    Approved,
    /// Lent to a recipient
    Borrowed,
    /// Handed over to a recipient
    Given,
}

impl AssetStatus {
    /// Returns the stored name of this status
    pub fn name(&self) -> &'static str {
        match self {
            AssetStatus::Proposed => "Proposed",
            AssetStatus::Approved => "Approved",
            AssetStatus::Borrowed => "Borrowed",
            AssetStatus::Given => "Given",
        }
    }

    /// Looks up the transition table
    ///
    /// Returns the status reached by applying `event`, or `None` when the
    /// event is not allowed from this status.
    pub fn next(&self, event: AssetEvent) -> Option<AssetStatus> {
        match (self, event) {
            (AssetStatus::Proposed, AssetEvent::Approve) => Some(AssetStatus::Approved),

            (AssetStatus::Approved, AssetEvent::Borrow) => Some(AssetStatus::Borrowed),
            (AssetStatus::Approved, AssetEvent::Give) => Some(AssetStatus::Given),
            (AssetStatus::Approved, AssetEvent::Return) => Some(AssetStatus::Approved),

            (AssetStatus::Borrowed, AssetEvent::Return) => Some(AssetStatus::Approved),
            (AssetStatus::Given, AssetEvent::Return) => Some(AssetStatus::Approved),

            _ => None,
        }
    }

    /// Returns true if the asset is with a recipient
    pub fn is_in_custody(&self) -> bool {
        matches!(self, AssetStatus::Borrowed | AssetStatus::Given)
    }
}

impl std::fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Events that move an asset through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetEvent {
    Approve,
    Borrow,
    Give,
    Return,
}

impl AssetEvent {
    /// Status an event aims for, used in error messages
    fn target(&self) -> AssetStatus {
        match self {
            AssetEvent::Approve | AssetEvent::Return => AssetStatus::Approved,
            AssetEvent::Borrow => AssetStatus::Borrowed,
            AssetEvent::Give => AssetStatus::Given,
        }
    }
}

// ============================================================================
// OwnerRelation
// ============================================================================

/// Snapshot of a recipient's identity taken when an asset changes custody
///
/// Name and type are copies for display; the recipient id is authoritative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRelation {
    id: RecordId,
    username: String,
    user_type: String,
}

impl OwnerRelation {
    /// Captures the recipient as it is right now
    pub fn snapshot(recipient: &Recipient) -> Self {
        Self {
            id: recipient.id().clone(),
            username: recipient.name().to_string(),
            user_type: recipient.recipient_type().to_string(),
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn user_type(&self) -> &str {
        &self.user_type
    }
}

// ============================================================================
// Asset
// ============================================================================

/// A donated physical item tracked through proposal, approval and custody
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(rename = "doctype")]
    kind: RecordKind,
    id: RecordId,
    name: String,
    #[serde(rename = "donorid")]
    donor_id: RecordId,
    #[serde(rename = "npoid")]
    npo_id: RecordId,
    /// One entry per borrow or give, oldest first
    #[serde(rename = "owner", default, deserialize_with = "super::links::null_as_empty")]
    owner_history: Vec<OwnerRelation>,
    status: AssetStatus,
    #[serde(rename = "producttype")]
    product_type: String,
    /// Hash of the item's picture, stored verbatim
    #[serde(rename = "pichash")]
    picture_hash: String,
}

impl Asset {
    /// Creates a freshly proposed asset with empty owner history
    pub fn propose(
        id: RecordId,
        name: impl Into<String>,
        donor_id: RecordId,
        npo_id: RecordId,
        product_type: impl Into<String>,
        picture_hash: impl Into<String>,
    ) -> Self {
        Self {
            kind: RecordKind::Asset,
            id,
            name: name.into(),
            donor_id,
            npo_id,
            owner_history: Vec::new(),
            status: AssetStatus::Proposed,
            product_type: product_type.into(),
            picture_hash: picture_hash.into(),
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn donor_id(&self) -> &RecordId {
        &self.donor_id
    }

    pub fn npo_id(&self) -> &RecordId {
        &self.npo_id
    }

    pub fn owner_history(&self) -> &[OwnerRelation] {
        &self.owner_history
    }

    pub fn status(&self) -> AssetStatus {
        self.status
    }

    pub fn product_type(&self) -> &str {
        &self.product_type
    }

    pub fn picture_hash(&self) -> &str {
        &self.picture_hash
    }

    /// Returns true for the zero-valued asset that stands in for a deletion
    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    /// Returns true if `npo_id` is the NPO this asset was proposed to
    pub fn is_owned_by(&self, npo_id: &RecordId) -> bool {
        &self.npo_id == npo_id
    }

    /// Checks the ownership claim of an NPO
    pub fn ensure_owned_by(&self, npo_id: &RecordId) -> Result<(), DomainError> {
        if self.is_owned_by(npo_id) {
            Ok(())
        } else {
            Err(DomainError::OwnershipMismatch {
                asset_id: self.id.to_string(),
                npo_id: npo_id.to_string(),
            })
        }
    }

    /// Applies a lifecycle event
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` when the transition table has no
    /// entry for the current status and event. The asset is left unchanged.
    pub fn apply(&mut self, event: AssetEvent) -> Result<AssetStatus, DomainError> {
        let next = self.status.next(event).ok_or_else(|| DomainError::InvalidState {
            from: self.status.name().to_string(),
            to: event.target().name().to_string(),
        })?;
        self.status = next;
        Ok(next)
    }

    /// Convenience method for the NPO's approval
    pub fn approve(&mut self) -> Result<(), DomainError> {
        self.apply(AssetEvent::Approve).map(|_| ())
    }

    /// Lends the asset and records the recipient in the owner history
    pub fn lend_to(&mut self, recipient: &Recipient) -> Result<(), DomainError> {
        self.apply(AssetEvent::Borrow)?;
        self.owner_history.push(OwnerRelation::snapshot(recipient));
        Ok(())
    }

    /// Gives the asset away and records the recipient in the owner history
    pub fn give_to(&mut self, recipient: &Recipient) -> Result<(), DomainError> {
        self.apply(AssetEvent::Give)?;
        self.owner_history.push(OwnerRelation::snapshot(recipient));
        Ok(())
    }

    /// Returns the asset to the NPO's available pool
    pub fn take_back(&mut self) -> Result<(), DomainError> {
        self.apply(AssetEvent::Return).map(|_| ())
    }
}

impl Default for Asset {
    fn default() -> Self {
        Self {
            kind: RecordKind::Asset,
            id: RecordId::default(),
            name: String::new(),
            donor_id: RecordId::default(),
            npo_id: RecordId::default(),
            owner_history: Vec::new(),
            status: AssetStatus::default(),
            product_type: String::new(),
            picture_hash: String::new(),
        }
    }
}

impl LedgerRecord for Asset {
    const KIND: RecordKind = RecordKind::Asset;

    fn record_id(&self) -> &RecordId {
        &self.id
    }
}
