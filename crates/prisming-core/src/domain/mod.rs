//! Domain entities and business logic
//!
//! This module contains the core domain types for Prisming:
//! - Newtypes for record keys and transaction ids
//! - Donor, NPO, Recipient, Need records and their relationship lists
//! - The Asset record and its lifecycle state machine
//! - Snapshot and history views used by queries
//! - Domain-specific error types

pub mod asset;
pub mod donor;
pub mod errors;
mod links;
pub mod need;
pub mod newtypes;
pub mod npo;
pub mod recipient;
pub mod record;
pub mod snapshot;

// Re-export commonly used types
pub use asset::{Asset, AssetEvent, AssetStatus, OwnerRelation};
pub use donor::Donor;
pub use errors::{DomainError, FailureKind};
pub use need::{Need, NeedStatus};
pub use newtypes::*;
pub use npo::Npo;
pub use recipient::Recipient;
pub use record::{LedgerRecord, RecordKind};
pub use snapshot::{AssetHistoryEntry, LedgerSnapshot};
