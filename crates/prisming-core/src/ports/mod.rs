//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are interfaces that the domain core depends on, but whose
//! implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`ILedger`] - Key-value ledger with range, kind and history scans and
//!   atomic batch commits

pub mod ledger;

pub use ledger::{
    HistoryEntry, ILedger, LedgerEntry, ReadConflict, ReadVersion, VersionedValue, WriteBatch,
    WriteOp,
};
