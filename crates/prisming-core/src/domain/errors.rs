//! Domain error types
//!
//! This module defines error types specific to domain operations:
//! argument validation, missing records, ownership checks and
//! invalid asset state transitions.

use thiserror::Error;

use super::record::RecordKind;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Wrong argument count, malformed identifier or unparsable value
    #[error("{0}")]
    InvalidArgument(String),

    /// A referenced record is absent or empty
    #[error("{kind} '{id}' not found")]
    NotFound {
        /// Kind of the record that was looked up
        kind: RecordKind,
        /// Key that was looked up
        id: String,
    },

    /// A raw key lookup found nothing
    #[error("Nil value for key '{key}'")]
    KeyNotFound {
        /// Key that was looked up
        key: String,
    },

    /// A key holds a record of a different kind than the caller expected
    #[error("Record '{id}' is a {found}, expected {expected}")]
    KindMismatch {
        /// Key that was looked up
        id: String,
        /// Kind the caller asked for
        expected: RecordKind,
        /// Kind stored under the key
        found: RecordKind,
    },

    /// An NPO asserted authority over an asset it does not own
    #[error("Asset '{asset_id}' is not owned by NPO '{npo_id}'")]
    OwnershipMismatch {
        /// The asset being acted upon
        asset_id: String,
        /// The NPO that claimed ownership
        npo_id: String,
    },

    /// Enrollment or proposal reused an existing key
    #[error("{kind} '{id}' already exists")]
    AlreadyExists {
        /// Kind of the record being created
        kind: RecordKind,
        /// The colliding key
        id: String,
    },

    /// Invalid state transition attempt
    #[error("Invalid state transition from {from} to {to}")]
    InvalidState {
        /// The current state
        from: String,
        /// The attempted target state
        to: String,
    },
}

/// Coarse classification of an operation failure, reported to callers
/// alongside the human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidArgument,
    NotFound,
    OwnershipMismatch,
    AlreadyExists,
    InvalidTransition,
    StorageFailure,
}

impl DomainError {
    /// Returns the failure classification for this error
    pub fn kind(&self) -> FailureKind {
        match self {
            DomainError::InvalidArgument(_) | DomainError::KindMismatch { .. } => {
                FailureKind::InvalidArgument
            }
            DomainError::NotFound { .. } | DomainError::KeyNotFound { .. } => {
                FailureKind::NotFound
            }
            DomainError::OwnershipMismatch { .. } => FailureKind::OwnershipMismatch,
            DomainError::AlreadyExists { .. } => FailureKind::AlreadyExists,
            DomainError::InvalidState { .. } => FailureKind::InvalidTransition,
        }
    }

    /// Shorthand for the arity failure raised by the operation router
    pub fn wrong_arity(expected: usize) -> Self {
        DomainError::InvalidArgument(format!(
            "Incorrect number of arguments. Expecting {expected}"
        ))
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::InvalidArgument => "invalid_argument",
            FailureKind::NotFound => "not_found",
            FailureKind::OwnershipMismatch => "ownership_mismatch",
            FailureKind::AlreadyExists => "already_exists",
            FailureKind::InvalidTransition => "invalid_transition",
            FailureKind::StorageFailure => "storage_failure",
        };
        write!(f, "{}", s)
    }
}
