//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for ledger keys and
//! transaction identifiers. Each newtype ensures data validity at
//! construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

/// Maximum length in bytes of a record identifier
pub const MAX_RECORD_ID_LEN: usize = 256;

// ============================================================================
// RecordId
// ============================================================================

/// Caller-supplied key of a ledger record (donor, NPO, recipient, asset or need)
///
/// Identifiers are opaque strings. They must be non-empty, at most
/// [`MAX_RECORD_ID_LEN`] bytes and free of whitespace and control characters.
/// The default value is the empty identifier carried by a zero-valued record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a validated RecordId
    ///
    /// # Example
    ///
    /// ```
    /// use prisming_core::domain::RecordId;
    ///
    /// let id = RecordId::new("d1").unwrap();
    /// assert_eq!(id.as_str(), "d1");
    /// assert!(RecordId::new("").is_err());
    /// assert!(RecordId::new("has space").is_err());
    /// ```
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::InvalidArgument(
                "Record id must not be empty".to_string(),
            ));
        }
        if id.len() > MAX_RECORD_ID_LEN {
            return Err(DomainError::InvalidArgument(format!(
                "Record id exceeds {MAX_RECORD_ID_LEN} bytes"
            )));
        }
        if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(DomainError::InvalidArgument(format!(
                "Record id '{}' contains whitespace or control characters",
                id.escape_debug()
            )));
        }
        Ok(Self(id))
    }

    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the zero-valued identifier
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RecordId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for RecordId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for RecordId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// ============================================================================
// TxId
// ============================================================================

/// Identifier of a committed ledger transaction
///
/// Every write batch committed to the ledger receives one TxId, shared by
/// all history entries the batch produced. It doubles as the version of
/// each key the batch wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(Uuid);

impl TxId {
    /// Create a new random TxId
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID value
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TxId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TxId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for TxId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::InvalidArgument(format!("Invalid transaction id: {e}")))
    }
}
