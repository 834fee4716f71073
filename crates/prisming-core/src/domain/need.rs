//! Need domain entity
//!
//! A Need is an NPO's declared demand for a number of items. Each
//! approved asset whose name matches increments the need's counter
//! until the target is reached.

use serde::{Deserialize, Serialize};

use super::{
    errors::DomainError,
    newtypes::RecordId,
    record::{LedgerRecord, RecordKind},
};

/// Fulfilment status of a need
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeedStatus {
    /// Still accepting donations
    #[default]
    #[serde(rename = "I")]
    Incomplete,
    /// Target count reached; terminal
    #[serde(rename = "C")]
    Complete,
}

impl NeedStatus {
    pub fn name(&self) -> &'static str {
        match self {
            NeedStatus::Incomplete => "Incomplete",
            NeedStatus::Complete => "Complete",
        }
    }
}

impl std::fmt::Display for NeedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A quantity of a named item that an NPO wants to receive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Need {
    #[serde(rename = "doctype")]
    kind: RecordKind,
    id: RecordId,
    #[serde(rename = "npoid")]
    npo_id: RecordId,
    #[serde(rename = "producttype")]
    product_type: String,
    name: String,
    status: NeedStatus,
    #[serde(rename = "totalcount")]
    total_count: u32,
    #[serde(rename = "currentcount")]
    current_count: u32,
}

impl Need {
    /// Declares a new, unfulfilled need
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidArgument` if `total_count` is zero.
    pub fn declare(
        id: RecordId,
        npo_id: RecordId,
        name: impl Into<String>,
        product_type: impl Into<String>,
        total_count: u32,
    ) -> Result<Self, DomainError> {
        if total_count == 0 {
            return Err(DomainError::InvalidArgument(
                "Need total count must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            kind: RecordKind::Need,
            id,
            npo_id,
            product_type: product_type.into(),
            name: name.into(),
            status: NeedStatus::Incomplete,
            total_count,
            current_count: 0,
        })
    }

    /// Parses a total count supplied as a decimal string
    ///
    /// ```
    /// use prisming_core::domain::Need;
    ///
    /// assert_eq!(Need::parse_total_count("12").unwrap(), 12);
    /// assert!(Need::parse_total_count("twelve").is_err());
    /// assert!(Need::parse_total_count("0").is_err());
    /// ```
    pub fn parse_total_count(raw: &str) -> Result<u32, DomainError> {
        let count: u32 = raw.trim().parse().map_err(|_| {
            DomainError::InvalidArgument(format!(
                "Need total count must be a positive integer, got '{raw}'"
            ))
        })?;
        if count == 0 {
            return Err(DomainError::InvalidArgument(
                "Need total count must be greater than 0".to_string(),
            ));
        }
        Ok(count)
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn npo_id(&self) -> &RecordId {
        &self.npo_id
    }

    pub fn product_type(&self) -> &str {
        &self.product_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> NeedStatus {
        self.status
    }

    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    pub fn current_count(&self) -> u32 {
        self.current_count
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.status, NeedStatus::Complete)
    }

    /// Returns true if an approved asset with this name (and, when
    /// `product_type` is given, this product type) counts towards the need
    pub fn accepts(&self, asset_name: &str, product_type: Option<&str>) -> bool {
        if self.is_complete() || self.name != asset_name {
            return false;
        }
        match product_type {
            Some(product_type) => self.product_type == product_type,
            None => true,
        }
    }

    /// Counts one more fulfilled unit
    ///
    /// Returns true if this unit completed the need.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` if the need is already complete.
    pub fn record_fulfillment(&mut self) -> Result<bool, DomainError> {
        if self.is_complete() {
            return Err(DomainError::InvalidState {
                from: NeedStatus::Complete.name().to_string(),
                to: NeedStatus::Complete.name().to_string(),
            });
        }
        self.current_count += 1;
        if self.current_count >= self.total_count {
            self.status = NeedStatus::Complete;
            return Ok(true);
        }
        Ok(false)
    }
}

impl LedgerRecord for Need {
    const KIND: RecordKind = RecordKind::Need;

    fn record_id(&self) -> &RecordId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chairs(total: u32) -> Need {
        Need::declare(
            RecordId::new("e1").unwrap(),
            RecordId::new("n1").unwrap(),
            "Chair",
            "furniture",
            total,
        )
        .unwrap()
    }

    #[test]
    fn declare_rejects_zero_total() {
        let result = Need::declare(
            RecordId::new("e1").unwrap(),
            RecordId::new("n1").unwrap(),
            "Chair",
            "furniture",
            0,
        );
        assert!(result.is_err());
    }

    #[test]
    fn parse_total_count_rejects_non_numeric() {
        assert!(Need::parse_total_count("abc").is_err());
        assert!(Need::parse_total_count("-1").is_err());
        assert!(Need::parse_total_count("").is_err());
        assert_eq!(Need::parse_total_count(" 7 ").unwrap(), 7);
    }

    #[test]
    fn fulfillment_completes_exactly_once() {
        let mut need = chairs(2);
        assert_eq!(need.record_fulfillment(), Ok(false));
        assert_eq!(need.current_count(), 1);
        assert_eq!(need.status(), NeedStatus::Incomplete);

        assert_eq!(need.record_fulfillment(), Ok(true));
        assert_eq!(need.current_count(), 2);
        assert_eq!(need.status(), NeedStatus::Complete);

        assert!(need.record_fulfillment().is_err());
        assert_eq!(need.current_count(), 2);
        assert_eq!(need.status(), NeedStatus::Complete);
    }

    #[test]
    fn accepts_matches_name_and_optional_product_type() {
        let need = chairs(2);
        assert!(need.accepts("Chair", None));
        assert!(!need.accepts("Table", None));
        assert!(need.accepts("Chair", Some("furniture")));
        assert!(!need.accepts("Chair", Some("toys")));
    }

    #[test]
    fn complete_need_accepts_nothing() {
        let mut need = chairs(1);
        need.record_fulfillment().unwrap();
        assert!(!need.accepts("Chair", None));
    }

    #[test]
    fn status_serializes_as_letter() {
        let value = serde_json::to_value(chairs(3)).unwrap();
        assert_eq!(value["status"], "I");
        assert_eq!(value["totalcount"], 3);
        assert_eq!(value["currentcount"], 0);
        assert_eq!(value["npoid"], "n1");
        assert_eq!(value["doctype"], "Need");
    }
}
