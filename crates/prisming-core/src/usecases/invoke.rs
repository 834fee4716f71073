//! Operation router
//!
//! Accepts an operation name plus positional string arguments, validates
//! the argument count, dispatches to the matching use case and folds the
//! outcome into a [`Response`]. This is the single entry point used by the
//! `invoke` CLI command.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::{
    config::Config,
    domain::{DomainError, FailureKind, Need, RecordId, TxId},
    ports::{ILedger, ReadConflict},
    usecases::{AggregateQueryUseCase, AssetLifecycleUseCase, EnrollmentUseCase},
};

/// Key holding the UI compatibility marker written by `init`
pub const UI_VERSION_KEY: &str = "ui_version";

/// Value of the UI compatibility marker
pub const UI_VERSION: &str = "0.0.1";

// ============================================================================
// Operation
// ============================================================================

/// A parsed, arity-checked operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Init,
    EnrollDonor {
        id: RecordId,
        name: String,
        phone: String,
    },
    EnrollNpo {
        id: RecordId,
        name: String,
    },
    EnrollRecipient {
        id: RecordId,
        name: String,
        recipient_type: String,
    },
    EnrollNeeds {
        need_id: RecordId,
        npo_id: RecordId,
        name: String,
        product_type: String,
        total_count: u32,
    },
    ProposeAsset {
        asset_id: RecordId,
        name: String,
        donor_id: RecordId,
        npo_id: RecordId,
        product_type: String,
        picture_hash: String,
    },
    ApproveAsset {
        asset_id: RecordId,
        npo_id: RecordId,
    },
    DeleteAsset {
        asset_id: RecordId,
        npo_id: RecordId,
    },
    BorrowAsset {
        asset_id: RecordId,
        recipient_id: RecordId,
    },
    GiveAsset {
        asset_id: RecordId,
        recipient_id: RecordId,
    },
    GetBackAsset {
        asset_id: RecordId,
        recipient_id: RecordId,
    },
    Query {
        key: String,
    },
    ReadEverything,
    GetHistory {
        asset_id: RecordId,
    },
}

fn expect_args(args: &[String], expected: usize) -> Result<(), DomainError> {
    if args.len() != expected {
        return Err(DomainError::wrong_arity(expected));
    }
    Ok(())
}

fn record_id(raw: &str) -> Result<RecordId, DomainError> {
    RecordId::new(raw)
}

impl Operation {
    /// Parses an operation name and its positional arguments
    ///
    /// `init` and `read_everything` ignore their arguments; every other
    /// operation requires an exact count.
    ///
    /// ```
    /// use prisming_core::usecases::invoke::Operation;
    ///
    /// let op = Operation::parse("approve_asset", &["a1".into(), "n1".into()]).unwrap();
    /// assert_eq!(op.name(), "approve_asset");
    ///
    /// let err = Operation::parse("approve_asset", &["a1".into()]).unwrap_err();
    /// assert_eq!(err.to_string(), "Incorrect number of arguments. Expecting 2");
    /// ```
    pub fn parse(function: &str, args: &[String]) -> Result<Self, DomainError> {
        let op = match function {
            "init" => Operation::Init,
            "enroll_donor" => {
                expect_args(args, 3)?;
                Operation::EnrollDonor {
                    id: record_id(&args[0])?,
                    name: args[1].clone(),
                    phone: args[2].clone(),
                }
            }
            "enroll_npo" => {
                expect_args(args, 2)?;
                Operation::EnrollNpo {
                    id: record_id(&args[0])?,
                    name: args[1].clone(),
                }
            }
            "enroll_recipient" => {
                expect_args(args, 3)?;
                Operation::EnrollRecipient {
                    id: record_id(&args[0])?,
                    name: args[1].clone(),
                    recipient_type: args[2].clone(),
                }
            }
            "enroll_needs" => {
                expect_args(args, 5)?;
                Operation::EnrollNeeds {
                    need_id: record_id(&args[0])?,
                    npo_id: record_id(&args[1])?,
                    name: args[2].clone(),
                    product_type: args[3].clone(),
                    total_count: Need::parse_total_count(&args[4])?,
                }
            }
            "propose_asset" => {
                expect_args(args, 6)?;
                Operation::ProposeAsset {
                    asset_id: record_id(&args[0])?,
                    name: args[1].clone(),
                    donor_id: record_id(&args[2])?,
                    npo_id: record_id(&args[3])?,
                    product_type: args[4].clone(),
                    picture_hash: args[5].clone(),
                }
            }
            "approve_asset" | "delete_asset" => {
                expect_args(args, 2)?;
                let asset_id = record_id(&args[0])?;
                let npo_id = record_id(&args[1])?;
                if function == "approve_asset" {
                    Operation::ApproveAsset { asset_id, npo_id }
                } else {
                    Operation::DeleteAsset { asset_id, npo_id }
                }
            }
            "borrow_asset" | "give_asset" | "get_back_asset" => {
                expect_args(args, 2)?;
                let asset_id = record_id(&args[0])?;
                let recipient_id = record_id(&args[1])?;
                match function {
                    "borrow_asset" => Operation::BorrowAsset {
                        asset_id,
                        recipient_id,
                    },
                    "give_asset" => Operation::GiveAsset {
                        asset_id,
                        recipient_id,
                    },
                    _ => Operation::GetBackAsset {
                        asset_id,
                        recipient_id,
                    },
                }
            }
            "query" => {
                expect_args(args, 1)?;
                Operation::Query {
                    key: args[0].clone(),
                }
            }
            "read_everything" => Operation::ReadEverything,
            "get_history" => {
                expect_args(args, 1)?;
                Operation::GetHistory {
                    asset_id: record_id(&args[0])?,
                }
            }
            other => {
                return Err(DomainError::InvalidArgument(format!(
                    "Received unknown invoke function name - '{other}'"
                )))
            }
        };
        Ok(op)
    }

    /// Returns the wire name of the operation
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Init => "init",
            Operation::EnrollDonor { .. } => "enroll_donor",
            Operation::EnrollNpo { .. } => "enroll_npo",
            Operation::EnrollRecipient { .. } => "enroll_recipient",
            Operation::EnrollNeeds { .. } => "enroll_needs",
            Operation::ProposeAsset { .. } => "propose_asset",
            Operation::ApproveAsset { .. } => "approve_asset",
            Operation::DeleteAsset { .. } => "delete_asset",
            Operation::BorrowAsset { .. } => "borrow_asset",
            Operation::GiveAsset { .. } => "give_asset",
            Operation::GetBackAsset { .. } => "get_back_asset",
            Operation::Query { .. } => "query",
            Operation::ReadEverything => "read_everything",
            Operation::GetHistory { .. } => "get_history",
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// Outcome of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Result of [`InvokeUseCase::invoke`]
///
/// On success `payload` holds the operation's bytes (empty for writes).
/// On failure `kind` and `message` describe what went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: ResponseStatus,
    pub kind: Option<FailureKind>,
    pub message: Option<String>,
    pub payload: Vec<u8>,
}

impl Response {
    pub fn success(payload: Vec<u8>) -> Self {
        Self {
            status: ResponseStatus::Success,
            kind: None,
            message: None,
            payload,
        }
    }

    /// Builds a failure response, classifying `error`
    pub fn failure(error: &anyhow::Error) -> Self {
        Self {
            status: ResponseStatus::Error,
            kind: Some(classify(error)),
            message: Some(format!("{error:#}")),
            payload: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

/// Maps an operation error to its failure kind
///
/// Domain errors carry their own kind; a stale read set and every other
/// error come from storage.
pub fn classify(error: &anyhow::Error) -> FailureKind {
    for cause in error.chain() {
        if let Some(domain) = cause.downcast_ref::<DomainError>() {
            return domain.kind();
        }
        if cause.downcast_ref::<ReadConflict>().is_some() {
            return FailureKind::StorageFailure;
        }
    }
    FailureKind::StorageFailure
}

// ============================================================================
// InvokeUseCase
// ============================================================================

/// Routes named operations to the lifecycle, enrollment and query use cases
pub struct InvokeUseCase {
    ledger: Arc<dyn ILedger + Send + Sync>,
    enrollment: EnrollmentUseCase,
    lifecycle: AssetLifecycleUseCase,
    queries: AggregateQueryUseCase,
}

impl InvokeUseCase {
    /// Creates a router over `ledger`, configured by the lifecycle and
    /// query sections of `config`
    pub fn new(ledger: Arc<dyn ILedger + Send + Sync>, config: &Config) -> Self {
        Self {
            enrollment: EnrollmentUseCase::new(Arc::clone(&ledger), config.lifecycle.clone()),
            lifecycle: AssetLifecycleUseCase::new(Arc::clone(&ledger), config.lifecycle.clone()),
            queries: AggregateQueryUseCase::new(Arc::clone(&ledger), config.query.clone()),
            ledger,
        }
    }

    /// Parses and runs an operation, never failing
    pub async fn invoke(&self, function: &str, args: &[String]) -> Response {
        debug!(function, args = args.len(), "Invoking operation");
        let result = match Operation::parse(function, args) {
            Ok(op) => self.execute(op).await,
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(payload) => Response::success(payload),
            Err(e) => {
                let response = Response::failure(&e);
                info!(
                    function,
                    kind = ?response.kind,
                    error = %e,
                    "Operation failed"
                );
                response
            }
        }
    }

    /// Runs an already parsed operation and returns its payload
    pub async fn execute(&self, op: Operation) -> Result<Vec<u8>> {
        match op {
            Operation::Init => {
                self.init().await?;
                Ok(Vec::new())
            }
            Operation::EnrollDonor { id, name, phone } => {
                self.enrollment.enroll_donor(&id, &name, &phone).await?;
                Ok(Vec::new())
            }
            Operation::EnrollNpo { id, name } => {
                self.enrollment.enroll_npo(&id, &name).await?;
                Ok(Vec::new())
            }
            Operation::EnrollRecipient {
                id,
                name,
                recipient_type,
            } => {
                self.enrollment
                    .enroll_recipient(&id, &name, &recipient_type)
                    .await?;
                Ok(Vec::new())
            }
            Operation::EnrollNeeds {
                need_id,
                npo_id,
                name,
                product_type,
                total_count,
            } => {
                self.enrollment
                    .enroll_needs(&need_id, &npo_id, &name, &product_type, total_count)
                    .await?;
                Ok(Vec::new())
            }
            Operation::ProposeAsset {
                asset_id,
                name,
                donor_id,
                npo_id,
                product_type,
                picture_hash,
            } => {
                self.lifecycle
                    .propose_asset(
                        &asset_id,
                        &name,
                        &donor_id,
                        &npo_id,
                        &product_type,
                        &picture_hash,
                    )
                    .await?;
                Ok(Vec::new())
            }
            Operation::ApproveAsset { asset_id, npo_id } => {
                self.lifecycle.approve_asset(&asset_id, &npo_id).await?;
                Ok(Vec::new())
            }
            Operation::DeleteAsset { asset_id, npo_id } => {
                self.lifecycle.delete_asset(&asset_id, &npo_id).await?;
                Ok(Vec::new())
            }
            Operation::BorrowAsset {
                asset_id,
                recipient_id,
            } => {
                self.lifecycle
                    .borrow_asset(&asset_id, &recipient_id)
                    .await?;
                Ok(Vec::new())
            }
            Operation::GiveAsset {
                asset_id,
                recipient_id,
            } => {
                self.lifecycle.give_asset(&asset_id, &recipient_id).await?;
                Ok(Vec::new())
            }
            Operation::GetBackAsset {
                asset_id,
                recipient_id,
            } => {
                self.lifecycle
                    .get_back_asset(&asset_id, &recipient_id)
                    .await?;
                Ok(Vec::new())
            }
            Operation::Query { key } => self.queries.query(&key).await,
            Operation::ReadEverything => {
                let snapshot = self.queries.read_everything().await?;
                serde_json::to_vec(&snapshot).context("Failed to encode ledger snapshot")
            }
            Operation::GetHistory { asset_id } => {
                let history = self.queries.get_history(&asset_id).await?;
                serde_json::to_vec(&history).context("Failed to encode asset history")
            }
        }
    }

    /// Writes the UI compatibility marker
    pub async fn init(&self) -> Result<TxId> {
        let tx_id = self
            .ledger
            .put(UI_VERSION_KEY, UI_VERSION.as_bytes())
            .await
            .context("Failed to write UI version marker")?;
        info!(version = UI_VERSION, tx_id = %tx_id, "Ledger initialised");
        Ok(tx_id)
    }

    /// Returns the aggregate query use case behind this router
    pub fn queries(&self) -> &AggregateQueryUseCase {
        &self.queries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryLedger;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn router() -> (Arc<MemoryLedger>, InvokeUseCase) {
        let ledger = Arc::new(MemoryLedger::new());
        let router = InvokeUseCase::new(ledger.clone(), &Config::default());
        (ledger, router)
    }

    async fn ok(router: &InvokeUseCase, function: &str, values: &[&str]) -> Vec<u8> {
        let response = router.invoke(function, &args(values)).await;
        assert!(response.is_success(), "{function} failed: {:?}", response.message);
        response.payload
    }

    // -- Parsing --

    #[test]
    fn test_parse_every_operation() {
        let cases: &[(&str, &[&str])] = &[
            ("init", &[]),
            ("enroll_donor", &["d1", "Alice", "555"]),
            ("enroll_npo", &["n1", "Helping Hands"]),
            ("enroll_recipient", &["r1", "Bob", "individual"]),
            ("enroll_needs", &["e1", "n1", "Wheelchair", "mobility", "2"]),
            ("propose_asset", &["a1", "Wheelchair", "d1", "n1", "mobility", "h"]),
            ("approve_asset", &["a1", "n1"]),
            ("delete_asset", &["a1", "n1"]),
            ("borrow_asset", &["a1", "r1"]),
            ("give_asset", &["a1", "r1"]),
            ("get_back_asset", &["a1", "r1"]),
            ("query", &["a1"]),
            ("read_everything", &[]),
            ("get_history", &["a1"]),
        ];
        for (function, values) in cases {
            let op = Operation::parse(function, &args(values)).unwrap();
            assert_eq!(op.name(), *function);
        }
    }

    #[test]
    fn test_parse_wrong_arity() {
        let cases: &[(&str, usize)] = &[
            ("enroll_donor", 3),
            ("enroll_npo", 2),
            ("enroll_recipient", 3),
            ("enroll_needs", 5),
            ("propose_asset", 6),
            ("approve_asset", 2),
            ("delete_asset", 2),
            ("borrow_asset", 2),
            ("give_asset", 2),
            ("get_back_asset", 2),
            ("query", 1),
            ("get_history", 1),
        ];
        for (function, expected) in cases {
            let err = Operation::parse(function, &args(&["x"; 7])).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("Incorrect number of arguments. Expecting {expected}")
            );
        }
    }

    #[test]
    fn test_parse_unknown_function() {
        let err = Operation::parse("steal_asset", &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Received unknown invoke function name - 'steal_asset'"
        );
    }

    #[test]
    fn test_parse_rejects_non_numeric_total() {
        let err = Operation::parse(
            "enroll_needs",
            &args(&["e1", "n1", "Wheelchair", "mobility", "many"]),
        )
        .unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidArgument);
    }

    #[test]
    fn test_parse_rejects_blank_id() {
        let err = Operation::parse("enroll_npo", &args(&["", "Helping Hands"])).unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidArgument);
    }

    // -- Classification --

    #[test]
    fn test_classify_read_conflict_as_storage_failure() {
        let err = anyhow::Error::new(ReadConflict {
            key: "d1".to_string(),
        })
        .context("Failed to commit ledger transaction");
        assert_eq!(classify(&err), FailureKind::StorageFailure);

        let err: anyhow::Error = DomainError::wrong_arity(2).into();
        assert_eq!(classify(&err), FailureKind::InvalidArgument);
    }

    // -- Routing --

    #[tokio::test]
    async fn test_init_writes_ui_version() {
        let (ledger, router) = router();
        ok(&router, "init", &["ignored"]).await;
        assert_eq!(
            ledger.get(UI_VERSION_KEY).await.unwrap(),
            Some(b"0.0.1".to_vec())
        );
        assert_eq!(ok(&router, "query", &["ui_version"]).await, b"0.0.1");
    }

    #[tokio::test]
    async fn test_full_lifecycle_through_router() {
        let (_ledger, router) = router();
        ok(&router, "enroll_donor", &["d1", "Alice", "555"]).await;
        ok(&router, "enroll_npo", &["n1", "Helping Hands"]).await;
        ok(&router, "enroll_recipient", &["r1", "Bob", "individual"]).await;
        ok(&router, "enroll_needs", &["e1", "n1", "Wheelchair", "mobility", "1"]).await;
        ok(
            &router,
            "propose_asset",
            &["a1", "Wheelchair", "d1", "n1", "mobility", "h"],
        )
        .await;
        ok(&router, "approve_asset", &["a1", "n1"]).await;
        ok(&router, "borrow_asset", &["a1", "r1"]).await;
        ok(&router, "get_back_asset", &["a1", "r1"]).await;

        let everything = ok(&router, "read_everything", &[]).await;
        let value: serde_json::Value = serde_json::from_slice(&everything).unwrap();
        assert_eq!(value["Donors"][0]["credit"], 1);
        assert_eq!(value["Needs"][0]["status"], "C");
        assert_eq!(value["Assets"][0]["status"], "Approved");

        let history = ok(&router, "get_history", &["a1"]).await;
        let value: serde_json::Value = serde_json::from_slice(&history).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 4);
        assert!(value[0]["txId"].is_string());
    }

    #[tokio::test]
    async fn test_failures_carry_kind_and_message() {
        let (_ledger, router) = router();
        let response = router.invoke("approve_asset", &args(&["a1", "n1"])).await;
        assert_eq!(response.status, ResponseStatus::Error);
        assert_eq!(response.kind, Some(FailureKind::NotFound));
        assert_eq!(response.message.as_deref(), Some("Asset 'a1' not found"));
        assert!(response.payload.is_empty());

        let response = router.invoke("approve_asset", &args(&["a1"])).await;
        assert_eq!(response.kind, Some(FailureKind::InvalidArgument));
    }

    #[tokio::test]
    async fn test_storage_failure_is_classified() {
        let (ledger, router) = router();
        ledger.fail_commits(true);
        let response = router.invoke("enroll_npo", &args(&["n1", "x"])).await;
        assert_eq!(response.kind, Some(FailureKind::StorageFailure));
        assert!(response
            .message
            .unwrap()
            .contains("simulated ledger outage"));
    }
}
