//! End-to-end lifecycle tests
//!
//! Drive the core use cases against a real SQLite ledger and check the
//! referential invariants between donors, NPOs, recipients, assets and
//! needs after every step.

use std::sync::Arc;

use prisming_core::config::{Config, ConfigBuilder, ScanMode};
use prisming_core::domain::{
    Asset, AssetStatus, Donor, FailureKind, Need, NeedStatus, Npo, Recipient, RecordId,
};
use prisming_core::ports::ILedger;
use prisming_core::repository::LedgerRepository;
use prisming_core::usecases::{InvokeUseCase, Response};
use prisming_ledger::{DatabasePool, SqliteLedger};

// ============================================================================
// Test helpers
// ============================================================================

struct Harness {
    ledger: Arc<SqliteLedger>,
    router: InvokeUseCase,
    repo: LedgerRepository,
}

async fn setup_with(config: Config) -> Harness {
    let pool = DatabasePool::in_memory()
        .await
        .expect("Failed to create in-memory database");
    let ledger = Arc::new(SqliteLedger::new(pool.pool().clone()));
    let router = InvokeUseCase::new(ledger.clone(), &config);
    let repo = LedgerRepository::new(ledger.clone());
    Harness {
        ledger,
        router,
        repo,
    }
}

async fn setup() -> Harness {
    setup_with(Config::default()).await
}

fn id(s: &str) -> RecordId {
    RecordId::new(s).unwrap()
}

impl Harness {
    async fn call(&self, function: &str, args: &[&str]) -> Response {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        self.router.invoke(function, &args).await
    }

    async fn ok(&self, function: &str, args: &[&str]) -> Vec<u8> {
        let response = self.call(function, args).await;
        assert!(
            response.is_success(),
            "{function}{args:?} failed: {:?}",
            response.message
        );
        response.payload
    }

    async fn fails(&self, function: &str, args: &[&str]) -> FailureKind {
        let response = self.call(function, args).await;
        assert!(!response.is_success(), "{function}{args:?} unexpectedly succeeded");
        response.kind.expect("failure without kind")
    }

    async fn donor(&self, key: &str) -> Donor {
        self.repo.find(&id(key)).await.unwrap().expect("donor")
    }

    async fn npo(&self, key: &str) -> Npo {
        self.repo.find(&id(key)).await.unwrap().expect("npo")
    }

    async fn recipient(&self, key: &str) -> Recipient {
        self.repo.find(&id(key)).await.unwrap().expect("recipient")
    }

    async fn asset(&self, key: &str) -> Asset {
        self.repo.find(&id(key)).await.unwrap().expect("asset")
    }

    async fn need(&self, key: &str) -> Need {
        self.repo.find(&id(key)).await.unwrap().expect("need")
    }

    /// Enrolls d1, n1 and r1 and proposes a1 ("Chair") from d1 to n1
    async fn seed(&self) {
        self.ok("enroll_donor", &["d1", "Alice", "555-0100"]).await;
        self.ok("enroll_npo", &["n1", "Helping Hands"]).await;
        self.ok("enroll_recipient", &["r1", "Bob", "individual"]).await;
        self.ok(
            "propose_asset",
            &["a1", "Chair", "d1", "n1", "furniture", "hash1"],
        )
        .await;
    }

    /// Checks that every asset link points at an asset that references back
    async fn assert_links_consistent(&self) {
        let snapshot = self.router.queries().read_everything().await.unwrap();
        for donor in &snapshot.donors {
            for asset_id in donor.asset_ids() {
                let asset = self.asset(asset_id.as_str()).await;
                assert_eq!(asset.donor_id(), donor.id());
            }
            let mut unique = donor.asset_ids().to_vec();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), donor.asset_ids().len());
        }
        for npo in &snapshot.npos {
            for asset_id in npo.asset_ids() {
                let asset = self.asset(asset_id.as_str()).await;
                assert_eq!(asset.npo_id(), npo.id());
            }
        }
        for need in &snapshot.needs {
            assert!(need.current_count() <= need.total_count());
            assert_eq!(need.is_complete(), need.current_count() == need.total_count());
        }
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_propose_scenario() {
    let h = setup().await;
    h.seed().await;

    let asset = h.asset("a1").await;
    assert_eq!(asset.status(), AssetStatus::Proposed);
    assert_eq!(asset.donor_id(), &id("d1"));
    assert_eq!(asset.npo_id(), &id("n1"));
    assert_eq!(h.donor("d1").await.asset_ids(), &[id("a1")]);
    assert_eq!(h.npo("n1").await.asset_ids(), &[id("a1")]);
    h.assert_links_consistent().await;
}

#[tokio::test]
async fn test_need_fulfilment_scenario() {
    let h = setup().await;
    h.seed().await;
    h.ok("enroll_needs", &["e1", "n1", "Chair", "furniture", "2"])
        .await;

    h.ok("approve_asset", &["a1", "n1"]).await;
    let need = h.need("e1").await;
    assert_eq!(need.current_count(), 1);
    assert_eq!(need.status(), NeedStatus::Incomplete);
    assert_eq!(h.donor("d1").await.credit(), 1);
    assert_eq!(h.asset("a1").await.status(), AssetStatus::Approved);

    h.ok(
        "propose_asset",
        &["a2", "Chair", "d1", "n1", "furniture", "hash2"],
    )
    .await;
    h.ok("approve_asset", &["a2", "n1"]).await;
    let need = h.need("e1").await;
    assert_eq!(need.current_count(), 2);
    assert_eq!(need.status(), NeedStatus::Complete);

    // A third chair no longer counts and the need never reverts
    h.ok(
        "propose_asset",
        &["a3", "Chair", "d1", "n1", "furniture", "hash3"],
    )
    .await;
    h.ok("approve_asset", &["a3", "n1"]).await;
    let need = h.need("e1").await;
    assert_eq!(need.current_count(), 2);
    assert_eq!(need.status(), NeedStatus::Complete);
    assert_eq!(h.donor("d1").await.credit(), 2);
    h.assert_links_consistent().await;
}

#[tokio::test]
async fn test_borrow_and_return_scenario() {
    let h = setup().await;
    h.seed().await;
    h.ok("approve_asset", &["a1", "n1"]).await;

    h.ok("borrow_asset", &["a1", "r1"]).await;
    assert_eq!(h.asset("a1").await.status(), AssetStatus::Borrowed);
    assert_eq!(h.recipient("r1").await.asset_ids(), &[id("a1")]);

    h.ok("get_back_asset", &["a1", "r1"]).await;
    let asset = h.asset("a1").await;
    assert_eq!(asset.status(), AssetStatus::Approved);
    assert_eq!(asset.owner_history().len(), 1);
    assert!(h.recipient("r1").await.asset_ids().is_empty());

    // Idempotent second return
    h.ok("get_back_asset", &["a1", "r1"]).await;
    assert!(h.recipient("r1").await.asset_ids().is_empty());
    assert_eq!(h.asset("a1").await.status(), AssetStatus::Approved);
}

#[tokio::test]
async fn test_give_then_return() {
    let h = setup().await;
    h.seed().await;
    h.ok("approve_asset", &["a1", "n1"]).await;
    h.ok("give_asset", &["a1", "r1"]).await;
    assert_eq!(h.asset("a1").await.status(), AssetStatus::Given);

    h.ok("get_back_asset", &["a1", "r1"]).await;
    assert_eq!(h.asset("a1").await.status(), AssetStatus::Approved);
}

#[tokio::test]
async fn test_delete_scenario() {
    let h = setup().await;
    h.seed().await;
    h.ok(
        "propose_asset",
        &["a2", "Table", "d1", "n1", "furniture", "hash2"],
    )
    .await;

    h.ok("delete_asset", &["a1", "n1"]).await;

    assert_eq!(h.donor("d1").await.asset_ids(), &[id("a2")]);
    assert_eq!(h.npo("n1").await.asset_ids(), &[id("a2")]);
    assert_eq!(h.fails("query", &["a1"]).await, FailureKind::NotFound);
    h.assert_links_consistent().await;
}

// ============================================================================
// Failure handling
// ============================================================================

#[tokio::test]
async fn test_duplicate_enrollment_keeps_original() {
    let h = setup().await;
    h.seed().await;
    assert_eq!(
        h.fails("enroll_donor", &["d1", "Mallory", "000"]).await,
        FailureKind::AlreadyExists
    );
    assert_eq!(h.donor("d1").await.name(), "Alice");
    assert_eq!(h.donor("d1").await.asset_ids(), &[id("a1")]);
}

#[tokio::test]
async fn test_borrow_of_proposed_asset_writes_nothing() {
    let h = setup().await;
    h.seed().await;
    let before = h.ledger.transaction_count().await.unwrap();

    assert_eq!(
        h.fails("borrow_asset", &["a1", "r1"]).await,
        FailureKind::InvalidTransition
    );
    assert_eq!(h.ledger.transaction_count().await.unwrap(), before);
    assert!(h.recipient("r1").await.asset_ids().is_empty());
}

#[tokio::test]
async fn test_ownership_is_enforced() {
    let h = setup().await;
    h.seed().await;
    h.ok("enroll_npo", &["n2", "Other"]).await;
    assert_eq!(
        h.fails("approve_asset", &["a1", "n2"]).await,
        FailureKind::OwnershipMismatch
    );
    assert_eq!(
        h.fails("delete_asset", &["a1", "n2"]).await,
        FailureKind::OwnershipMismatch
    );
    assert_eq!(h.asset("a1").await.status(), AssetStatus::Proposed);
}

#[tokio::test]
async fn test_router_rejects_bad_input() {
    let h = setup().await;
    let response = h.call("enroll_donor", &["d1"]).await;
    assert_eq!(
        response.message.as_deref(),
        Some("Incorrect number of arguments. Expecting 3")
    );
    let response = h.call("launch_rocket", &[]).await;
    assert_eq!(
        response.message.as_deref(),
        Some("Received unknown invoke function name - 'launch_rocket'")
    );
    h.ok("enroll_npo", &["n1", "Helping Hands"]).await;
    assert_eq!(
        h.fails("enroll_needs", &["e1", "n1", "Chair", "furniture", "-3"])
            .await,
        FailureKind::InvalidArgument
    );
    assert_eq!(
        h.fails("propose_asset", &["a1", "Chair", "d9", "n1", "f", "h"])
            .await,
        FailureKind::NotFound
    );
}

// ============================================================================
// Queries
// ============================================================================

#[tokio::test]
async fn test_history_of_deleted_asset() {
    let h = setup().await;
    h.seed().await;
    h.ok("approve_asset", &["a1", "n1"]).await;
    h.ok("delete_asset", &["a1", "n1"]).await;

    let payload = h.ok("get_history", &["a1"]).await;
    let history: serde_json::Value = serde_json::from_slice(&payload).unwrap();
    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["value"]["status"], "Proposed");
    assert_eq!(entries[1]["value"]["status"], "Approved");
    assert_eq!(entries[0]["isDelete"], false);
    assert_eq!(entries[1]["isDelete"], false);
    assert_eq!(entries[2]["isDelete"], true);
    assert_eq!(entries[2]["value"]["id"], "");
    assert_ne!(entries[0]["txId"], entries[2]["txId"]);
}

#[tokio::test]
async fn test_read_everything_same_in_both_scan_modes() {
    let by_kind = setup().await;
    by_kind.seed().await;
    by_kind
        .ok("enroll_needs", &["e1", "n1", "Chair", "furniture", "2"])
        .await;
    by_kind.ok("init", &[]).await;

    let config = ConfigBuilder::new().scan_mode(ScanMode::KeyPrefix).build();
    let by_prefix = InvokeUseCase::new(by_kind.ledger.clone(), &config);

    let expected = by_kind.ok("read_everything", &[]).await;
    let actual = by_prefix.invoke("read_everything", &[]).await;
    assert!(actual.is_success());
    assert_eq!(actual.payload, expected);

    let snapshot: serde_json::Value = serde_json::from_slice(&expected).unwrap();
    assert_eq!(snapshot["Donors"].as_array().unwrap().len(), 1);
    assert_eq!(snapshot["NPOs"][0]["needs"][0], "e1");
    assert_eq!(snapshot["Recipients"][0]["type"], "individual");
    assert_eq!(snapshot["Assets"][0]["doctype"], "Asset");
    assert_eq!(snapshot["Needs"][0]["totalcount"], 2);
}

#[tokio::test]
async fn test_init_marker_is_not_a_record() {
    let h = setup().await;
    h.ok("init", &[]).await;
    assert_eq!(h.ok("query", &["ui_version"]).await, b"0.0.1");
    assert!(h.router.queries().read_everything().await.unwrap().is_empty());
    assert_eq!(h.ledger.get("ui_version").await.unwrap(), Some(b"0.0.1".to_vec()));
}

// ============================================================================
// Concurrent operations on a file-backed ledger
// ============================================================================

#[tokio::test]
async fn test_concurrent_independent_enrollments_all_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let config = ConfigBuilder::new()
        .ledger_database(dir.path().join("ledger.db"))
        .build();
    let pool = DatabasePool::open(&config.ledger).await.unwrap();
    let ledger = Arc::new(SqliteLedger::new(pool.pool().clone()));
    let router = Arc::new(InvokeUseCase::new(ledger.clone(), &config));

    let mut handles = Vec::new();
    for i in 0..32 {
        let router = Arc::clone(&router);
        handles.push(tokio::spawn(async move {
            let args = vec![format!("d{i}"), format!("Donor {i}"), "555".to_string()];
            router.invoke("enroll_donor", &args).await
        }));
    }

    for handle in handles {
        let response = handle.await.unwrap();
        assert!(response.is_success(), "{:?}: {:?}", response.kind, response.message);
    }
    let snapshot = router.queries().read_everything().await.unwrap();
    assert_eq!(snapshot.donors.len(), 32);
}
