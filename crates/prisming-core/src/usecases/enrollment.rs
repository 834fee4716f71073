//! Enrollment use case
//!
//! Registers the participants of the donation network (donors, NPOs and
//! recipients) and the needs an NPO declares. Each call is one ledger
//! transaction.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::{
    config::LifecycleConfig,
    domain::{Donor, LedgerRecord, Need, Npo, Recipient, RecordId, TxId},
    ports::ILedger,
    repository::{LedgerRepository, LedgerTransaction},
};

/// Use case for enrolling participants and needs
pub struct EnrollmentUseCase {
    repository: LedgerRepository,
    policy: LifecycleConfig,
}

impl EnrollmentUseCase {
    /// Creates a new EnrollmentUseCase
    ///
    /// # Arguments
    ///
    /// * `ledger` - Ledger holding every record
    /// * `policy` - Lifecycle switches; `allow_overwrite` decides whether an
    ///   enrollment may replace an existing record
    pub fn new(ledger: Arc<dyn ILedger + Send + Sync>, policy: LifecycleConfig) -> Self {
        Self {
            repository: LedgerRepository::new(ledger),
            policy,
        }
    }

    /// Enrolls a donor with zero credit and no assets
    pub async fn enroll_donor(&self, id: &RecordId, name: &str, phone: &str) -> Result<TxId> {
        let donor = Donor::new(id.clone(), name, phone);
        let tx_id = self.create(donor).await?;
        info!(donor_id = %id, tx_id = %tx_id, "Enrolled donor");
        Ok(tx_id)
    }

    /// Enrolls an NPO with no assets and no needs
    pub async fn enroll_npo(&self, id: &RecordId, name: &str) -> Result<TxId> {
        let npo = Npo::new(id.clone(), name);
        let tx_id = self.create(npo).await?;
        info!(npo_id = %id, tx_id = %tx_id, "Enrolled NPO");
        Ok(tx_id)
    }

    /// Enrolls a recipient with no assets
    pub async fn enroll_recipient(
        &self,
        id: &RecordId,
        name: &str,
        recipient_type: &str,
    ) -> Result<TxId> {
        let recipient = Recipient::new(id.clone(), name, recipient_type);
        let tx_id = self.create(recipient).await?;
        info!(recipient_id = %id, tx_id = %tx_id, "Enrolled recipient");
        Ok(tx_id)
    }

    /// Declares a need on behalf of an NPO
    ///
    /// The need starts Incomplete with a current count of zero and its id
    /// is appended to the NPO's needs. Need and NPO are written together.
    ///
    /// # Errors
    ///
    /// - `DomainError::NotFound` if the NPO does not exist
    /// - `DomainError::InvalidArgument` if `total_count` is zero
    /// - `DomainError::AlreadyExists` if `need_id` is taken and overwrites
    ///   are disabled
    pub async fn enroll_needs(
        &self,
        need_id: &RecordId,
        npo_id: &RecordId,
        name: &str,
        product_type: &str,
        total_count: u32,
    ) -> Result<TxId> {
        let need = Need::declare(
            need_id.clone(),
            npo_id.clone(),
            name,
            product_type,
            total_count,
        )?;

        let mut tx = self.repository.begin();
        let mut npo: Npo = tx.load(npo_id).await?;
        self.claim::<Need>(&mut tx, need_id).await?;

        npo.declare_need(need_id);
        tx.stage(&need)?;
        tx.stage(&npo)?;
        let tx_id = tx.commit().await?;

        info!(
            need_id = %need_id,
            npo_id = %npo_id,
            total_count,
            tx_id = %tx_id,
            "Enrolled need"
        );
        Ok(tx_id)
    }

    async fn create<T: LedgerRecord>(&self, record: T) -> Result<TxId> {
        let mut tx = self.repository.begin();
        self.claim::<T>(&mut tx, record.record_id()).await?;
        tx.stage(&record)?;
        tx.commit().await
    }

    async fn claim<T: LedgerRecord>(&self, tx: &mut LedgerTransaction, id: &RecordId) -> Result<()> {
        if self.policy.allow_overwrite {
            return Ok(());
        }
        tx.ensure_vacant(T::KIND, id).await
    }
}
