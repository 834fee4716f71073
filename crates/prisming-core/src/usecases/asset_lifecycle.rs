//! Asset lifecycle use case
//!
//! Drives an asset from proposal to approval, lending, giving, return and
//! deletion, keeping the donor, NPO, recipient and need records that
//! reference it consistent. Every operation loads what it needs into one
//! [`LedgerTransaction`](crate::repository::LedgerTransaction) and commits
//! all of its writes together, so a failure at any step writes nothing.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::{
    config::LifecycleConfig,
    domain::{
        Asset, AssetEvent, Donor, LedgerRecord, Need, Npo, Recipient, RecordId, TxId,
    },
    ports::ILedger,
    repository::LedgerRepository,
};

/// Use case for the asset state machine and its side effects
pub struct AssetLifecycleUseCase {
    repository: LedgerRepository,
    policy: LifecycleConfig,
}

impl AssetLifecycleUseCase {
    /// Creates a new AssetLifecycleUseCase
    ///
    /// # Arguments
    ///
    /// * `ledger` - Ledger holding every record
    /// * `policy` - Lifecycle switches (overwrite and need-matching rules)
    pub fn new(ledger: Arc<dyn ILedger + Send + Sync>, policy: LifecycleConfig) -> Self {
        Self {
            repository: LedgerRepository::new(ledger),
            policy,
        }
    }

    /// Proposes a donated asset to an NPO
    ///
    /// This method:
    /// 1. Loads the donor and the NPO
    /// 2. Rejects an asset id that is already in use
    /// 3. Creates the asset in the Proposed state
    /// 4. Attaches the asset to the donor's and the NPO's lists
    ///
    /// # Errors
    ///
    /// - `DomainError::NotFound` if the donor or NPO does not exist
    /// - `DomainError::AlreadyExists` if `asset_id` is taken and overwrites
    ///   are disabled
    pub async fn propose_asset(
        &self,
        asset_id: &RecordId,
        name: &str,
        donor_id: &RecordId,
        npo_id: &RecordId,
        product_type: &str,
        picture_hash: &str,
    ) -> Result<TxId> {
        let mut tx = self.repository.begin();
        let mut donor: Donor = tx.load(donor_id).await?;
        let mut npo: Npo = tx.load(npo_id).await?;
        if !self.policy.allow_overwrite {
            tx.ensure_vacant(Asset::KIND, asset_id).await?;
        }

        let asset = Asset::propose(
            asset_id.clone(),
            name,
            donor_id.clone(),
            npo_id.clone(),
            product_type,
            picture_hash,
        );
        donor.attach_asset(asset_id);
        npo.attach_asset(asset_id);

        tx.stage(&asset)?;
        tx.stage(&donor)?;
        tx.stage(&npo)?;
        let tx_id = tx.commit().await?;

        info!(
            asset_id = %asset_id,
            donor_id = %donor_id,
            npo_id = %npo_id,
            tx_id = %tx_id,
            "Proposed asset"
        );
        Ok(tx_id)
    }

    /// Approves a proposed asset and credits the first need it fulfils
    ///
    /// The NPO's needs are walked in declaration order. The first one that
    /// is still Incomplete and whose name equals the asset's name (and, with
    /// `match_need_product_type`, whose product type matches too) gains one
    /// unit, and the donor gains one credit. Without a match the asset is
    /// still approved.
    ///
    /// # Errors
    ///
    /// - `DomainError::OwnershipMismatch` if the asset belongs to another NPO
    /// - `DomainError::InvalidState` if the asset is not Proposed
    /// - `DomainError::NotFound` if the asset or NPO does not exist
    pub async fn approve_asset(&self, asset_id: &RecordId, npo_id: &RecordId) -> Result<TxId> {
        let mut tx = self.repository.begin();
        let mut asset: Asset = tx.load(asset_id).await?;
        asset.ensure_owned_by(npo_id)?;
        asset.approve()?;

        let npo: Npo = tx.load(npo_id).await?;
        let product_type = self
            .policy
            .match_need_product_type
            .then(|| asset.product_type());

        let mut fulfilled: Option<Need> = None;
        for need_id in npo.need_ids() {
            let Some(mut need) = tx.find::<Need>(need_id).await? else {
                warn!(need_id = %need_id, npo_id = %npo_id, "Skipping need missing from ledger");
                continue;
            };
            if need.accepts(asset.name(), product_type) {
                need.record_fulfillment()?;
                fulfilled = Some(need);
                break;
            }
        }

        if let Some(need) = &fulfilled {
            let mut donor: Donor = tx.load(asset.donor_id()).await?;
            donor.award_credit();
            debug!(
                need_id = %need.id(),
                current_count = need.current_count(),
                total_count = need.total_count(),
                "Asset counts towards need"
            );
            tx.stage(need)?;
            tx.stage(&donor)?;
        }
        tx.stage(&asset)?;
        let tx_id = tx.commit().await?;

        info!(
            asset_id = %asset_id,
            npo_id = %npo_id,
            need_id = fulfilled.as_ref().map(|need| need.id().as_str()),
            tx_id = %tx_id,
            "Approved asset"
        );
        Ok(tx_id)
    }

    /// Deletes an asset and removes it from its NPO's and donor's lists
    ///
    /// Allowed from every status, but only by the owning NPO.
    pub async fn delete_asset(&self, asset_id: &RecordId, npo_id: &RecordId) -> Result<TxId> {
        let mut tx = self.repository.begin();
        let asset: Asset = tx.load(asset_id).await?;
        asset.ensure_owned_by(npo_id)?;

        let mut npo: Npo = tx.load(asset.npo_id()).await?;
        let mut donor: Donor = tx.load(asset.donor_id()).await?;
        npo.detach_asset(asset_id);
        donor.detach_asset(asset_id);

        tx.stage_delete(asset_id);
        tx.stage(&npo)?;
        tx.stage(&donor)?;
        let tx_id = tx.commit().await?;

        info!(
            asset_id = %asset_id,
            npo_id = %npo_id,
            status = asset.status().name(),
            tx_id = %tx_id,
            "Deleted asset"
        );
        Ok(tx_id)
    }

    /// Lends an approved asset to a recipient
    pub async fn borrow_asset(
        &self,
        asset_id: &RecordId,
        recipient_id: &RecordId,
    ) -> Result<TxId> {
        self.hand_over(asset_id, recipient_id, AssetEvent::Borrow)
            .await
    }

    /// Gives an approved asset to a recipient
    pub async fn give_asset(&self, asset_id: &RecordId, recipient_id: &RecordId) -> Result<TxId> {
        self.hand_over(asset_id, recipient_id, AssetEvent::Give)
            .await
    }

    /// Returns an asset from a recipient to the NPO's pool
    ///
    /// Returning an asset that is already Approved is a no-op transition,
    /// so calling this twice leaves the same state.
    pub async fn get_back_asset(
        &self,
        asset_id: &RecordId,
        recipient_id: &RecordId,
    ) -> Result<TxId> {
        let mut tx = self.repository.begin();
        let mut asset: Asset = tx.load(asset_id).await?;
        let mut recipient: Recipient = tx.load(recipient_id).await?;

        asset.take_back()?;
        recipient.detach_asset(asset_id);

        tx.stage(&asset)?;
        tx.stage(&recipient)?;
        let tx_id = tx.commit().await?;

        info!(
            asset_id = %asset_id,
            recipient_id = %recipient_id,
            tx_id = %tx_id,
            "Asset returned"
        );
        Ok(tx_id)
    }

    async fn hand_over(
        &self,
        asset_id: &RecordId,
        recipient_id: &RecordId,
        event: AssetEvent,
    ) -> Result<TxId> {
        let mut tx = self.repository.begin();
        let mut asset: Asset = tx.load(asset_id).await?;
        let mut recipient: Recipient = tx.load(recipient_id).await?;

        match event {
            AssetEvent::Give => asset.give_to(&recipient)?,
            _ => asset.lend_to(&recipient)?,
        }
        recipient.attach_asset(asset_id);

        tx.stage(&asset)?;
        tx.stage(&recipient)?;
        let tx_id = tx.commit().await?;

        info!(
            asset_id = %asset_id,
            recipient_id = %recipient_id,
            status = asset.status().name(),
            tx_id = %tx_id,
            "Asset handed over"
        );
        Ok(tx_id)
    }
}
