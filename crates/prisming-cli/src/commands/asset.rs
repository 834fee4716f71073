//! Asset command - Drive an asset through its lifecycle

use anyhow::Result;
use clap::Subcommand;

use super::CliContext;

#[derive(Debug, Subcommand)]
pub enum AssetCommand {
    /// Propose a donated asset to an NPO
    Propose {
        asset_id: String,
        name: String,
        donor_id: String,
        npo_id: String,
        product_type: String,
        picture_hash: String,
    },
    /// Approve a proposed asset, fulfilling a matching need if any
    Approve { asset_id: String, npo_id: String },
    /// Delete an asset owned by the NPO
    Delete { asset_id: String, npo_id: String },
    /// Lend an approved asset to a recipient
    Borrow {
        asset_id: String,
        recipient_id: String,
    },
    /// Give an approved asset to a recipient
    Give {
        asset_id: String,
        recipient_id: String,
    },
    /// Take a lent asset back from a recipient
    Return {
        asset_id: String,
        recipient_id: String,
    },
}

impl AssetCommand {
    /// Maps the subcommand onto a router operation name and its arguments
    pub fn to_invocation(&self) -> (&'static str, Vec<String>) {
        match self {
            AssetCommand::Propose {
                asset_id,
                name,
                donor_id,
                npo_id,
                product_type,
                picture_hash,
            } => (
                "propose_asset",
                vec![
                    asset_id.clone(),
                    name.clone(),
                    donor_id.clone(),
                    npo_id.clone(),
                    product_type.clone(),
                    picture_hash.clone(),
                ],
            ),
            AssetCommand::Approve { asset_id, npo_id } => {
                ("approve_asset", vec![asset_id.clone(), npo_id.clone()])
            }
            AssetCommand::Delete { asset_id, npo_id } => {
                ("delete_asset", vec![asset_id.clone(), npo_id.clone()])
            }
            AssetCommand::Borrow {
                asset_id,
                recipient_id,
            } => ("borrow_asset", vec![asset_id.clone(), recipient_id.clone()]),
            AssetCommand::Give {
                asset_id,
                recipient_id,
            } => ("give_asset", vec![asset_id.clone(), recipient_id.clone()]),
            AssetCommand::Return {
                asset_id,
                recipient_id,
            } => (
                "get_back_asset",
                vec![asset_id.clone(), recipient_id.clone()],
            ),
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            AssetCommand::Propose { .. } => "Proposed",
            AssetCommand::Approve { .. } => "Approved",
            AssetCommand::Delete { .. } => "Deleted",
            AssetCommand::Borrow { .. } => "Lent",
            AssetCommand::Give { .. } => "Gave",
            AssetCommand::Return { .. } => "Took back",
        }
    }

    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let (function, args) = self.to_invocation();
        ctx.run(function, &args).await?;

        let formatter = ctx.formatter();
        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "operation": function,
                "asset": args[0],
            }));
        } else {
            formatter.success(&format!("{} asset {}", self.verb(), args[0]));
        }
        Ok(())
    }
}
