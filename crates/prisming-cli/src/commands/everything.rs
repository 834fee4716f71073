//! Everything command - Dump every record grouped by kind

use anyhow::Result;
use clap::Args;

use super::CliContext;

#[derive(Debug, Args)]
pub struct EverythingCommand {}

impl EverythingCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let router = ctx.router().await?;
        let snapshot = router.queries().read_everything().await?;
        let formatter = ctx.formatter();

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::to_value(&snapshot)?);
            return Ok(());
        }

        formatter.success(&format!("{} records", snapshot.len()));
        formatter.data(&format!("Donors ({})", snapshot.donors.len()));
        for donor in &snapshot.donors {
            formatter.data(&format!(
                "  {}  {}  credit={}  assets={}",
                donor.id(),
                donor.name(),
                donor.credit(),
                donor.asset_ids().len()
            ));
        }
        formatter.data(&format!("NPOs ({})", snapshot.npos.len()));
        for npo in &snapshot.npos {
            formatter.data(&format!(
                "  {}  {}  assets={}  needs={}",
                npo.id(),
                npo.name(),
                npo.asset_ids().len(),
                npo.need_ids().len()
            ));
        }
        formatter.data(&format!("Recipients ({})", snapshot.recipients.len()));
        for recipient in &snapshot.recipients {
            formatter.data(&format!(
                "  {}  {}  {}  assets={}",
                recipient.id(),
                recipient.name(),
                recipient.recipient_type(),
                recipient.asset_ids().len()
            ));
        }
        formatter.data(&format!("Assets ({})", snapshot.assets.len()));
        for asset in &snapshot.assets {
            formatter.data(&format!(
                "  {}  {}  {}  npo={}",
                asset.id(),
                asset.name(),
                asset.status().name(),
                asset.npo_id()
            ));
        }
        formatter.data(&format!("Needs ({})", snapshot.needs.len()));
        for need in &snapshot.needs {
            formatter.data(&format!(
                "  {}  {}  {}/{}",
                need.id(),
                need.name(),
                need.current_count(),
                need.total_count()
            ));
        }
        Ok(())
    }
}
