//! History command - Show every committed change to an asset

use anyhow::Result;
use clap::Args;
use prisming_core::domain::RecordId;

use super::CliContext;

#[derive(Debug, Args)]
pub struct HistoryCommand {
    /// Asset id
    pub asset_id: String,
}

impl HistoryCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let asset_id = RecordId::new(&self.asset_id)?;
        let router = ctx.router().await?;
        let history = router.queries().get_history(&asset_id).await?;
        let formatter = ctx.formatter();

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::to_value(&history)?);
            return Ok(());
        }

        if history.is_empty() {
            formatter.info(&format!("No history for asset {asset_id}"));
            return Ok(());
        }

        for entry in &history {
            let state = if entry.is_deletion() {
                "deleted".to_string()
            } else {
                format!("{} {}", entry.value.status().name(), entry.value.name())
            };
            formatter.data(&format!(
                "{}  {}  {}",
                entry.timestamp.to_rfc3339(),
                entry.tx_id,
                state
            ));
        }
        Ok(())
    }
}
