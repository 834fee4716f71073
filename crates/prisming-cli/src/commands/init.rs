//! Init command - Prepare the ledger
//!
//! Provides the `prisming init` CLI command which creates the ledger
//! database if needed and writes the UI compatibility marker.

use anyhow::Result;
use clap::Args;
use prisming_core::usecases::invoke::{UI_VERSION, UI_VERSION_KEY};
use tracing::info;

use super::CliContext;

/// Arguments for the init subcommand
#[derive(Debug, Args)]
pub struct InitCommand {}

impl InitCommand {
    /// Execute the init command
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        ctx.run("init", &[]).await?;

        info!(database = %ctx.config.ledger.database.display(), "Ledger ready");

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "database": ctx.config.ledger.database.display().to_string(),
                "ui_version": UI_VERSION,
            }));
        } else {
            formatter.success(&format!(
                "Ledger initialised at {}",
                ctx.config.ledger.database.display()
            ));
            formatter.info(&format!("{UI_VERSION_KEY} = {UI_VERSION}"));
        }
        Ok(())
    }
}
