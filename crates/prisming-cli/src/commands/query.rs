//! Query command - Read the raw value stored under a key

use anyhow::Result;
use clap::Args;

use super::{print_payload, CliContext};

#[derive(Debug, Args)]
pub struct QueryCommand {
    /// Ledger key to read
    pub key: String,
}

impl QueryCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let payload = ctx.run("query", std::slice::from_ref(&self.key)).await?;
        let formatter = ctx.formatter();
        print_payload(&payload, formatter.as_ref(), ctx.format);
        Ok(())
    }
}
