//! Invoke command - Call any ledger operation by name
//!
//! Mirrors the positional calling convention of the operation router, so
//! `prisming invoke approve_asset a1 n1` is equivalent to
//! `prisming asset approve a1 n1`.

use anyhow::Result;
use clap::Args;
use prisming_core::usecases::Operation;

use super::{into_payload, print_payload, CliContext};

#[derive(Debug, Args)]
pub struct InvokeCommand {
    /// Operation name, e.g. enroll_donor or read_everything
    pub function: String,

    /// Positional arguments passed to the operation
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl InvokeCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        // Reject malformed calls before opening the database
        let op = Operation::parse(&self.function, &self.args)?;

        let router = ctx.router().await?;
        let response = router.invoke(&self.function, &self.args).await;
        let payload = into_payload(response)?;

        let formatter = ctx.formatter();
        if payload.is_empty() {
            if ctx.format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": true,
                    "operation": op.name(),
                }));
            } else {
                formatter.success(&format!("{} committed", op.name()));
            }
        } else {
            print_payload(&payload, formatter.as_ref(), ctx.format);
        }
        Ok(())
    }
}
