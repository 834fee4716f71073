//! Enroll command - Register participants and NPO needs

use anyhow::Result;
use clap::Subcommand;

use super::CliContext;

#[derive(Debug, Subcommand)]
pub enum EnrollCommand {
    /// Register a donor
    Donor {
        id: String,
        name: String,
        phone: String,
    },
    /// Register a non-profit organisation
    Npo { id: String, name: String },
    /// Register a recipient
    Recipient {
        id: String,
        name: String,
        /// Free-form recipient category
        recipient_type: String,
    },
    /// Declare a need on an existing NPO
    Need {
        need_id: String,
        npo_id: String,
        name: String,
        product_type: String,
        /// Number of units needed, at least 1
        total_count: String,
    },
}

impl EnrollCommand {
    /// Maps the subcommand onto a router operation name and its arguments
    pub fn to_invocation(&self) -> (&'static str, Vec<String>) {
        match self {
            EnrollCommand::Donor { id, name, phone } => {
                ("enroll_donor", vec![id.clone(), name.clone(), phone.clone()])
            }
            EnrollCommand::Npo { id, name } => ("enroll_npo", vec![id.clone(), name.clone()]),
            EnrollCommand::Recipient {
                id,
                name,
                recipient_type,
            } => (
                "enroll_recipient",
                vec![id.clone(), name.clone(), recipient_type.clone()],
            ),
            EnrollCommand::Need {
                need_id,
                npo_id,
                name,
                product_type,
                total_count,
            } => (
                "enroll_needs",
                vec![
                    need_id.clone(),
                    npo_id.clone(),
                    name.clone(),
                    product_type.clone(),
                    total_count.clone(),
                ],
            ),
        }
    }

    fn subject(&self) -> String {
        match self {
            EnrollCommand::Donor { id, .. } => format!("donor {id}"),
            EnrollCommand::Npo { id, .. } => format!("NPO {id}"),
            EnrollCommand::Recipient { id, .. } => format!("recipient {id}"),
            EnrollCommand::Need { need_id, npo_id, .. } => {
                format!("need {need_id} for NPO {npo_id}")
            }
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
                "args": args,
            }));
        } else {
            formatter.success(&format!("Enrolled {}", self.subject()));
        }
        Ok(())
    }
}
