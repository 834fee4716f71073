//! CLI subcommands
//!
//! Every command receives a [`CliContext`] holding the resolved
//! configuration and output format. Commands that touch the ledger open it
//! through [`CliContext::router`].

pub mod asset;
pub mod completions;
pub mod config;
pub mod enroll;
pub mod everything;
pub mod history;
pub mod init;
pub mod invoke;
pub mod query;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use prisming_core::config::Config;
use prisming_core::usecases::{InvokeUseCase, Response};
use prisming_ledger::{DatabasePool, SqliteLedger};

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

/// Shared state handed to every command
pub struct CliContext {
    pub config_path: PathBuf,
    pub config: Config,
    pub format: OutputFormat,
}

impl CliContext {
    /// Resolves the configuration file and loads it, falling back to
    /// defaults when it is missing or unreadable
    pub fn load(custom_path: Option<&str>, format: OutputFormat) -> Self {
        let config_path = custom_path
            .map(PathBuf::from)
            .unwrap_or_else(Config::default_path);
        let config = Config::load_or_default(&config_path);
        Self {
            config_path,
            config,
            format,
        }
    }

    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        get_formatter(self.format)
    }

    /// Opens the ledger database and wires the operation router to it
    pub async fn router(&self) -> Result<InvokeUseCase> {
        let pool = DatabasePool::open(&self.config.ledger)
            .await
            .with_context(|| {
                format!(
                    "Failed to open ledger at {}",
                    self.config.ledger.database.display()
                )
            })?;
        let ledger = Arc::new(SqliteLedger::new(pool.pool().clone()));
        Ok(InvokeUseCase::new(ledger, &self.config))
    }

    /// Runs a named operation and converts a failed response into an error
    ///
    /// Returns the success payload.
    pub async fn run(&self, function: &str, args: &[String]) -> Result<Vec<u8>> {
        let router = self.router().await?;
        let response = router.invoke(function, args).await;
        into_payload(response)
    }
}

/// Unwraps a router response
pub fn into_payload(response: Response) -> Result<Vec<u8>> {
    if response.is_success() {
        return Ok(response.payload);
    }
    let kind = response
        .kind
        .map(|k| k.to_string())
        .unwrap_or_else(|| "error".to_string());
    let message = response.message.unwrap_or_default();
    anyhow::bail!("{message} ({kind})")
}

/// Prints a payload: pretty JSON when it parses as JSON, text otherwise
pub fn print_payload(payload: &[u8], formatter: &dyn OutputFormatter, format: OutputFormat) {
    match serde_json::from_slice::<serde_json::Value>(payload) {
        Ok(value) if format.is_json() => formatter.print_json(&value),
        Ok(value) => {
            let pretty = serde_json::to_string_pretty(&value).unwrap_or_default();
            for line in pretty.lines() {
                formatter.data(line);
            }
        }
        Err(_) => {
            let text = String::from_utf8_lossy(payload);
            if format.is_json() {
                formatter.print_json(&serde_json::Value::String(text.into_owned()));
            } else {
                formatter.data(&text);
            }
        }
    }
}
