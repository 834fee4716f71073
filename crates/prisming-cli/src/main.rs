//! Prisming CLI - Command-line interface for the donation ledger
//!
//! Provides commands for:
//! - Preparing the ledger
//! - Enrolling donors, NPOs, recipients and needs
//! - Moving assets through their lifecycle
//! - Querying keys, full snapshots and asset history
//! - Calling any operation by name

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    asset::AssetCommand, completions::CompletionsCommand, config::ConfigCommand,
    enroll::EnrollCommand, everything::EverythingCommand, history::HistoryCommand,
    init::InitCommand, invoke::InvokeCommand, query::QueryCommand, CliContext,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "prisming",
    version,
    about = "Ledger for donated assets, NPOs and recipients"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<String>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the ledger and write the UI version marker
    Init(InitCommand),
    /// Register donors, NPOs, recipients and needs
    #[command(subcommand)]
    Enroll(EnrollCommand),
    /// Propose, approve, lend, give or delete assets
    #[command(subcommand)]
    Asset(AssetCommand),
    /// Read the raw value stored under a key
    Query(QueryCommand),
    /// Show every record grouped by kind
    Everything(EverythingCommand),
    /// Show the change history of an asset
    History(HistoryCommand),
    /// Call a ledger operation by name with positional arguments
    Invoke(InvokeCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

/// Picks the log filter from the flags, falling back to the configured level
fn log_filter(verbose: u8, quiet: bool, configured: &str) -> String {
    if quiet {
        return "error".to_string();
    }
    match verbose {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

fn init_tracing(cli: &Cli, ctx: &CliContext) {
    let filter = log_filter(cli.verbose, cli.quiet, &ctx.config.logging.level);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so command output on stdout stays parseable
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if ctx.config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let format = OutputFormat::from_flags(cli.json, cli.quiet);
    let ctx = CliContext::load(cli.config.as_deref(), format);
    init_tracing(&cli, &ctx);

    let result = match &cli.command {
        Commands::Init(cmd) => cmd.execute(&ctx).await,
        Commands::Enroll(cmd) => cmd.execute(&ctx).await,
        Commands::Asset(cmd) => cmd.execute(&ctx).await,
        Commands::Query(cmd) => cmd.execute(&ctx).await,
        Commands::Everything(cmd) => cmd.execute(&ctx).await,
        Commands::History(cmd) => cmd.execute(&ctx).await,
        Commands::Invoke(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
        Commands::Completions(cmd) => cmd.execute(&ctx).await,
    };

    if let Err(e) = result {
        ctx.formatter().error(&format!("{e:#}"));
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["prisming", "everything", "--json", "-vv"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Everything(_)));
    }

    #[test]
    fn test_parse_asset_return() {
        let cli = Cli::try_parse_from(["prisming", "asset", "return", "a1", "r1"]).unwrap();
        match cli.command {
            Commands::Asset(AssetCommand::Return {
                asset_id,
                recipient_id,
            }) => {
                assert_eq!(asset_id, "a1");
                assert_eq!(recipient_id, "r1");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_invoke_collects_args() {
        let cli = Cli::try_parse_from([
            "prisming",
            "invoke",
            "enroll_donor",
            "d1",
            "Alice",
            "-555",
        ])
        .unwrap();
        match cli.command {
            Commands::Invoke(cmd) => {
                assert_eq!(cmd.function, "enroll_donor");
                assert_eq!(cmd.args, vec!["d1", "Alice", "-555"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_enroll_need_requires_all_arguments() {
        assert!(Cli::try_parse_from(["prisming", "enroll", "need", "e1", "n1"]).is_err());
    }

    #[test]
    fn test_log_filter() {
        assert_eq!(log_filter(0, false, "warn"), "warn");
        assert_eq!(log_filter(1, false, "warn"), "debug");
        assert_eq!(log_filter(3, false, "warn"), "trace");
        assert_eq!(log_filter(2, true, "warn"), "error");
    }
}
