//! Prisming Ledger - SQLite key-value ledger
//!
//! SQLite-backed storage for:
//! - The current value and version of every key
//! - A kind index used by category scans
//! - The per-key change history, grouped by transaction
//!
//! ## Architecture
//!
//! This crate implements the `ILedger` port from `prisming-core` using
//! SQLite as the storage backend. It is a driven (secondary) adapter in
//! the hexagonal architecture.
//!
//! ## Key Components
//!
//! - [`DatabasePool`] - Connection pool with migration support
//! - [`SqliteLedger`] - Full `ILedger` implementation
//! - [`LedgerError`] - Error types for ledger storage
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use prisming_core::ports::ILedger;
//! use prisming_ledger::{DatabasePool, SqliteLedger};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/home/user/.local/share/prisming/ledger.db")).await?;
//! let ledger: Arc<dyn ILedger + Send + Sync> = Arc::new(SqliteLedger::new(pool.pool().clone()));
//! ledger.put("ui_version", b"0.0.1").await?;
//! # Ok(())
//! # }
//! ```

pub mod pool;
pub mod sqlite_ledger;

pub use pool::DatabasePool;
pub use sqlite_ledger::SqliteLedger;

/// Errors that can occur in ledger storage
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored transaction id or timestamp could not be parsed
    #[error("Corrupt ledger row: {0}")]
    CorruptRow(String),
}

