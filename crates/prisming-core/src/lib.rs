//! Prisming Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Donor`, `Npo`, `Recipient`, `Asset`, `Need`
//! - **Use cases** - enrollment, the asset lifecycle, aggregate queries and
//!   the string-based operation router
//! - **Port definitions** - `ILedger`, the key-value ledger every record lives in
//! - **State machine** - the asset transition table
//!
//! # Architecture
//!
//! The domain module contains pure business logic with no I/O. The ledger
//! port is implemented by adapter crates; [`repository`] layers typed,
//! transactional access on top of it for the use cases.

pub mod config;
pub mod domain;
pub mod ports;
pub mod repository;
pub mod usecases;

#[cfg(test)]
mod testing;
