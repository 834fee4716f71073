//! Use cases (interactors) for Prisming
//!
//! This module contains the application use cases that orchestrate
//! domain entities and the ledger port. Use cases are thin coordinators
//! that delegate business rules to domain methods and I/O to a
//! [`LedgerTransaction`](crate::repository::LedgerTransaction).
//!
//! ## Use Cases
//!
//! - [`EnrollmentUseCase`] - Donor, NPO, recipient and need enrollment
//! - [`AssetLifecycleUseCase`] - Propose, approve, lend, give, return and delete assets
//! - [`AggregateQueryUseCase`] - Raw lookups, full snapshots and asset history
//! - [`InvokeUseCase`] - Name-and-arguments operation router

pub mod aggregate_query;
pub mod asset_lifecycle;
pub mod enrollment;
pub mod invoke;

pub use aggregate_query::AggregateQueryUseCase;
pub use asset_lifecycle::AssetLifecycleUseCase;
pub use enrollment::EnrollmentUseCase;
pub use invoke::{InvokeUseCase, Operation, Response, ResponseStatus};
