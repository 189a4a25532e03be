//! Family graph engine.
//!
//! # Responsibility
//! - `store`: authoritative in-memory collection and mutation protocol.
//! - `sync`: partner reciprocity after mutations.
//! - `eligibility`: cycle-safe parent/child candidate queries.
//! - `layout`: deterministic generational diagram layout.
//!
//! # Invariants
//! - All operations are synchronous and total except store mutations, which
//!   return `StoreError` values instead of panicking.

pub mod eligibility;
pub mod layout;
pub mod store;
pub mod sync;
