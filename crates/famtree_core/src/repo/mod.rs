//! Persistence adapters for family graph snapshots.
//!
//! # Responsibility
//! - Define the snapshot storage contract consumed by services.
//! - Provide SQLite and in-memory implementations.
//!
//! # Invariants
//! - Repositories store whole snapshots; they never see partial edits.

pub mod snapshot_repo;
