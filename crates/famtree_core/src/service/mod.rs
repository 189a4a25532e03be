//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate graph store, persistence and share-token calls.
//! - Keep presentation layers decoupled from storage details.

pub mod family_service;
pub mod snapshot_service;
