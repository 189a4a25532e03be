//! Family graph domain model.
//!
//! # Responsibility
//! - Define person, life-event and snapshot records used by core logic.
//! - Keep the serialized shape stable for persistence and share tokens.
//!
//! # Invariants
//! - Every person is identified by a stable, non-empty `PersonId`.
//! - Events are built through `LifeEvent::from_fields`, never piecemeal.

pub mod event;
pub mod person;
pub mod snapshot;
