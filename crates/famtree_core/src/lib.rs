//! Core engine for building and drawing family trees.
//! This crate is the single source of truth for family graph invariants.

pub mod config;
pub mod db;
pub mod graph;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod snapshot;

pub use config::{ConfigError, CoreConfig, LoggingConfig};
pub use graph::eligibility::{
    eligible_children, eligible_parents, is_ancestor_of, is_descendant_of, ChildCriteria,
};
pub use graph::layout::{
    compute_layout, EdgeKind, LayoutConfig, LayoutEdge, LayoutNode, TreeLayout,
};
pub use graph::store::{AddOutcome, GraphStore, StoreError, StoreResult};
pub use graph::sync::{synchronize_all, synchronize_person};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::event::{EventFields, EventKind, EventValidationError, LifeEvent, PartialDate};
pub use model::person::{
    generation_label, Person, PersonDraft, PersonId, PersonPatch, PersonValidationError,
};
pub use model::snapshot::{Snapshot, SCHEMA_VERSION};
pub use repo::snapshot_repo::{
    MemorySnapshotRepository, RepoError, RepoResult, SnapshotRepository,
    SqliteSnapshotRepository, SNAPSHOT_KEY,
};
pub use service::family_service::{FamilyResult, FamilyService, FamilyServiceError};
pub use service::snapshot_service::SnapshotService;
pub use snapshot::{check_person_ids, decode_token, encode_token, ImportError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
