//! Serializable whole-graph snapshot.
//!
//! # Invariants
//! - `version` is a semantic version string of the snapshot schema.
//! - `root_id`, when set, names a person in `people`.

use crate::model::person::{now_epoch_ms, Person, PersonId};
use serde::{Deserialize, Serialize};

/// Schema version written by this build.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Full state of the person collection at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub people: Vec<Person>,
    pub version: String,
    pub created_at: i64,
    pub updated_at: i64,
    /// Explicit root pointer; older payloads may omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_id: Option<PersonId>,
}

impl Snapshot {
    /// Fresh snapshot seeded with one generation-0 root person.
    pub fn seeded() -> Self {
        let now = now_epoch_ms();
        let root = Person::root(now);
        Self {
            root_id: Some(root.id.clone()),
            people: vec![root],
            version: SCHEMA_VERSION.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}
