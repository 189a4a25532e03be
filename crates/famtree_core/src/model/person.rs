//! Person domain model.
//!
//! # Responsibility
//! - Define the canonical node record of the family graph.
//! - Provide draft/patch inputs used by graph store mutations.
//!
//! # Invariants
//! - `id` is non-empty, stable and never reused.
//! - `parent_ids` never contains `id`.
//! - `generation` is assigned at creation and not recomputed afterwards.
//! - `updated_at >= created_at` for records produced by the store.

use crate::model::event::{EventKind, EventValidationError, LifeEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Opaque person identifier.
///
/// Fresh ids are UUID v4 text; imported ids are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    /// Generates a new random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for PersonId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PersonId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for PersonId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reasons a person record is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonValidationError {
    EmptyId,
    SelfParent(PersonId),
    SelfPartner(PersonId),
    Event {
        kind: EventKind,
        source: EventValidationError,
    },
}

impl Display for PersonValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "person id must not be empty"),
            Self::SelfParent(id) => write!(f, "person {id} cannot be their own parent"),
            Self::SelfPartner(id) => write!(f, "person {id} cannot be their own partner"),
            Self::Event { kind, source } => write!(f, "invalid {kind} event: {source}"),
        }
    }
}

impl Error for PersonValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Event { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// One individual in the family graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: PersonId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    /// 0 = self, positive = ancestors, negative = descendants.
    #[serde(default)]
    pub generation: i32,
    /// Omitted from the wire format when empty.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub parent_ids: BTreeSet<PersonId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth: Option<LifeEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death: Option<LifeEvent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marriages: Vec<LifeEvent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub divorces: Vec<LifeEvent>,
    /// Unix epoch milliseconds.
    #[serde(default)]
    pub created_at: i64,
    /// Unix epoch milliseconds.
    #[serde(default)]
    pub updated_at: i64,
}

/// Creation input. The store supplies id, generation and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonDraft {
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub parent_ids: BTreeSet<PersonId>,
    pub birth: Option<LifeEvent>,
    pub death: Option<LifeEvent>,
    pub marriages: Vec<LifeEvent>,
    pub divorces: Vec<LifeEvent>,
}

impl PersonDraft {
    pub fn named(given_name: impl Into<String>, family_name: impl Into<String>) -> Self {
        Self {
            given_name: Some(given_name.into()),
            family_name: Some(family_name.into()),
            ..Self::default()
        }
    }
}

/// Shallow update. `None` leaves a field untouched.
///
/// Nullable fields use `Some(None)` to clear. Collections replace the stored
/// value wholesale. Generation is not patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonPatch {
    pub given_name: Option<Option<String>>,
    pub family_name: Option<Option<String>>,
    pub parent_ids: Option<BTreeSet<PersonId>>,
    pub birth: Option<Option<LifeEvent>>,
    pub death: Option<Option<LifeEvent>>,
    pub marriages: Option<Vec<LifeEvent>>,
    pub divorces: Option<Vec<LifeEvent>>,
}

impl Person {
    /// Creates a record from a draft with a fresh id.
    pub fn from_draft(draft: PersonDraft, generation: i32, now_ms: i64) -> Self {
        Self {
            id: PersonId::generate(),
            given_name: draft.given_name,
            family_name: draft.family_name,
            generation,
            parent_ids: draft.parent_ids,
            birth: draft.birth,
            death: draft.death,
            marriages: draft.marriages,
            divorces: draft.divorces,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Creates a nameless generation-0 root.
    pub fn root(now_ms: i64) -> Self {
        Self::from_draft(PersonDraft::default(), 0, now_ms)
    }

    /// Applies a patch and stamps `updated_at`.
    pub fn apply_patch(&mut self, patch: PersonPatch, now_ms: i64) {
        if let Some(value) = patch.given_name {
            self.given_name = value;
        }
        if let Some(value) = patch.family_name {
            self.family_name = value;
        }
        if let Some(value) = patch.parent_ids {
            self.parent_ids = value;
        }
        if let Some(value) = patch.birth {
            self.birth = value;
        }
        if let Some(value) = patch.death {
            self.death = value;
        }
        if let Some(value) = patch.marriages {
            self.marriages = value;
        }
        if let Some(value) = patch.divorces {
            self.divorces = value;
        }
        self.touch(now_ms);
    }

    /// Bumps `updated_at`, never moving it backwards.
    pub(crate) fn touch(&mut self, now_ms: i64) {
        self.updated_at = now_ms.max(self.updated_at);
    }

    /// Validates single-record invariants.
    ///
    /// Graph-level invariants (acyclicity, reciprocity) are enforced by the store.
    pub fn validate(&self) -> Result<(), PersonValidationError> {
        if self.id.is_empty() {
            return Err(PersonValidationError::EmptyId);
        }
        if self.parent_ids.contains(&self.id) {
            return Err(PersonValidationError::SelfParent(self.id.clone()));
        }

        let single = [
            (EventKind::Birth, self.birth.as_ref()),
            (EventKind::Death, self.death.as_ref()),
        ];
        for (kind, event) in single {
            if let Some(event) = event {
                event
                    .validate(kind)
                    .map_err(|source| PersonValidationError::Event { kind, source })?;
            }
        }

        for (kind, events) in self.partner_events() {
            for event in events {
                event
                    .validate(kind)
                    .map_err(|source| PersonValidationError::Event { kind, source })?;
                if event.partner_id.as_ref() == Some(&self.id) {
                    return Err(PersonValidationError::SelfPartner(self.id.clone()));
                }
            }
        }
        Ok(())
    }

    /// Marriage and divorce lists tagged with their kind.
    pub fn partner_events(&self) -> [(EventKind, &[LifeEvent]); 2] {
        [
            (EventKind::Marriage, self.marriages.as_slice()),
            (EventKind::Divorce, self.divorces.as_slice()),
        ]
    }

    pub(crate) fn partner_events_mut(&mut self, kind: EventKind) -> Option<&mut Vec<LifeEvent>> {
        match kind {
            EventKind::Marriage => Some(&mut self.marriages),
            EventKind::Divorce => Some(&mut self.divorces),
            EventKind::Birth | EventKind::Death => None,
        }
    }

    pub fn birth_year(&self) -> Option<i32> {
        self.birth.as_ref().and_then(LifeEvent::year)
    }

    /// Returns whether `other` appears as partner in any marriage/divorce.
    pub fn has_partner(&self, other: &PersonId) -> bool {
        self.marriages
            .iter()
            .chain(self.divorces.iter())
            .any(|event| event.partner_id.as_ref() == Some(other))
    }

    /// Name for display, falling back to the generation label.
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.given_name.as_deref(), self.family_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            return generation_label(self.generation);
        }
        parts.join(" ")
    }
}

/// Relationship label for an unnamed person at `generation`.
pub fn generation_label(generation: i32) -> String {
    match generation {
        0 => "Me".to_string(),
        1 => "Parent".to_string(),
        2 => "Grandparent".to_string(),
        -1 => "Child".to_string(),
        -2 => "Grandchild".to_string(),
        g if g > 2 => format!("{}grandparent", great_prefix(g.unsigned_abs() - 2)),
        g => format!("{}grandchild", great_prefix(g.unsigned_abs() - 2)),
    }
}

/// Longest run of spelled-out "Great-" before switching to a count.
const MAX_SPELLED_GREATS: u32 = 4;

fn great_prefix(greats: u32) -> String {
    if greats <= MAX_SPELLED_GREATS {
        "Great-".repeat(greats as usize)
    } else {
        format!("{greats}x-Great-")
    }
}

/// Current wall-clock time in epoch milliseconds.
pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
