//! In-memory graph store.
//!
//! # Responsibility
//! - Own the authoritative person collection and the explicit root pointer.
//! - Apply add/update/delete/batch-replace/clear as whole-collection swaps.
//!
//! # Invariants
//! - Every mutation builds the next collection aside and swaps it in only
//!   after validation; failed mutations leave the store untouched.
//! - Records touched by a commit are free of self-parents and never sit on
//!   a parent cycle; `batch_replace` touches, and so checks, every record.
//! - Partner reciprocity is restored before each commit.
//! - `generation` is set at creation and never recomputed here.

use crate::graph::sync::{synchronize_all, synchronize_person};
use crate::model::person::{
    now_epoch_ms, Person, PersonDraft, PersonId, PersonPatch, PersonValidationError,
};
use crate::model::snapshot::{Snapshot, SCHEMA_VERSION};
use log::{info, warn};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from graph store mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Target person does not exist.
    NotFound(PersonId),
    /// A record failed single-record validation.
    Validation(PersonValidationError),
    /// Two records in one collection share an id.
    DuplicateId(PersonId),
    /// The parent relation would contain a cycle through this person.
    CycleDetected(PersonId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "person not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateId(id) => write!(f, "duplicate person id: {id}"),
            Self::CycleDetected(id) => {
                write!(f, "parent relation would form a cycle through {id}")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PersonValidationError> for StoreError {
    fn from(value: PersonValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Result of an add: the new record and the full collection after commit.
///
/// Callers chain further edits against `person.id` before their own state
/// catches up with the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    pub person: Person,
    pub people: Vec<Person>,
}

/// Owner of the working person collection.
#[derive(Debug, Clone)]
pub struct GraphStore {
    people: Vec<Person>,
    root_id: Option<PersonId>,
    created_at: i64,
    updated_at: i64,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::from_snapshot(Snapshot::seeded())
    }
}

impl GraphStore {
    /// Creates a store seeded with one generation-0 root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopts a snapshot as-is, restoring partner reciprocity.
    ///
    /// Used at startup and for imports; acyclicity is not re-checked so that
    /// previously saved data always loads.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut people = snapshot.people;
        synchronize_all(&mut people, now_epoch_ms());
        let root_id = snapshot
            .root_id
            .filter(|root| people.iter().any(|person| &person.id == root));
        Self {
            people,
            root_id,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
        }
    }

    /// Serializable copy of the current state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            people: self.people.clone(),
            version: SCHEMA_VERSION.to_string(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            root_id: self.root_id.clone(),
        }
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    pub fn get(&self, id: &PersonId) -> Option<&Person> {
        self.people.iter().find(|person| &person.id == id)
    }

    /// Explicit root person, if one is set and still present.
    pub fn root(&self) -> Option<&Person> {
        self.root_id.as_ref().and_then(|id| self.get(id))
    }

    pub fn set_root(&mut self, id: &PersonId) -> StoreResult<()> {
        if self.get(id).is_none() {
            return Err(StoreError::NotFound(id.clone()));
        }
        self.root_id = Some(id.clone());
        self.updated_at = now_epoch_ms().max(self.updated_at);
        Ok(())
    }

    /// Adds a person at an explicit generation.
    pub fn add(&mut self, draft: PersonDraft, generation: i32) -> StoreResult<AddOutcome> {
        let now = now_epoch_ms();
        let person = Person::from_draft(draft, generation, now);
        let mut next = self.people.clone();
        next.push(person.clone());
        self.commit_touched(next, &[person.id.clone()], now)?;
        info!(
            "event=person_add module=graph status=ok person_id={} generation={}",
            person.id, generation
        );
        self.add_outcome(&person.id)
    }

    /// Adds a new parent one generation above `child_id` and links it.
    pub fn add_parent_of(
        &mut self,
        child_id: &PersonId,
        draft: PersonDraft,
    ) -> StoreResult<AddOutcome> {
        let child = self
            .get(child_id)
            .ok_or_else(|| StoreError::NotFound(child_id.clone()))?;
        let now = now_epoch_ms();
        let parent = Person::from_draft(draft, child.generation + 1, now);

        let mut next = self.people.clone();
        for person in next.iter_mut().filter(|person| &person.id == child_id) {
            person.parent_ids.insert(parent.id.clone());
            person.touch(now);
        }
        next.push(parent.clone());
        self.commit_touched(next, &[parent.id.clone(), child_id.clone()], now)?;
        info!(
            "event=person_add_parent module=graph status=ok person_id={} child_id={}",
            parent.id, child_id
        );
        self.add_outcome(&parent.id)
    }

    /// Adds a new child one generation below `parent_id`.
    pub fn add_child_of(
        &mut self,
        parent_id: &PersonId,
        mut draft: PersonDraft,
    ) -> StoreResult<AddOutcome> {
        let parent = self
            .get(parent_id)
            .ok_or_else(|| StoreError::NotFound(parent_id.clone()))?;
        let generation = parent.generation - 1;
        draft.parent_ids.insert(parent_id.clone());
        let now = now_epoch_ms();
        let child = Person::from_draft(draft, generation, now);

        let mut next = self.people.clone();
        next.push(child.clone());
        self.commit_touched(next, &[child.id.clone()], now)?;
        info!(
            "event=person_add_child module=graph status=ok person_id={} parent_id={}",
            child.id, parent_id
        );
        self.add_outcome(&child.id)
    }

    /// Merges `patch` into one person and bumps its `updated_at`.
    pub fn update(&mut self, id: &PersonId, patch: PersonPatch) -> StoreResult<Person> {
        let now = now_epoch_ms();
        let mut next = self.people.clone();
        let Some(target) = next.iter_mut().find(|person| &person.id == id) else {
            warn!("event=person_update module=graph status=error error_code=not_found person_id={id}");
            return Err(StoreError::NotFound(id.clone()));
        };
        target.apply_patch(patch, now);

        self.commit_touched(next, &[id.clone()], now)?;
        info!("event=person_update module=graph status=ok person_id={id}");
        self.get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    /// Swaps in a whole new collection in one step.
    ///
    /// Every record is validated; on error the current collection is kept.
    pub fn batch_replace(&mut self, people: Vec<Person>) -> StoreResult<()> {
        let now = now_epoch_ms();
        let ids: Vec<PersonId> = people.iter().map(|person| person.id.clone()).collect();
        self.commit_touched(people, &ids, now)?;
        info!(
            "event=batch_replace module=graph status=ok count={}",
            self.people.len()
        );
        Ok(())
    }

    /// Removes one person and every reference to it.
    ///
    /// Deleting the root clears the root pointer.
    pub fn delete(&mut self, id: &PersonId) -> StoreResult<Person> {
        let Some(position) = self.people.iter().position(|person| &person.id == id) else {
            warn!("event=person_delete module=graph status=error error_code=not_found person_id={id}");
            return Err(StoreError::NotFound(id.clone()));
        };

        let now = now_epoch_ms();
        let mut next = self.people.clone();
        let removed = next.remove(position);
        let mut pruned = 0usize;
        for person in &mut next {
            let parent_removed = person.parent_ids.remove(id);
            let before = person.marriages.len() + person.divorces.len();
            person
                .marriages
                .retain(|event| event.partner_id.as_ref() != Some(id));
            person
                .divorces
                .retain(|event| event.partner_id.as_ref() != Some(id));
            let partner_removed = person.marriages.len() + person.divorces.len() != before;
            if parent_removed || partner_removed {
                person.touch(now);
                pruned += 1;
            }
        }

        self.people = next;
        if self.root_id.as_ref() == Some(id) {
            self.root_id = None;
        }
        self.updated_at = now.max(self.updated_at);
        info!("event=person_delete module=graph status=ok person_id={id} pruned={pruned}");
        Ok(removed)
    }

    /// Resets to a single fresh generation-0 root.
    pub fn clear(&mut self) -> &Person {
        let now = now_epoch_ms();
        let root = Person::root(now);
        self.root_id = Some(root.id.clone());
        self.people = vec![root];
        self.updated_at = now.max(self.updated_at);
        info!("event=graph_clear module=graph status=ok");
        &self.people[0]
    }

    fn add_outcome(&self, id: &PersonId) -> StoreResult<AddOutcome> {
        let person = self
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Ok(AddOutcome {
            person,
            people: self.people.clone(),
        })
    }

    fn commit_touched(
        &mut self,
        mut next: Vec<Person>,
        touched: &[PersonId],
        now: i64,
    ) -> StoreResult<()> {
        let touched_set: HashSet<&PersonId> = touched.iter().collect();
        for person in next.iter().filter(|person| touched_set.contains(&person.id)) {
            person.validate()?;
        }
        ensure_unique_ids(&next)?;
        if let Some(id) = find_cycle_through(&next, touched) {
            warn!("event=graph_commit module=graph status=error error_code=cycle person_id={id}");
            return Err(StoreError::CycleDetected(id));
        }

        for id in touched {
            synchronize_person(&mut next, id, now);
        }

        self.people = next;
        if let Some(root) = &self.root_id {
            if !self.people.iter().any(|person| &person.id == root) {
                self.root_id = None;
            }
        }
        self.updated_at = now.max(self.updated_at);
        Ok(())
    }
}

fn ensure_unique_ids(people: &[Person]) -> StoreResult<()> {
    let mut seen = HashSet::with_capacity(people.len());
    for person in people {
        if !seen.insert(&person.id) {
            return Err(StoreError::DuplicateId(person.id.clone()));
        }
    }
    Ok(())
}

/// Returns the first touched person that sits on a parent cycle.
///
/// A mutation can only close a cycle through a record whose `parent_ids`
/// it changed, so older cycles elsewhere do not block unrelated edits.
fn find_cycle_through(people: &[Person], touched: &[PersonId]) -> Option<PersonId> {
    let by_id: HashMap<&PersonId, &Person> =
        people.iter().map(|person| (&person.id, person)).collect();

    touched
        .iter()
        .find(|start| reaches_itself(start, &by_id))
        .cloned()
}

fn reaches_itself(start: &PersonId, by_id: &HashMap<&PersonId, &Person>) -> bool {
    let mut visited: HashSet<&PersonId> = HashSet::new();
    let mut stack: Vec<&PersonId> = match by_id.get(start) {
        Some(person) => person.parent_ids.iter().collect(),
        None => return false,
    };

    while let Some(current) = stack.pop() {
        if current == start {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        if let Some(person) = by_id.get(current) {
            stack.extend(person.parent_ids.iter());
        }
    }
    false
}
