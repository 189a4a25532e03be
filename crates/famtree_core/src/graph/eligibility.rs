//! Parent/child eligibility queries.
//!
//! # Responsibility
//! - Answer which persons may become a given person's parent or child
//!   while an edit is still in progress.
//!
//! # Invariants
//! - Never offers a candidate that would close a parent-child cycle.
//! - Generation ordering is taken from the stored `generation` value.
//! - Walks terminate on corrupted (cyclic) input thanks to a visited set.
//! - Results keep the input order.

use crate::model::event::LifeEvent;
use crate::model::person::{Person, PersonId};
use std::collections::{HashMap, HashSet};

/// Extra constraints from an unsaved edit form.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChildCriteria<'a> {
    /// Ids already picked on the other side of the same edit.
    pub excluded_ids: &'a [PersonId],
    /// Unsaved marriage list of the person being edited.
    pub pending_marriages: &'a [LifeEvent],
    /// Unsaved divorce list of the person being edited.
    pub pending_divorces: &'a [LifeEvent],
    /// Unsaved birth year of the person being edited.
    pub birth_year_override: Option<i32>,
}

/// Returns whether `candidate` is reachable from `person` through `parent_ids`.
pub fn is_ancestor_of(candidate: &PersonId, person: &PersonId, all: &[Person]) -> bool {
    let by_id = index_by_id(all);
    is_ancestor_indexed(candidate, person, &by_id)
}

/// Returns whether `candidate` descends from `person`.
pub fn is_descendant_of(candidate: &PersonId, person: &PersonId, all: &[Person]) -> bool {
    is_ancestor_of(person, candidate, all)
}

/// Persons that may be selected as parents of `person`.
pub fn eligible_parents<'a>(
    person: &Person,
    all: &'a [Person],
    excluded_ids: &[PersonId],
) -> Vec<&'a Person> {
    let by_id = index_by_id(all);
    all.iter()
        .filter(|candidate| candidate.id != person.id)
        .filter(|candidate| !excluded_ids.contains(&candidate.id))
        .filter(|candidate| candidate.generation >= person.generation)
        // Candidate below the person would close a cycle.
        .filter(|candidate| !is_ancestor_indexed(&person.id, &candidate.id, &by_id))
        // Indirect ancestors are already related; direct parents stay selectable.
        .filter(|candidate| {
            person.parent_ids.contains(&candidate.id)
                || !is_ancestor_indexed(&candidate.id, &person.id, &by_id)
        })
        .collect()
}

/// Persons that may be selected as children of `person`.
pub fn eligible_children<'a>(
    person: &Person,
    all: &'a [Person],
    criteria: ChildCriteria<'_>,
) -> Vec<&'a Person> {
    let by_id = index_by_id(all);
    let spouses: HashSet<&PersonId> = criteria
        .pending_marriages
        .iter()
        .chain(criteria.pending_divorces.iter())
        .filter_map(|event| event.partner_id.as_ref())
        .collect();
    let person_birth_year = criteria.birth_year_override.or_else(|| person.birth_year());

    all.iter()
        .filter(|candidate| candidate.id != person.id)
        .filter(|candidate| !criteria.excluded_ids.contains(&candidate.id))
        .filter(|candidate| !spouses.contains(&candidate.id))
        .filter(|candidate| candidate.generation <= person.generation)
        // Candidate above the person would close a cycle.
        .filter(|candidate| !is_ancestor_indexed(&candidate.id, &person.id, &by_id))
        // Indirect descendants are already related; direct children stay selectable.
        .filter(|candidate| {
            candidate.parent_ids.contains(&person.id)
                || !is_ancestor_indexed(&person.id, &candidate.id, &by_id)
        })
        .filter(|candidate| match (person_birth_year, candidate.birth_year()) {
            (Some(parent_year), Some(child_year)) => child_year > parent_year,
            _ => true,
        })
        .collect()
}

fn index_by_id(all: &[Person]) -> HashMap<&PersonId, &Person> {
    all.iter().map(|person| (&person.id, person)).collect()
}

fn is_ancestor_indexed(
    candidate: &PersonId,
    person: &PersonId,
    by_id: &HashMap<&PersonId, &Person>,
) -> bool {
    let mut visited: HashSet<&PersonId> = HashSet::new();
    let mut stack: Vec<&PersonId> = match by_id.get(person) {
        Some(start) => start.parent_ids.iter().collect(),
        None => return false,
    };

    while let Some(current) = stack.pop() {
        if current == candidate {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        if let Some(node) = by_id.get(current) {
            stack.extend(node.parent_ids.iter());
        }
    }
    false
}
