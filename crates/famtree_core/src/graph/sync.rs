//! Partner reciprocity synchronizer.
//!
//! # Responsibility
//! - Mirror marriage/divorce events onto the referenced partner record.
//!
//! # Invariants
//! - Idempotent: an existing reciprocal event (same kind, pointing back)
//!   suppresses the copy.
//! - Single hop: reciprocal events added here are not themselves synchronized.
//! - Missing partners are skipped silently.

use crate::model::event::{EventKind, LifeEvent};
use crate::model::person::{Person, PersonId};
use log::debug;
use std::collections::HashMap;

/// Mirrors partner events of `person_id` onto each partner.
///
/// Returns the number of reciprocal events appended.
pub fn synchronize_person(people: &mut [Person], person_id: &PersonId, now_ms: i64) -> usize {
    let index = index_by_id(people);
    synchronize_with_index(people, &index, person_id, now_ms)
}

/// Runs [`synchronize_person`] for every person in collection order.
pub fn synchronize_all(people: &mut [Person], now_ms: i64) -> usize {
    let index = index_by_id(people);
    let ids: Vec<PersonId> = people.iter().map(|person| person.id.clone()).collect();
    ids.iter()
        .map(|id| synchronize_with_index(people, &index, id, now_ms))
        .sum()
}

fn synchronize_with_index(
    people: &mut [Person],
    index: &HashMap<PersonId, usize>,
    person_id: &PersonId,
    now_ms: i64,
) -> usize {
    let Some(&source_idx) = index.get(person_id) else {
        return 0;
    };

    let pending: Vec<(EventKind, LifeEvent)> = people[source_idx]
        .partner_events()
        .into_iter()
        .flat_map(|(kind, events)| events.iter().map(move |event| (kind, event.clone())))
        .filter(|(_, event)| event.partner_id.is_some())
        .collect();

    let mut added = 0;
    for (kind, event) in pending {
        let Some(partner_id) = event.partner_id.as_ref() else {
            continue;
        };
        let Some(&partner_idx) = index.get(partner_id) else {
            continue;
        };
        if partner_idx == source_idx {
            continue;
        }

        let partner = &mut people[partner_idx];
        let Some(partner_events) = partner.partner_events_mut(kind) else {
            continue;
        };
        let already_mirrored = partner_events
            .iter()
            .any(|existing| existing.partner_id.as_ref() == Some(person_id));
        if already_mirrored {
            continue;
        }

        partner_events.push(event.mirrored_for(person_id.clone()));
        partner.touch(now_ms);
        added += 1;
    }

    if added > 0 {
        debug!("event=partner_sync module=graph status=ok person_id={person_id} added={added}");
    }
    added
}

fn index_by_id(people: &[Person]) -> HashMap<PersonId, usize> {
    people
        .iter()
        .enumerate()
        .map(|(idx, person)| (person.id.clone(), idx))
        .collect()
}
