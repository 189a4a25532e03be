use famtree_core::{
    synchronize_all, GraphStore, LifeEvent, Person, PersonDraft, PersonId, PersonPatch,
    PersonValidationError, StoreError,
};
use std::collections::BTreeSet;

fn root_id(store: &GraphStore) -> PersonId {
    store.root().unwrap().id.clone()
}

fn person<'a>(people: &'a [Person], id: &PersonId) -> &'a Person {
    people.iter().find(|p| &p.id == id).unwrap()
}

#[test]
fn new_store_has_single_generation_zero_root() {
    let store = GraphStore::new();
    assert_eq!(store.len(), 1);
    let root = store.root().unwrap();
    assert_eq!(root.generation, 0);
    assert!(root.parent_ids.is_empty());
    assert_eq!(root.created_at, root.updated_at);
}

#[test]
fn add_returns_new_record_and_full_collection() {
    let mut store = GraphStore::new();
    let outcome = store.add(PersonDraft::named("Ida", "Berg"), 3).unwrap();

    assert_eq!(outcome.person.generation, 3);
    assert_eq!(outcome.person.created_at, outcome.person.updated_at);
    assert_eq!(outcome.people.len(), 2);
    assert!(outcome.people.iter().any(|p| p.id == outcome.person.id));
    assert_eq!(store.people(), outcome.people.as_slice());
}

#[test]
fn add_parent_of_links_child_one_generation_up() {
    let mut store = GraphStore::new();
    let me = root_id(&store);

    let outcome = store.add_parent_of(&me, PersonDraft::default()).unwrap();
    let parent_id = outcome.person.id.clone();

    assert_eq!(outcome.person.generation, 1);
    assert!(person(&outcome.people, &me).parent_ids.contains(&parent_id));

    let grand = store.add_parent_of(&parent_id, PersonDraft::default()).unwrap();
    assert_eq!(grand.person.generation, 2);
}

#[test]
fn add_child_of_sets_parent_and_generation() {
    let mut store = GraphStore::new();
    let me = root_id(&store);

    let outcome = store.add_child_of(&me, PersonDraft::default()).unwrap();
    assert_eq!(outcome.person.generation, -1);
    assert_eq!(
        outcome.person.parent_ids,
        BTreeSet::from([me.clone()])
    );
}

#[test]
fn add_relative_of_unknown_person_is_not_found() {
    let mut store = GraphStore::new();
    let ghost = PersonId::from("ghost");
    assert_eq!(
        store.add_parent_of(&ghost, PersonDraft::default()).unwrap_err(),
        StoreError::NotFound(ghost.clone())
    );
    assert_eq!(
        store.add_child_of(&ghost, PersonDraft::default()).unwrap_err(),
        StoreError::NotFound(ghost)
    );
    assert_eq!(store.len(), 1);
}

#[test]
fn update_merges_patch_and_keeps_generation() {
    let mut store = GraphStore::new();
    let me = root_id(&store);
    let before = store.get(&me).unwrap().clone();
    let other = store.add(PersonDraft::default(), 1).unwrap().person.id;

    let updated = store
        .update(
            &me,
            PersonPatch {
                given_name: Some(Some("Sam".to_string())),
                parent_ids: Some(BTreeSet::from([other.clone()])),
                ..PersonPatch::default()
            },
        )
        .unwrap();

    assert_eq!(updated.given_name.as_deref(), Some("Sam"));
    assert_eq!(updated.family_name, None);
    assert_eq!(updated.generation, 0);
    assert!(updated.parent_ids.contains(&other));
    assert!(updated.updated_at >= before.updated_at);
    assert_eq!(updated.created_at, before.created_at);
}

#[test]
fn update_unknown_id_is_not_found_and_changes_nothing() {
    let mut store = GraphStore::new();
    let before = store.snapshot();
    let ghost = PersonId::from("ghost");

    let err = store.update(&ghost, PersonPatch::default()).unwrap_err();
    assert_eq!(err, StoreError::NotFound(ghost));
    assert_eq!(store.people(), before.people.as_slice());
}

#[test]
fn update_rejects_self_parent() {
    let mut store = GraphStore::new();
    let me = root_id(&store);

    let err = store
        .update(
            &me,
            PersonPatch {
                parent_ids: Some(BTreeSet::from([me.clone()])),
                ..PersonPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(PersonValidationError::SelfParent(id)) if id == me
    ));
    assert!(store.get(&me).unwrap().parent_ids.is_empty());
}

#[test]
fn update_rejects_indirect_cycle() {
    let mut store = GraphStore::new();
    let me = root_id(&store);
    let parent = store.add_parent_of(&me, PersonDraft::default()).unwrap().person.id;
    let grand = store
        .add_parent_of(&parent, PersonDraft::default())
        .unwrap()
        .person
        .id;

    let err = store
        .update(
            &grand,
            PersonPatch {
                parent_ids: Some(BTreeSet::from([me.clone()])),
                ..PersonPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::CycleDetected(_)));
    assert!(store.get(&grand).unwrap().parent_ids.is_empty());
}

#[test]
fn marriage_is_mirrored_onto_partner_once() {
    let mut store = GraphStore::new();
    let a = root_id(&store);
    let b = store.add(PersonDraft::named("B", "B"), 0).unwrap().person.id;

    store
        .update(
            &a,
            PersonPatch {
                marriages: Some(vec![LifeEvent::with_partner(b.clone())]),
                ..PersonPatch::default()
            },
        )
        .unwrap();

    let partner = store.get(&b).unwrap();
    assert_eq!(partner.marriages.len(), 1);
    assert_eq!(partner.marriages[0].partner_id.as_ref(), Some(&a));

    let mut people = store.people().to_vec();
    assert_eq!(synchronize_all(&mut people, 0), 0);
    assert_eq!(people, store.people());
}

#[test]
fn delete_cascades_parent_links_and_partner_events() {
    let mut store = GraphStore::new();
    let y = root_id(&store);
    let x = store.add_parent_of(&y, PersonDraft::default()).unwrap().person.id;
    let z = store.add(PersonDraft::default(), 1).unwrap().person.id;
    store
        .update(
            &z,
            PersonPatch {
                marriages: Some(vec![LifeEvent::with_partner(x.clone())]),
                ..PersonPatch::default()
            },
        )
        .unwrap();
    assert_eq!(store.get(&x).unwrap().marriages.len(), 1);

    let removed = store.delete(&x).unwrap();
    assert_eq!(removed.id, x);
    assert!(store.get(&x).is_none());

    let child = store.get(&y).unwrap();
    assert!(child.parent_ids.is_empty());
    let json = serde_json::to_value(child).unwrap();
    assert!(json.get("parentIds").is_none());

    assert!(store.get(&z).unwrap().marriages.is_empty());
}

#[test]
fn delete_unknown_id_is_not_found() {
    let mut store = GraphStore::new();
    let ghost = PersonId::from("ghost");
    assert_eq!(store.delete(&ghost).unwrap_err(), StoreError::NotFound(ghost));
    assert_eq!(store.len(), 1);
}

#[test]
fn deleting_root_clears_pointer_until_set_again() {
    let mut store = GraphStore::new();
    let me = root_id(&store);
    let other = store.add(PersonDraft::default(), 0).unwrap().person.id;

    store.delete(&me).unwrap();
    assert!(store.root().is_none());

    store.set_root(&other).unwrap();
    assert_eq!(store.root().unwrap().id, other);
    assert!(matches!(
        store.set_root(&me),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn batch_replace_is_all_or_nothing() {
    let mut store = GraphStore::new();
    let before = store.people().to_vec();

    let mut a = Person::root(1);
    let mut b = Person::root(1);
    b.generation = 1;
    a.parent_ids.insert(b.id.clone());
    b.parent_ids.insert(a.id.clone());

    let err = store.batch_replace(vec![a.clone(), b.clone()]).unwrap_err();
    assert!(matches!(err, StoreError::CycleDetected(_)));
    assert_eq!(store.people(), before.as_slice());

    let dup = a.clone();
    b.parent_ids.clear();
    assert_eq!(
        store.batch_replace(vec![a.clone(), dup]).unwrap_err(),
        StoreError::DuplicateId(a.id.clone())
    );
    assert_eq!(store.people(), before.as_slice());

    a.marriages.push(LifeEvent::with_partner(b.id.clone()));
    store.batch_replace(vec![a.clone(), b.clone()]).unwrap();
    assert_eq!(store.len(), 2);
    let mirrored = store.get(&b.id).unwrap();
    assert_eq!(mirrored.marriages[0].partner_id.as_ref(), Some(&a.id));
    // Root of the previous collection is gone.
    assert!(store.root().is_none());
}

#[test]
fn clear_resets_to_fresh_root() {
    let mut store = GraphStore::new();
    let me = root_id(&store);
    store.add_parent_of(&me, PersonDraft::default()).unwrap();
    store.add_child_of(&me, PersonDraft::default()).unwrap();
    assert_eq!(store.len(), 3);

    let new_root = store.clear().id.clone();
    assert_eq!(store.len(), 1);
    assert_ne!(new_root, me);
    assert_eq!(store.root().unwrap().id, new_root);
    assert_eq!(store.root().unwrap().generation, 0);
}

#[test]
fn from_snapshot_restores_missing_reciprocal_events() {
    let mut snapshot = GraphStore::new().snapshot();
    let mut partner = Person::root(1);
    partner.divorces.push(LifeEvent::with_partner(snapshot.people[0].id.clone()));
    snapshot.people.push(partner);

    let store = GraphStore::from_snapshot(snapshot.clone());
    let me = &snapshot.people[0].id;
    assert_eq!(store.get(me).unwrap().divorces.len(), 1);
    assert!(store.get(me).unwrap().marriages.is_empty());
}
