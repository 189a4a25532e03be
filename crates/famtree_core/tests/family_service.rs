use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use famtree_core::db::{open_db, open_db_in_memory};
use famtree_core::{
    encode_token, ChildCriteria, CoreConfig, FamilyService, FamilyServiceError, ImportError,
    LayoutConfig, LifeEvent, MemorySnapshotRepository, PersonDraft, PersonId, PersonPatch,
    RepoError, Snapshot, SnapshotRepository, SnapshotService, SqliteSnapshotRepository,
    StoreError,
};
use serde_json::json;

fn token_for(value: &serde_json::Value) -> String {
    URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).unwrap())
}

#[test]
fn opening_empty_repository_seeds_root_without_writing() {
    let repo = MemorySnapshotRepository::new();
    let service = FamilyService::open(&repo).unwrap();

    assert_eq!(service.people().len(), 1);
    assert_eq!(service.people()[0].generation, 0);
    assert!(repo.raw_payload().is_none());
}

#[test]
fn mutations_are_persisted_and_reloaded() {
    let repo = MemorySnapshotRepository::new();
    let me;
    let parent;
    {
        let mut service = FamilyService::open(&repo).unwrap();
        me = service.store().root().unwrap().id.clone();
        parent = service
            .add_parent_of(&me, PersonDraft::named("Nora", "Lind"))
            .unwrap()
            .person
            .id;
    }

    let reopened = FamilyService::open(&repo).unwrap();
    assert_eq!(reopened.people().len(), 2);
    assert_eq!(reopened.store().root().unwrap().id, me);
    let child = reopened.store().get(&me).unwrap();
    assert!(child.parent_ids.contains(&parent));
}

#[test]
fn save_stamps_updated_at() {
    let repo = MemorySnapshotRepository::new();
    let snapshots = SnapshotService::new(&repo);
    let mut snapshot = snapshots.load().unwrap();
    snapshot.updated_at = 0;

    snapshots.save(&mut snapshot).unwrap();
    assert!(snapshot.updated_at > 0);
    assert_eq!(repo.load_snapshot().unwrap(), Some(snapshot));
}

#[test]
fn not_found_is_reported_as_value() {
    let repo = MemorySnapshotRepository::new();
    let mut service = FamilyService::open(&repo).unwrap();
    let ghost = PersonId::from("ghost");

    let err = service.update(&ghost, PersonPatch::default()).unwrap_err();
    assert!(matches!(err, FamilyServiceError::Store(StoreError::NotFound(_))));
    let err = service.delete(&ghost).unwrap_err();
    assert!(matches!(err, FamilyServiceError::Store(StoreError::NotFound(_))));
    assert!(service.eligible_parents(&ghost, &[]).is_err());
    assert!(repo.raw_payload().is_none());
}

#[test]
fn failed_import_leaves_state_untouched() {
    let repo = MemorySnapshotRepository::new();
    let mut service = FamilyService::open(&repo).unwrap();
    let me = service.store().root().unwrap().id.clone();
    service.add_child_of(&me, PersonDraft::default()).unwrap();
    let before = service.snapshot();
    let stored_before = repo.raw_payload();

    let err = service.import_token("%%%").unwrap_err();
    assert!(matches!(err, FamilyServiceError::Import(ImportError::Decode(_))));
    assert_eq!(service.snapshot(), before);
    assert_eq!(repo.raw_payload(), stored_before);
}

#[test]
fn import_replaces_tree_and_persists() {
    let source_repo = MemorySnapshotRepository::new();
    let mut source = FamilyService::open(&source_repo).unwrap();
    let root = source.store().root().unwrap().id.clone();
    source.add_parent_of(&root, PersonDraft::default()).unwrap();
    source.add_parent_of(&root, PersonDraft::default()).unwrap();
    let token = source.export_token().unwrap();

    let target_repo = MemorySnapshotRepository::new();
    let mut target = FamilyService::open(&target_repo).unwrap();
    target.import_token(&token).unwrap();

    assert_eq!(target.people(), source.people());
    assert_eq!(target.store().root().unwrap().id, root);
    let stored = target_repo.load_snapshot().unwrap().unwrap();
    assert_eq!(stored.people.len(), 3);
}

#[test]
fn clear_persists_single_root() {
    let repo = MemorySnapshotRepository::new();
    let mut service = FamilyService::open(&repo).unwrap();
    let me = service.store().root().unwrap().id.clone();
    service.add_parent_of(&me, PersonDraft::default()).unwrap();

    let new_root = service.clear().unwrap();
    let stored = repo.load_snapshot().unwrap().unwrap();
    assert_eq!(stored.people.len(), 1);
    assert_eq!(stored.root_id, Some(new_root));
}

#[test]
fn eligibility_and_layout_read_current_state() {
    let repo = MemorySnapshotRepository::new();
    let mut service = FamilyService::open(&repo).unwrap();
    let me = service.store().root().unwrap().id.clone();
    let parent = service
        .add_parent_of(&me, PersonDraft::default())
        .unwrap()
        .person
        .id;
    let spouse = service.add(PersonDraft::default(), 1).unwrap().person.id;
    service
        .update(
            &parent,
            PersonPatch {
                marriages: Some(vec![LifeEvent::with_partner(spouse.clone())]),
                ..PersonPatch::default()
            },
        )
        .unwrap();

    let marriages = service.store().get(&parent).unwrap().marriages.clone();
    let children: Vec<PersonId> = service
        .eligible_children(
            &parent,
            ChildCriteria {
                pending_marriages: &marriages,
                ..ChildCriteria::default()
            },
        )
        .unwrap()
        .into_iter()
        .map(|p| p.id.clone())
        .collect();
    assert_eq!(children, vec![me.clone()]);

    let layout = service.layout(&LayoutConfig::default());
    assert_eq!(layout.nodes.len(), 3);
    assert_eq!(layout.edges.len(), 2);
}

#[test]
fn sqlite_backed_service_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tree.db");
    let me;
    {
        let conn = open_db(&path).unwrap();
        let repo = SqliteSnapshotRepository::try_new(&conn).unwrap();
        let mut service = FamilyService::open(repo).unwrap();
        me = service.store().root().unwrap().id.clone();
        service
            .update(
                &me,
                PersonPatch {
                    given_name: Some(Some("Tove".to_string())),
                    ..PersonPatch::default()
                },
            )
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    let repo = SqliteSnapshotRepository::try_new(&conn).unwrap();
    let service = FamilyService::open(repo).unwrap();
    let person = service.store().get(&me).unwrap();
    assert_eq!(person.display_name(), "Tove");
}

#[test]
fn sqlite_keys_are_isolated() {
    let conn = open_db_in_memory().unwrap();
    let first = SqliteSnapshotRepository::try_with_key(&conn, "first").unwrap();
    let second = SqliteSnapshotRepository::try_with_key(&conn, "second").unwrap();

    let mut service = FamilyService::open(&first).unwrap();
    service.add(PersonDraft::default(), 0).unwrap();

    assert!(second.load_snapshot().unwrap().is_none());
    assert_eq!(first.load_snapshot().unwrap().unwrap().people.len(), 2);
}

#[test]
fn imported_loop_does_not_block_unrelated_edits() {
    let repo = MemorySnapshotRepository::new();
    let mut service = FamilyService::open(&repo).unwrap();
    let token = token_for(&json!({
        "people": [
            {"id": "a", "generation": 0, "parentIds": ["b"]},
            {"id": "b", "generation": 1, "parentIds": ["a"]},
            {"id": "c", "generation": 0}
        ],
        "version": "1.0.0",
        "createdAt": 1,
        "updatedAt": 1
    }));
    service.import_token(&token).unwrap();

    service.add(PersonDraft::default(), 0).unwrap();
    let c = PersonId::from("c");
    let child = service.add_child_of(&c, PersonDraft::default()).unwrap();
    assert_eq!(child.person.generation, -1);
    service.add_parent_of(&c, PersonDraft::default()).unwrap();
    assert_eq!(service.people().len(), 6);

    // Editing a record on the loop still reports it.
    let err = service
        .update(&PersonId::from("a"), PersonPatch::default())
        .unwrap_err();
    assert!(matches!(err, FamilyServiceError::Store(StoreError::CycleDetected(_))));
}

#[test]
fn import_with_repeated_ids_is_rejected_whole() {
    let repo = MemorySnapshotRepository::new();
    let mut service = FamilyService::open(&repo).unwrap();
    let before = service.snapshot();
    let token = token_for(&json!({
        "people": [{"id": "a"}, {"id": "a", "generation": 1}],
        "version": "1.0.0",
        "createdAt": 1,
        "updatedAt": 1
    }));

    let err = service.import_token(&token).unwrap_err();
    assert!(matches!(
        err,
        FamilyServiceError::Import(ImportError::DuplicatePersonId { index: 1, .. })
    ));
    assert_eq!(service.snapshot(), before);
    service.add(PersonDraft::default(), 0).unwrap();
}

#[test]
fn stored_payload_with_repeated_ids_is_invalid() {
    let repo = MemorySnapshotRepository::new();
    repo.put_raw_payload(
        json!({
            "people": [{"id": "a"}, {"id": "a"}],
            "version": "1.0.0",
            "createdAt": 1,
            "updatedAt": 1
        })
        .to_string(),
    );

    assert!(matches!(
        FamilyService::open(&repo).err().unwrap(),
        FamilyServiceError::Repo(RepoError::InvalidData(_))
    ));
}

#[test]
fn export_failures_are_serialization_errors() {
    let result: Result<String, serde_json::Error> = encode_token(&Snapshot::seeded());
    assert!(result.is_ok());
}

#[test]
fn config_snapshot_key_selects_storage_slot() {
    let config = CoreConfig::from_json_str(r#"{"snapshot_key": "cousins"}"#).unwrap();
    let conn = open_db_in_memory().unwrap();
    let configured = SqliteSnapshotRepository::try_from_config(&conn, &config).unwrap();
    let default_slot = SqliteSnapshotRepository::try_new(&conn).unwrap();

    let mut service = FamilyService::open(&configured).unwrap();
    service.add(PersonDraft::default(), 1).unwrap();

    assert!(default_slot.load_snapshot().unwrap().is_none());
    assert_eq!(configured.load_snapshot().unwrap().unwrap().people.len(), 2);

    let memory = MemorySnapshotRepository::from_config(&config);
    let mut service = FamilyService::open(&memory).unwrap();
    service.add(PersonDraft::default(), 1).unwrap();
    assert!(memory.raw_payload().is_some());
}
