//! Family tree use-case service.
//!
//! # Responsibility
//! - Compose the graph store with snapshot persistence.
//! - Expose command/result style operations to the presentation layer.
//! - Export and import share tokens.
//!
//! # Invariants
//! - A mutation is kept only if it was validated and then persisted;
//!   otherwise the previous state is restored.
//! - Failed imports leave the current state untouched.

use crate::graph::eligibility::{eligible_children, eligible_parents, ChildCriteria};
use crate::graph::layout::{compute_layout, LayoutConfig, TreeLayout};
use crate::graph::store::{AddOutcome, GraphStore, StoreError};
use crate::model::person::{Person, PersonDraft, PersonId, PersonPatch};
use crate::model::snapshot::Snapshot;
use crate::repo::snapshot_repo::{RepoError, SnapshotRepository};
use crate::service::snapshot_service::SnapshotService;
use crate::snapshot::{decode_token, encode_token, ImportError};
use log::error;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from family service operations.
#[derive(Debug)]
pub enum FamilyServiceError {
    Store(StoreError),
    Repo(RepoError),
    Import(ImportError),
    /// Snapshot could not be serialized into a share token.
    Export(serde_json::Error),
}

impl Display for FamilyServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Import(err) => write!(f, "{err}"),
            Self::Export(err) => write!(f, "share token export failed: {err}"),
        }
    }
}

impl Error for FamilyServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Import(err) => Some(err),
            Self::Export(err) => Some(err),
        }
    }
}

impl From<StoreError> for FamilyServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<RepoError> for FamilyServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ImportError> for FamilyServiceError {
    fn from(value: ImportError) -> Self {
        Self::Import(value)
    }
}

impl From<serde_json::Error> for FamilyServiceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Export(value)
    }
}

pub type FamilyResult<T> = Result<T, FamilyServiceError>;

/// Family tree facade over an injected snapshot repository.
pub struct FamilyService<R: SnapshotRepository> {
    snapshots: SnapshotService<R>,
    store: GraphStore,
}

impl<R: SnapshotRepository> FamilyService<R> {
    /// Loads the stored snapshot (or a seeded one) into a new store.
    pub fn open(repo: R) -> FamilyResult<Self> {
        let snapshots = SnapshotService::new(repo);
        let store = GraphStore::from_snapshot(snapshots.load()?);
        Ok(Self { snapshots, store })
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn people(&self) -> &[Person] {
        self.store.people()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    pub fn add(&mut self, draft: PersonDraft, generation: i32) -> FamilyResult<AddOutcome> {
        self.mutate(|store| store.add(draft, generation))
    }

    pub fn add_parent_of(
        &mut self,
        child_id: &PersonId,
        draft: PersonDraft,
    ) -> FamilyResult<AddOutcome> {
        self.mutate(|store| store.add_parent_of(child_id, draft))
    }

    pub fn add_child_of(
        &mut self,
        parent_id: &PersonId,
        draft: PersonDraft,
    ) -> FamilyResult<AddOutcome> {
        self.mutate(|store| store.add_child_of(parent_id, draft))
    }

    pub fn update(&mut self, id: &PersonId, patch: PersonPatch) -> FamilyResult<Person> {
        self.mutate(|store| store.update(id, patch))
    }

    pub fn batch_replace(&mut self, people: Vec<Person>) -> FamilyResult<()> {
        self.mutate(|store| store.batch_replace(people))
    }

    pub fn delete(&mut self, id: &PersonId) -> FamilyResult<Person> {
        self.mutate(|store| store.delete(id))
    }

    pub fn set_root(&mut self, id: &PersonId) -> FamilyResult<()> {
        self.mutate(|store| store.set_root(id))
    }

    /// Resets to a single root person and returns its id.
    pub fn clear(&mut self) -> FamilyResult<PersonId> {
        self.mutate(|store| Ok(store.clear().id.clone()))
    }

    /// Current share token.
    pub fn export_token(&self) -> FamilyResult<String> {
        Ok(encode_token(&self.store.snapshot())?)
    }

    /// Replaces the whole tree with the token's snapshot.
    ///
    /// Nothing changes unless decoding, vetting and saving all succeed.
    pub fn import_token(&mut self, token: &str) -> FamilyResult<()> {
        let snapshot = decode_token(token)?;
        self.mutate(|store| {
            *store = GraphStore::from_snapshot(snapshot);
            Ok(())
        })
    }

    /// Parent candidates for `id`, see [`eligible_parents`].
    pub fn eligible_parents(
        &self,
        id: &PersonId,
        excluded_ids: &[PersonId],
    ) -> FamilyResult<Vec<&Person>> {
        let person = self.find(id)?;
        Ok(eligible_parents(person, self.store.people(), excluded_ids))
    }

    /// Child candidates for `id`, see [`eligible_children`].
    pub fn eligible_children(
        &self,
        id: &PersonId,
        criteria: ChildCriteria<'_>,
    ) -> FamilyResult<Vec<&Person>> {
        let person = self.find(id)?;
        Ok(eligible_children(person, self.store.people(), criteria))
    }

    pub fn layout(&self, config: &LayoutConfig) -> TreeLayout {
        compute_layout(self.store.people(), config)
    }

    fn find(&self, id: &PersonId) -> FamilyResult<&Person> {
        self.store
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()).into())
    }

    fn mutate<T>(
        &mut self,
        op: impl FnOnce(&mut GraphStore) -> Result<T, StoreError>,
    ) -> FamilyResult<T> {
        let previous = self.store.clone();
        let value = op(&mut self.store)?;

        let mut snapshot = self.store.snapshot();
        if let Err(err) = self.snapshots.save(&mut snapshot) {
            error!("event=snapshot_save module=service status=error error={err}");
            self.store = previous;
            return Err(err.into());
        }
        Ok(value)
    }
}
