//! Snapshot load/save use-cases.
//!
//! # Responsibility
//! - Load the last saved snapshot or seed a fresh one.
//! - Stamp and persist snapshots through an injected repository.

use crate::model::person::now_epoch_ms;
use crate::model::snapshot::Snapshot;
use crate::repo::snapshot_repo::{RepoResult, SnapshotRepository};
use log::info;

/// Persistence adapter over a snapshot repository.
pub struct SnapshotService<R: SnapshotRepository> {
    repo: R,
}

impl<R: SnapshotRepository> SnapshotService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the stored snapshot, or a fresh one seeded with a root person.
    ///
    /// A fresh snapshot is returned but not written; the first save stores it.
    pub fn load(&self) -> RepoResult<Snapshot> {
        match self.repo.load_snapshot()? {
            Some(snapshot) => {
                info!(
                    "event=snapshot_load module=service status=ok source=stored people={}",
                    snapshot.people.len()
                );
                Ok(snapshot)
            }
            None => {
                info!("event=snapshot_load module=service status=ok source=seeded people=1");
                Ok(Snapshot::seeded())
            }
        }
    }

    /// Stamps `updated_at` and persists the snapshot.
    pub fn save(&self, snapshot: &mut Snapshot) -> RepoResult<()> {
        snapshot.updated_at = now_epoch_ms().max(snapshot.updated_at);
        self.repo.save_snapshot(snapshot)?;
        info!(
            "event=snapshot_save module=service status=ok people={}",
            snapshot.people.len()
        );
        Ok(())
    }
}
