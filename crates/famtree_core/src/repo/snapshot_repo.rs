//! Snapshot repository contracts and implementations.
//!
//! # Responsibility
//! - Persist the latest snapshot under one fixed key.
//! - Keep SQL and JSON details inside the persistence boundary.
//!
//! # Invariants
//! - One row/entry per key; saving overwrites the previous snapshot.
//! - Read paths reject undecodable payloads instead of masking them.

use crate::config::CoreConfig;
use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::snapshot::Snapshot;
use crate::snapshot::{check_person_ids, migrate_snapshot};
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Key the latest snapshot is stored under.
pub const SNAPSHOT_KEY: &str = "family-tree-data";

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from snapshot persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Connection was not opened through `db::open_db*`.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Stored payload cannot be turned back into a snapshot.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "snapshot repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted snapshot: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Key-value style storage of the latest snapshot.
pub trait SnapshotRepository {
    /// Loads the stored snapshot, or `None` when nothing was saved yet.
    fn load_snapshot(&self) -> RepoResult<Option<Snapshot>>;
    /// Stores `snapshot`, replacing any previous one.
    fn save_snapshot(&self, snapshot: &Snapshot) -> RepoResult<()>;
}

impl<R: SnapshotRepository + ?Sized> SnapshotRepository for &R {
    fn load_snapshot(&self) -> RepoResult<Option<Snapshot>> {
        (**self).load_snapshot()
    }

    fn save_snapshot(&self, snapshot: &Snapshot) -> RepoResult<()> {
        (**self).save_snapshot(snapshot)
    }
}

/// SQLite-backed snapshot repository.
pub struct SqliteSnapshotRepository<'conn> {
    conn: &'conn Connection,
    key: String,
}

impl<'conn> SqliteSnapshotRepository<'conn> {
    /// Creates a repository over a migrated connection using [`SNAPSHOT_KEY`].
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Self::try_with_key(conn, SNAPSHOT_KEY)
    }

    /// Creates a repository storing under `config.snapshot_key`.
    pub fn try_from_config(conn: &'conn Connection, config: &CoreConfig) -> RepoResult<Self> {
        Self::try_with_key(conn, config.snapshot_key.as_str())
    }

    /// Creates a repository storing under a custom key.
    pub fn try_with_key(conn: &'conn Connection, key: impl Into<String>) -> RepoResult<Self> {
        let actual_version =
            conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self {
            conn,
            key: key.into(),
        })
    }
}

impl SnapshotRepository for SqliteSnapshotRepository<'_> {
    fn load_snapshot(&self) -> RepoResult<Option<Snapshot>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM snapshots WHERE key = ?1;",
                [self.key.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        payload.as_deref().map(parse_payload).transpose()
    }

    fn save_snapshot(&self, snapshot: &Snapshot) -> RepoResult<()> {
        let payload = serialize_payload(snapshot)?;
        self.conn.execute(
            "INSERT INTO snapshots (key, payload, created_at, updated_at, schema_version)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at,
                schema_version = excluded.schema_version;",
            params![
                self.key.as_str(),
                payload,
                snapshot.created_at,
                snapshot.updated_at,
                snapshot.version.as_str(),
            ],
        )?;
        Ok(())
    }
}

/// In-process snapshot repository, mainly for tests and previews.
#[derive(Debug)]
pub struct MemorySnapshotRepository {
    key: String,
    entries: RefCell<HashMap<String, String>>,
}

impl Default for MemorySnapshotRepository {
    fn default() -> Self {
        Self::with_key(SNAPSHOT_KEY)
    }
}

impl MemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            entries: RefCell::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::with_key(config.snapshot_key.as_str())
    }

    /// Raw stored payload for this repository's key.
    pub fn raw_payload(&self) -> Option<String> {
        self.entries.borrow().get(&self.key).cloned()
    }

    /// Overwrites the raw stored payload, bypassing serialization.
    pub fn put_raw_payload(&self, payload: impl Into<String>) {
        self.entries
            .borrow_mut()
            .insert(self.key.clone(), payload.into());
    }
}

impl SnapshotRepository for MemorySnapshotRepository {
    fn load_snapshot(&self) -> RepoResult<Option<Snapshot>> {
        self.entries
            .borrow()
            .get(&self.key)
            .map(|payload| parse_payload(payload))
            .transpose()
    }

    fn save_snapshot(&self, snapshot: &Snapshot) -> RepoResult<()> {
        let payload = serialize_payload(snapshot)?;
        self.put_raw_payload(payload);
        Ok(())
    }
}

fn serialize_payload(snapshot: &Snapshot) -> RepoResult<String> {
    serde_json::to_string(snapshot).map_err(|err| RepoError::InvalidData(err.to_string()))
}

fn parse_payload(payload: &str) -> RepoResult<Snapshot> {
    let snapshot: Snapshot =
        serde_json::from_str(payload).map_err(|err| RepoError::InvalidData(err.to_string()))?;
    check_person_ids(&snapshot.people)
        .map_err(|err| RepoError::InvalidData(err.to_string()))?;
    migrate_snapshot(snapshot).map_err(|err| RepoError::InvalidData(err.to_string()))
}
