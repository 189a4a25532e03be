//! Snapshot schema-version migration.
//!
//! # Responsibility
//! - Parse the semantic version carried by imported snapshots.
//! - Upgrade older payloads to the current schema before they are used.
//!
//! # Invariants
//! - Payloads from a newer major version are rejected.
//! - Migrated snapshots carry `SCHEMA_VERSION`.

use crate::model::snapshot::{Snapshot, SCHEMA_VERSION};
use crate::snapshot::ImportError;
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;

static SEMVER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^v?(\d+)\.(\d+)\.(\d+)(?:[-+].*)?$").expect("valid semver regex")
});

/// Major/minor/patch triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SchemaVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SchemaVersion {
    pub fn parse(value: &str) -> Option<Self> {
        let captures = SEMVER_RE.captures(value.trim())?;
        let part = |idx: usize| captures.get(idx)?.as_str().parse::<u32>().ok();
        Some(Self {
            major: part(1)?,
            minor: part(2)?,
            patch: part(3)?,
        })
    }

    /// Version written by this build.
    pub fn current() -> Self {
        Self::parse(SCHEMA_VERSION).unwrap_or(Self {
            major: 1,
            minor: 0,
            patch: 0,
        })
    }
}

/// Brings `snapshot` up to the current schema.
///
/// Only one schema exists so far, so accepted payloads pass through unchanged
/// apart from the version tag.
pub fn migrate_snapshot(mut snapshot: Snapshot) -> Result<Snapshot, ImportError> {
    let found = SchemaVersion::parse(&snapshot.version)
        .ok_or_else(|| ImportError::UnsupportedVersion(snapshot.version.clone()))?;
    let current = SchemaVersion::current();
    if found.major > current.major {
        return Err(ImportError::UnsupportedVersion(snapshot.version));
    }

    if found != current {
        info!(
            "event=snapshot_migrate module=snapshot status=ok from={} to={}",
            snapshot.version, SCHEMA_VERSION
        );
    }
    snapshot.version = SCHEMA_VERSION.to_string();
    Ok(snapshot)
}
