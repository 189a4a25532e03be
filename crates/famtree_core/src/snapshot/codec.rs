//! Share-token encoding for snapshots.
//!
//! # Responsibility
//! - Encode a snapshot into a URL-safe text token.
//! - Decode and vet a token before anything is handed to the store.
//!
//! # Invariants
//! - Tokens are base64 (URL-safe alphabet, no padding) over compact JSON.
//! - Decoding is all-or-nothing: any bad record rejects the whole token.

use crate::model::person::Person;
use crate::model::snapshot::Snapshot;
use crate::snapshot::migrate::migrate_snapshot;
use crate::snapshot::ImportError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use log::{info, warn};
use serde_json::Value;
use std::collections::HashSet;

/// Encodes `snapshot` as a share token.
pub fn encode_token(snapshot: &Snapshot) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(snapshot)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Rejects blank or repeated person ids, reporting the first offender.
pub fn check_person_ids(people: &[Person]) -> Result<(), ImportError> {
    let mut seen = HashSet::with_capacity(people.len());
    for (index, person) in people.iter().enumerate() {
        if person.id.is_empty() {
            return Err(ImportError::MissingPersonId { index });
        }
        if !seen.insert(&person.id) {
            return Err(ImportError::DuplicatePersonId {
                index,
                id: person.id.to_string(),
            });
        }
    }
    Ok(())
}

/// Decodes a share token into a migrated snapshot.
///
/// # Errors
/// - `Decode` when the token is not valid base64.
/// - `Parse` when the payload is not a snapshot document.
/// - `MissingPersonId` when any person lacks a non-empty `id`.
/// - `DuplicatePersonId` when two persons share an `id`.
/// - `UnsupportedVersion` when the schema version cannot be migrated.
pub fn decode_token(token: &str) -> Result<Snapshot, ImportError> {
    let result = decode_inner(token);
    match &result {
        Ok(snapshot) => info!(
            "event=snapshot_import module=snapshot status=ok people={}",
            snapshot.people.len()
        ),
        Err(err) => warn!(
            "event=snapshot_import module=snapshot status=error error_code={}",
            err.code()
        ),
    }
    result
}

fn decode_inner(token: &str) -> Result<Snapshot, ImportError> {
    let trimmed = token.trim().trim_end_matches('=');
    if trimmed.is_empty() {
        return Err(ImportError::Decode("token is empty".to_string()));
    }
    let bytes = URL_SAFE_NO_PAD
        .decode(trimmed)
        .map_err(|err| ImportError::Decode(err.to_string()))?;

    let document: Value =
        serde_json::from_slice(&bytes).map_err(|err| ImportError::Parse(err.to_string()))?;
    let people = document
        .get("people")
        .and_then(Value::as_array)
        .ok_or_else(|| ImportError::Parse("missing `people` array".to_string()))?;
    for (index, record) in people.iter().enumerate() {
        let has_id = record
            .get("id")
            .and_then(Value::as_str)
            .is_some_and(|id| !id.trim().is_empty());
        if !has_id {
            return Err(ImportError::MissingPersonId { index });
        }
    }

    let snapshot: Snapshot =
        serde_json::from_value(document).map_err(|err| ImportError::Parse(err.to_string()))?;
    check_person_ids(&snapshot.people)?;
    migrate_snapshot(snapshot)
}
