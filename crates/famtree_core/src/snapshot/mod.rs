//! Snapshot share tokens and schema versioning.
//!
//! # Responsibility
//! - Convert snapshots to and from URL-safe share tokens.
//! - Host the schema migration seam applied to every import.
//!
//! # Invariants
//! - Import failures are values; nothing here touches a store.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod codec;
pub mod migrate;

pub use codec::{check_person_ids, decode_token, encode_token};
pub use migrate::{migrate_snapshot, SchemaVersion};

/// Reasons a share token is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// Token is not valid base64.
    Decode(String),
    /// Payload is not a snapshot JSON document.
    Parse(String),
    /// Person at `index` has no usable identifier.
    MissingPersonId { index: usize },
    /// Person at `index` reuses an identifier seen earlier in the payload.
    DuplicatePersonId { index: usize, id: String },
    /// Schema version is malformed or newer than supported.
    UnsupportedVersion(String),
}

impl ImportError {
    /// Stable short code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode_failed",
            Self::Parse(_) => "parse_failed",
            Self::MissingPersonId { .. } => "missing_person_id",
            Self::DuplicatePersonId { .. } => "duplicate_person_id",
            Self::UnsupportedVersion(_) => "unsupported_version",
        }
    }
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode(message) => write!(f, "share token is not decodable: {message}"),
            Self::Parse(message) => write!(f, "share token payload is invalid: {message}"),
            Self::MissingPersonId { index } => {
                write!(f, "person record #{index} has no identifier")
            }
            Self::DuplicatePersonId { index, id } => {
                write!(f, "person record #{index} repeats identifier `{id}`")
            }
            Self::UnsupportedVersion(version) => {
                write!(f, "unsupported snapshot version `{version}`")
            }
        }
    }
}

impl Error for ImportError {}
