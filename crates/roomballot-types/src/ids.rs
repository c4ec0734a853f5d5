//! Identifiers used throughout roomballot.
//!
//! Rooms are opaque strings. Their `Ord` is plain byte order, which is what
//! makes the room enumeration stable across platforms.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomId
// ---------------------------------------------------------------------------

/// Opaque room identifier as written on a ballot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the room name starts with any of the given prefixes.
    #[must_use]
    pub fn has_any_prefix<S: AsRef<str>>(&self, prefixes: &[S]) -> bool {
        prefixes.iter().any(|p| self.0.starts_with(p.as_ref()))
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// PublicationIndex
// ---------------------------------------------------------------------------

/// Position of a row in the published result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicationIndex(pub usize);

impl fmt::Display for PublicationIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
