//! Publication model: what leaves the engine.
//!
//! - [`PublicArtifact`] is safe to publish. It carries secret identities,
//!   never names or ids.
//! - [`PrivateToken`] goes to exactly one participant over a private channel.
//! - [`VerifiedOutcome`] is what a successful verification reveals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AllocationParams, PublicationIndex, RoomId};

/// One anonymised row of the published result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedRow {
    pub index: PublicationIndex,
    /// Position in the (shuffled) ballot the matching ran over. Sorting rows
    /// by this rebuilds the solver's input.
    pub ballot_position: usize,
    /// Hex of `padded_name XOR one_time_pad`.
    pub secret_identity: String,
    pub priority: u32,
    pub preferences: Vec<RoomId>,
    /// Rank of the assigned room, `None` when kicked.
    pub rank: Option<usize>,
    /// Room name or `KICKED`.
    pub outcome: String,
}

/// The re-loadable public record of a ballot run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicArtifact {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    /// Width names were padded to.
    pub name_width: usize,
    pub choices: usize,
    pub rooms: Vec<RoomId>,
    /// Settings needed to replay the matching.
    pub params: AllocationParams,
    pub total_cost: f64,
    /// Rows in publication order; `rows[i].index == i`.
    pub rows: Vec<PublishedRow>,
    /// Hex SHA-256 over everything except `generated_at`.
    pub digest: String,
}

impl PublicArtifact {
    #[must_use]
    pub fn row(&self, index: PublicationIndex) -> Option<&PublishedRow> {
        self.rows.get(index.0).filter(|r| r.index == index)
    }
}

/// Private material handed to one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateToken {
    pub name: String,
    pub id: String,
    pub index: PublicationIndex,
    /// The one-time pad. Never published.
    pub pad: String,
}

/// What a successful verification reveals to the claimant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedOutcome {
    pub index: PublicationIndex,
    pub priority: u32,
    pub preferences: Vec<RoomId>,
    pub rank: Option<usize>,
    pub outcome: String,
}

impl From<&PublishedRow> for VerifiedOutcome {
    fn from(row: &PublishedRow) -> Self {
        Self {
            index: row.index,
            priority: row.priority,
            preferences: row.preferences.clone(),
            rank: row.rank,
            outcome: row.outcome.clone(),
        }
    }
}
