//! Allocation model: the result of matching, still carrying identities.
//!
//! An [`Allocation`] is the private, fully identified result. It is turned
//! into a publishable form by the anonymiser and must not be written out
//! as-is.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{AllocationParams, Participant, RoomId, constants};

/// Where a participant ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    /// Placed in `room`, which sits at `rank` in their preferences.
    Room { room: RoomId, rank: usize },
    /// Not given a room.
    Kicked {
        /// `true` if removed by the capacity cap before matching.
        pre_removed: bool,
    },
}

impl Placement {
    #[must_use]
    pub fn room(&self) -> Option<&RoomId> {
        match self {
            Self::Room { room, .. } => Some(room),
            Self::Kicked { .. } => None,
        }
    }

    #[must_use]
    pub fn rank(&self) -> Option<usize> {
        match self {
            Self::Room { rank, .. } => Some(*rank),
            Self::Kicked { .. } => None,
        }
    }

    #[must_use]
    pub fn is_kicked(&self) -> bool {
        matches!(self, Self::Kicked { .. })
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Room { room, .. } => write!(f, "{room}"),
            Self::Kicked { .. } => f.write_str(constants::KICKED_LABEL),
        }
    }
}

/// One real participant's result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRow {
    pub participant: Participant,
    /// Index of the participant in the ballot the allocator was given.
    pub ballot_position: usize,
    pub placement: Placement,
    /// This row's contribution to the total cost.
    pub cost: f64,
}

/// The complete, identified result of a ballot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// One row per real participant: matched rows in matching order, then
    /// pre-removed rows.
    pub rows: Vec<AllocationRow>,
    /// Every room that appeared on the ballot, sorted.
    pub rooms: Vec<RoomId>,
    /// Shared number of choices per participant.
    pub choices: usize,
    /// Minimised total cost over the padded problem.
    pub total_cost: f64,
    /// Side length of the square problem handed to the solver.
    pub dimension: usize,
    /// SHA-256 over the rows, for determinism checks.
    pub allocation_root: [u8; 32],
    /// Settings the allocation was computed under.
    pub params: AllocationParams,
}

impl Allocation {
    #[must_use]
    pub fn placed(&self) -> usize {
        self.rows.iter().filter(|r| !r.placement.is_kicked()).count()
    }

    #[must_use]
    pub fn kicked(&self) -> usize {
        self.rows.len() - self.placed()
    }

    /// Rooms nobody was placed in.
    #[must_use]
    pub fn vacant_rooms(&self) -> Vec<&RoomId> {
        self.rooms
            .iter()
            .filter(|room| !self.rows.iter().any(|r| r.placement.room() == Some(*room)))
            .collect()
    }
}
