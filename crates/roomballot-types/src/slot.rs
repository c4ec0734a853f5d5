//! The two sides of the square assignment problem.
//!
//! Real participants and rooms are mixed with synthetic placeholders so the
//! problem becomes one-to-one. Placeholders only live for the duration of a
//! matching run; they never reach published output.

use serde::{Deserialize, Serialize};

use crate::{Participant, RoomId};

/// Agent side of the assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entrant {
    /// A participant from the ballot.
    Real(Participant),
    /// Cost-inert padding on the participant side.
    Null,
}

impl Entrant {
    #[must_use]
    pub fn is_real(&self) -> bool {
        matches!(self, Self::Real(_))
    }

    #[must_use]
    pub fn participant(&self) -> Option<&Participant> {
        match self {
            Self::Real(p) => Some(p),
            Self::Null => None,
        }
    }
}

/// Task side of the assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// A real room.
    Room(RoomId),
    /// Removed from the ballot. A valid target, one slot per real participant.
    Kicked,
    /// Cost-inert padding on the room side, absorbs unused capacity.
    Filler,
}

impl Outcome {
    #[must_use]
    pub fn room(&self) -> Option<&RoomId> {
        match self {
            Self::Room(r) => Some(r),
            Self::Kicked | Self::Filler => None,
        }
    }
}
