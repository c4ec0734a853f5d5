//! Preference model: participants and the validated ballot.
//!
//! A [`Ballot`] can only be built from a non-empty, rectangular set of
//! participants. Once built, the only mutation allowed is reordering the
//! participants with [`Ballot::permute`] (to remove input-order bias before
//! matching).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{BallotError, Result, RoomId};

/// One person taking part in the ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Display name. Sensitive.
    pub name: String,
    /// Institutional id. Sensitive.
    pub id: String,
    /// Priority, `>= 1`. Higher values are lower priority.
    pub priority: u32,
    /// Ranked room choices, index 0 is the most wanted.
    pub preferences: Vec<RoomId>,
}

impl Participant {
    /// Position of `room` in this participant's preferences, if listed.
    #[must_use]
    pub fn rank_of(&self, room: &RoomId) -> Option<usize> {
        self.preferences.iter().position(|r| r == room)
    }

    /// The first `k` choices (or all of them if fewer).
    #[must_use]
    pub fn prefix(&self, k: usize) -> &[RoomId] {
        &self.preferences[..k.min(self.preferences.len())]
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Participant {
    pub fn dummy(name: &str, priority: u32, preferences: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            id: format!("{}{priority}", name.to_lowercase()),
            priority,
            preferences: preferences.iter().map(|r| RoomId::from(*r)).collect(),
        }
    }
}

/// Headline numbers about a ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotSummary {
    pub participants: usize,
    pub choices: usize,
    pub rooms: usize,
    /// Rooms whose name matches one of the desirable-category prefixes.
    pub desirable_rooms: usize,
}

/// A validated batch of participants and the rooms they selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    participants: Vec<Participant>,
    rooms: Vec<RoomId>,
    choices: usize,
}

impl Ballot {
    /// Validate participants and derive the room set.
    ///
    /// # Errors
    /// - `EmptyBallot` if there are no participants
    /// - `NoChoices` if participants listed no rooms
    /// - `RaggedPreferences` if choice counts differ
    /// - `MissingField` for an empty name or id
    /// - `InvalidPriority` for priority `0`
    pub fn new(participants: Vec<Participant>) -> Result<Self> {
        let Some(first) = participants.first() else {
            return Err(BallotError::EmptyBallot);
        };
        let choices = first.preferences.len();
        if choices == 0 {
            return Err(BallotError::NoChoices);
        }

        for (i, p) in participants.iter().enumerate() {
            if p.name.trim().is_empty() {
                return Err(BallotError::MissingField {
                    participant: i,
                    field: "name",
                });
            }
            if p.id.trim().is_empty() {
                return Err(BallotError::MissingField {
                    participant: i,
                    field: "id",
                });
            }
            if p.priority == 0 {
                return Err(BallotError::InvalidPriority {
                    participant: i,
                    value: p.priority.to_string(),
                });
            }
            if p.preferences.len() != choices {
                return Err(BallotError::RaggedPreferences {
                    participant: i,
                    expected: choices,
                    actual: p.preferences.len(),
                });
            }
        }

        // BTreeSet: sorted and deduplicated, independent of input order.
        let rooms: BTreeSet<&RoomId> = participants.iter().flat_map(|p| &p.preferences).collect();
        let rooms = rooms.into_iter().cloned().collect();

        Ok(Self {
            participants,
            rooms,
            choices,
        })
    }

    #[must_use]
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Reorder participants so that position `i` holds the participant
    /// previously at `order[i]`.
    ///
    /// This is the only mutation a built ballot allows; participants
    /// themselves stay as validated.
    ///
    /// ```compile_fail
    /// # use roomballot_types::Ballot;
    /// fn lower_priority(ballot: &mut Ballot) {
    ///     ballot.participants()[0].priority = 0;
    /// }
    /// ```
    ///
    /// # Errors
    /// Returns `NotABijection` unless `order` is a permutation of
    /// `0..len()`. The ballot is left untouched on error.
    pub fn permute(&mut self, order: &[usize]) -> Result<()> {
        let n = self.participants.len();
        if order.len() != n {
            return Err(BallotError::NotABijection {
                reason: format!("order has {} entries for {n} participants", order.len()),
            });
        }
        let mut seen = vec![false; n];
        for &i in order {
            match seen.get_mut(i) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => {
                    return Err(BallotError::NotABijection {
                        reason: format!("position {i} appears twice"),
                    });
                }
                None => {
                    return Err(BallotError::NotABijection {
                        reason: format!("position {i} out of range"),
                    });
                }
            }
        }

        let mut taken: Vec<Option<Participant>> =
            std::mem::take(&mut self.participants).into_iter().map(Some).collect();
        self.participants = order.iter().filter_map(|&i| taken[i].take()).collect();
        Ok(())
    }

    /// All selected rooms, sorted.
    #[must_use]
    pub fn rooms(&self) -> &[RoomId] {
        &self.rooms
    }

    /// Number of choices every participant made.
    #[must_use]
    pub fn choices(&self) -> usize {
        self.choices
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    #[must_use]
    pub fn summary<S: AsRef<str>>(&self, desirable_prefixes: &[S]) -> BallotSummary {
        BallotSummary {
            participants: self.participants.len(),
            choices: self.choices,
            rooms: self.rooms.len(),
            desirable_rooms: self
                .rooms
                .iter()
                .filter(|r| r.has_any_prefix(desirable_prefixes))
                .count(),
        }
    }

    /// Split into participants and rooms.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Participant>, Vec<RoomId>) {
        (self.participants, self.rooms)
    }
}
