//! Cost model: all fairness policy lives here.
//!
//! The solver minimises the sum of these costs, so only their relative
//! order matters:
//!
//! ```text
//! wanted room, rank i   tanh(i * atanh(cut) / (k - 1))      in [0, cut]
//! desirable category    minus category_bias
//! kicked                kick_cost + kick_priority_weight / priority
//! unwanted room         unwanted_cost (big-M, never chosen while a kick is open)
//! any placeholder       0
//! ```

use roomballot_types::{BallotConfig, CostConfig, Entrant, Outcome, Participant, Result, RoomId};

/// Pure `(entrant, outcome) -> cost` function.
#[derive(Debug, Clone)]
pub struct CostModel {
    config: CostConfig,
    desirable_prefixes: Vec<String>,
}

impl CostModel {
    /// Build a cost model from validated constants.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the constants break the cost ordering.
    pub fn new(config: CostConfig, desirable_prefixes: Vec<String>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            desirable_prefixes,
        })
    }

    /// Build from the cost section and category prefixes of a ballot config.
    ///
    /// # Errors
    /// Same as [`CostModel::new`].
    pub fn from_config(config: &BallotConfig) -> Result<Self> {
        Self::new(config.cost, config.desirable_prefixes.clone())
    }

    #[must_use]
    pub fn config(&self) -> &CostConfig {
        &self.config
    }

    /// Saturating cost of getting the room at `rank` out of `choices`.
    ///
    /// `rank 0` costs 0, the last choice costs exactly `cut`.
    #[must_use]
    pub fn rank_cost(&self, rank: usize, choices: usize) -> f64 {
        let coef = self.config.cut.atanh() / choices.saturating_sub(1).max(1) as f64;
        (rank as f64 * coef).tanh()
    }

    /// Cost of kicking a participant with the given priority.
    #[must_use]
    pub fn kick_cost(&self, priority: u32) -> f64 {
        self.config.kick_cost + self.config.kick_priority_weight / f64::from(priority.max(1))
    }

    #[must_use]
    pub fn is_desirable(&self, room: &RoomId) -> bool {
        room.has_any_prefix(&self.desirable_prefixes)
    }

    /// Cost of placing `participant` in `room`.
    #[must_use]
    pub fn room_cost(&self, participant: &Participant, room: &RoomId) -> f64 {
        match participant.rank_of(room) {
            Some(rank) => {
                let base = self.rank_cost(rank, participant.preferences.len());
                if self.is_desirable(room) {
                    base - self.config.category_bias
                } else {
                    base
                }
            }
            None => self.config.unwanted_cost,
        }
    }

    /// Cost of pairing `entrant` with `outcome`.
    #[must_use]
    pub fn cost(&self, entrant: &Entrant, outcome: &Outcome) -> f64 {
        match (entrant, outcome) {
            (Entrant::Null, _) | (Entrant::Real(_), Outcome::Filler) => 0.0,
            (Entrant::Real(p), Outcome::Kicked) => self.kick_cost(p.priority),
            (Entrant::Real(p), Outcome::Room(room)) => self.room_cost(p, room),
        }
    }
}
