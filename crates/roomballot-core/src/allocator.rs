//! Allocator: the full matching pipeline over one ballot.
//!
//! ```text
//! allocate(Ballot) -> Allocation
//! ```
//!
//! ## Algorithm
//!
//! 1. Balance: pre-remove over the cap, add kicked slots, pad to `N×N`
//! 2. Solve: exact minimum-cost matching of entrants to outcomes
//! 3. Check: every real participant placed in a room must have listed it
//! 4. Emit one row per real participant, pre-removed rows last
//! 5. Compute the allocation root for determinism checks
//!
//! The allocator holds no randomness. Callers that want to break ties
//! fairly shuffle the ballot first with [`shuffle_ballot`].

use rand::{Rng, seq::SliceRandom};
use roomballot_types::{
    Allocation, AllocationParams, AllocationRow, Ballot, BallotConfig, BallotError, Entrant,
    Outcome, Placement, Result,
};

use crate::{
    Balancer, CostModel, HungarianSolver, compute_allocation_root,
    solver::{AssignmentSolver, linear_assignment},
};

/// Randomise participant order to remove input-order bias from tie-breaking.
///
/// Pass an entropy-backed generator in production; a seeded one in tests.
///
/// # Errors
/// Only if [`Ballot::permute`] rejects the drawn order, which cannot happen
/// for a shuffled identity.
pub fn shuffle_ballot<R: Rng + ?Sized>(ballot: &mut Ballot, rng: &mut R) -> Result<()> {
    let mut order: Vec<usize> = (0..ballot.len()).collect();
    order.shuffle(rng);
    ballot.permute(&order)
}

/// Runs the balance → solve → check pipeline.
#[derive(Debug, Clone)]
pub struct Allocator<S = HungarianSolver> {
    cost_model: CostModel,
    balancer: Balancer,
    params: AllocationParams,
    solver: S,
}

impl Allocator<HungarianSolver> {
    /// Allocator with the bundled Hungarian solver.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the configuration fails validation.
    pub fn new(config: &BallotConfig) -> Result<Self> {
        Self::with_solver(config, HungarianSolver)
    }
}

impl<S: AssignmentSolver> Allocator<S> {
    /// Allocator with a caller-supplied solver.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the configuration fails validation.
    pub fn with_solver(config: &BallotConfig, solver: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            cost_model: CostModel::from_config(config)?,
            balancer: Balancer::new(config.max_rooms),
            params: AllocationParams::from(config),
            solver,
        })
    }

    #[must_use]
    pub fn cost_model(&self) -> &CostModel {
        &self.cost_model
    }

    /// Compute the globally cheapest allocation for `ballot`.
    ///
    /// # Errors
    /// - `UnwantedAssignment` if a participant ends up in a room they did not list
    /// - `NotABijection` / `Internal` if the solver output is inconsistent
    pub fn allocate(&self, ballot: Ballot) -> Result<Allocation> {
        let summary = ballot.summary(&self.params.desirable_prefixes);
        tracing::info!(
            participants = summary.participants,
            choices = summary.choices,
            rooms = summary.rooms,
            desirable_rooms = summary.desirable_rooms,
            "Allocating ballot"
        );

        let choices = ballot.choices();
        let (participants, rooms) = ballot.into_parts();
        // Kept and removed participants both stay in ballot order, so their
        // positions can be read off the removal mask.
        let removed = self.balancer.removal_mask(&participants, rooms.len());
        let mut kept_positions = (0..removed.len()).filter(|&i| !removed[i]);
        let removed_positions = (0..removed.len()).filter(|&i| removed[i]);
        let problem = self.balancer.balance(participants, rooms.clone());
        let dimension = problem.dimension();
        let entrants = problem.entrants;
        let mut outcomes = problem.outcomes;

        tracing::info!(dimension, "Running minimisation");
        let total_cost = linear_assignment(&self.solver, &entrants, &mut outcomes, |e, o| {
            self.cost_model.cost(e, o)
        })?;

        let mut rows = Vec::with_capacity(summary.participants);
        for (slot, (entrant, outcome)) in entrants.into_iter().zip(outcomes).enumerate() {
            let cost = self.cost_model.cost(&entrant, &outcome);
            let participant = match entrant {
                Entrant::Real(p) => p,
                Entrant::Null => continue,
            };
            let Some(ballot_position) = kept_positions.next() else {
                return Err(BallotError::Internal(format!(
                    "entrant in slot {slot} has no ballot position"
                )));
            };
            let placement = match outcome {
                Outcome::Room(room) => {
                    let Some(rank) = participant.rank_of(&room) else {
                        return Err(BallotError::UnwantedAssignment {
                            participant: slot,
                            room: room.0,
                        });
                    };
                    Placement::Room { room, rank }
                }
                Outcome::Kicked => Placement::Kicked { pre_removed: false },
                Outcome::Filler => {
                    return Err(BallotError::Internal(format!(
                        "participant in slot {slot} matched to a filler outcome"
                    )));
                }
            };
            rows.push(AllocationRow {
                participant,
                ballot_position,
                placement,
                cost,
            });
        }

        rows.extend(
            problem
                .pre_kicked
                .into_iter()
                .zip(removed_positions)
                .map(|(participant, ballot_position)| AllocationRow {
                    participant,
                    ballot_position,
                    placement: Placement::Kicked { pre_removed: true },
                    cost: 0.0,
                }),
        );

        let allocation_root = compute_allocation_root(&rows);
        let allocation = Allocation {
            rows,
            rooms,
            choices,
            total_cost,
            dimension,
            allocation_root,
            params: self.params.clone(),
        };

        tracing::info!(
            placed = allocation.placed(),
            kicked = allocation.kicked(),
            total_cost = allocation.total_cost,
            allocation_root = hex::encode(allocation_root),
            "Allocation complete"
        );

        Ok(allocation)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use roomballot_types::{Participant, RoomId};

    use super::*;

    fn ballot(people: Vec<Participant>) -> Ballot {
        Ballot::new(people).unwrap()
    }

    fn allocator() -> Allocator {
        Allocator::new(&BallotConfig::default()).unwrap()
    }

    #[test]
    fn everyone_gets_first_choice_when_possible() {
        let allocation = allocator()
            .allocate(ballot(vec![
                Participant::dummy("Ann", 1, &["A", "B"]),
                Participant::dummy("Bob", 1, &["B", "A"]),
            ]))
            .unwrap();
        assert_eq!(allocation.kicked(), 0);
        for row in &allocation.rows {
            assert_eq!(row.placement.rank(), Some(0));
        }
        assert!(allocation.total_cost.abs() < 1e-12);
    }

    #[test]
    fn contention_resolved_by_second_choice() {
        let allocation = allocator()
            .allocate(ballot(vec![
                Participant::dummy("Ann", 1, &["A", "B"]),
                Participant::dummy("Bob", 1, &["A", "C"]),
                Participant::dummy("Cat", 1, &["C", "A"]),
            ]))
            .unwrap();
        // Ann gets B or Bob gets C; either way one second choice is paid.
        assert_eq!(allocation.kicked(), 0);
        let seconds = allocation
            .rows
            .iter()
            .filter(|r| r.placement.rank() == Some(1))
            .count();
        assert_eq!(seconds, 1);
    }

    #[test]
    fn lower_priority_kicked_on_tie() {
        let allocation = allocator()
            .allocate(ballot(vec![
                Participant::dummy("Ann", 1, &["A"]),
                Participant::dummy("Bob", 4, &["A"]),
            ]))
            .unwrap();
        let bob = allocation
            .rows
            .iter()
            .find(|r| r.participant.name == "Bob")
            .unwrap();
        assert!(bob.placement.is_kicked());
    }

    #[test]
    fn row_costs_sum_to_total() {
        let allocation = allocator()
            .allocate(ballot(vec![
                Participant::dummy("Ann", 1, &["A", "B"]),
                Participant::dummy("Bob", 2, &["A", "B"]),
                Participant::dummy("Cat", 3, &["A", "B"]),
            ]))
            .unwrap();
        let sum: f64 = allocation.rows.iter().map(|r| r.cost).sum();
        assert!((sum - allocation.total_cost).abs() < 1e-9);
        assert_eq!(allocation.rows.len(), 3);
        assert_eq!(allocation.kicked(), 1);
    }

    #[test]
    fn capacity_cap_marks_pre_removed() {
        let config = BallotConfig {
            max_rooms: Some(1),
            ..BallotConfig::default()
        };
        let allocation = Allocator::new(&config)
            .unwrap()
            .allocate(ballot(vec![
                Participant::dummy("Ann", 1, &["A", "B"]),
                Participant::dummy("Bob", 2, &["B", "A"]),
            ]))
            .unwrap();
        assert_eq!(allocation.placed(), 1);
        let last = allocation.rows.last().unwrap();
        assert_eq!(last.participant.name, "Bob");
        assert_eq!(last.placement, Placement::Kicked { pre_removed: true });
        assert_eq!(allocation.vacant_rooms(), vec![&RoomId::from("B")]);
    }

    #[test]
    fn rows_point_back_into_the_ballot() {
        let config = BallotConfig {
            max_rooms: Some(2),
            ..BallotConfig::default()
        };
        let people = vec![
            Participant::dummy("Ann", 3, &["A", "B"]),
            Participant::dummy("Bob", 1, &["B", "C"]),
            Participant::dummy("Cat", 2, &["C", "A"]),
            Participant::dummy("Dan", 1, &["A", "C"]),
        ];
        let allocation = Allocator::new(&config)
            .unwrap()
            .allocate(ballot(people.clone()))
            .unwrap();

        let mut positions: Vec<usize> = allocation.rows.iter().map(|r| r.ballot_position).collect();
        positions.sort_unstable();
        assert_eq!(positions, vec![0, 1, 2, 3]);
        for row in &allocation.rows {
            assert_eq!(row.participant, people[row.ballot_position]);
        }
        // Cap of 2 with 3 rooms removes the two highest priority values.
        let pre_removed: Vec<usize> = allocation
            .rows
            .iter()
            .filter(|r| r.placement == Placement::Kicked { pre_removed: true })
            .map(|r| r.ballot_position)
            .collect();
        assert_eq!(pre_removed, vec![0, 2]);
        assert_eq!(allocation.params.max_rooms, Some(2));
    }

    #[test]
    fn shuffle_keeps_every_participant() {
        let people: Vec<Participant> = (0..6)
            .map(|i| Participant::dummy(&format!("P{i}"), 1, &["A"]))
            .collect();
        let mut b = ballot(people.clone());
        shuffle_ballot(&mut b, &mut ChaCha8Rng::seed_from_u64(3)).unwrap();
        let mut names: Vec<&str> = b.participants().iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["P0", "P1", "P2", "P3", "P4", "P5"]);
    }

    #[test]
    fn seeded_shuffle_is_reproducible() {
        let people: Vec<Participant> = (0..8)
            .map(|i| Participant::dummy(&format!("P{i}"), 1, &["A", "B"]))
            .collect();
        let run = |seed: u64| {
            let mut b = ballot(people.clone());
            shuffle_ballot(&mut b, &mut ChaCha8Rng::seed_from_u64(seed)).unwrap();
            allocator().allocate(b).unwrap().allocation_root
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn invalid_config_rejected() {
        let config = BallotConfig {
            name_width: 0,
            ..BallotConfig::default()
        };
        assert!(Allocator::new(&config).is_err());
    }
}
