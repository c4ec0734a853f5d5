//! Replay: re-run the matching from nothing but the public artifact.
//!
//! Sorting published rows by `ballot_position` rebuilds the ballot the
//! solver saw, with secret identities standing in for names. The cost model
//! never reads names, so a faithful artifact replays to the same outcome in
//! every row and the same total cost.

use roomballot_core::Allocator;
use roomballot_types::{
    AllocationRow, Ballot, BallotError, Participant, PublicArtifact, PublicationIndex,
    PublishedRow, Result,
};

/// Relative tolerance when comparing total costs.
const COST_TOLERANCE: f64 = 1e-9;

/// Outcome of replaying a public artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    pub rows: usize,
    /// Rows whose replayed outcome differs from the published one.
    pub mismatched: Vec<PublicationIndex>,
    /// Whether the rebuilt ballot selects exactly the published rooms.
    pub rooms_match: bool,
    pub published_total_cost: f64,
    pub replayed_total_cost: f64,
}

impl ReplayReport {
    #[must_use]
    pub fn cost_matches(&self) -> bool {
        let scale = self.published_total_cost.abs().max(1.0);
        (self.replayed_total_cost - self.published_total_cost).abs() <= COST_TOLERANCE * scale
    }

    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.rooms_match && self.mismatched.is_empty() && self.cost_matches()
    }
}

/// Rebuild the solver's input from `artifact`, allocate it again under the
/// published parameters and compare.
///
/// # Errors
/// - `ArtifactTampered` if ballot positions are not a permutation of the rows
/// - any ballot or configuration error the published data triggers
pub fn replay_allocation(artifact: &PublicArtifact) -> Result<ReplayReport> {
    let n = artifact.rows.len();
    let mut by_position: Vec<Option<&PublishedRow>> = vec![None; n];
    for row in &artifact.rows {
        let Some(slot) = by_position.get_mut(row.ballot_position) else {
            return Err(BallotError::ArtifactTampered);
        };
        if slot.is_some() {
            return Err(BallotError::ArtifactTampered);
        }
        *slot = Some(row);
    }

    let participants = by_position
        .iter()
        .flatten()
        .map(|row| Participant {
            name: row.secret_identity.clone(),
            id: row.index.to_string(),
            priority: row.priority,
            preferences: row.preferences.clone(),
        })
        .collect();
    let ballot = Ballot::new(participants)?;
    let rooms_match = ballot.rooms() == artifact.rooms.as_slice();

    let allocation = Allocator::new(&artifact.params.to_config())?.allocate(ballot)?;

    let mut replayed: Vec<Option<&AllocationRow>> = vec![None; n];
    for row in &allocation.rows {
        if let Some(slot) = replayed.get_mut(row.ballot_position) {
            *slot = Some(row);
        }
    }
    let mismatched: Vec<PublicationIndex> = artifact
        .rows
        .iter()
        .filter(|published| {
            replayed[published.ballot_position].is_none_or(|r| {
                r.placement.rank() != published.rank || r.placement.to_string() != published.outcome
            })
        })
        .map(|published| published.index)
        .collect();

    let report = ReplayReport {
        rows: n,
        mismatched,
        rooms_match,
        published_total_cost: artifact.total_cost,
        replayed_total_cost: allocation.total_cost,
    };

    if report.is_consistent() {
        tracing::info!(rows = n, "Replayed allocation matches publication");
    } else {
        tracing::warn!(
            rows = n,
            mismatched = report.mismatched.len(),
            rooms_match,
            cost_matches = report.cost_matches(),
            "Replayed allocation differs from publication"
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_chacha::{ChaCha8Rng, ChaCha20Rng};
    use roomballot_core::shuffle_ballot;
    use roomballot_types::{BallotConfig, constants};

    use super::*;
    use crate::{Anonymizer, artifact_from_json, artifact_to_json, compute_artifact_digest};

    fn publish(people: Vec<Participant>, config: &BallotConfig, seed: u64) -> PublicArtifact {
        let mut ballot = Ballot::new(people).unwrap();
        shuffle_ballot(&mut ballot, &mut ChaCha8Rng::seed_from_u64(seed)).unwrap();
        let allocation = Allocator::new(config).unwrap().allocate(ballot).unwrap();
        Anonymizer::default()
            .anonymize(&allocation, &mut ChaCha20Rng::seed_from_u64(seed))
            .unwrap()
            .artifact
    }

    fn random_people(rng: &mut ChaCha8Rng, count: usize, choices: usize) -> Vec<Participant> {
        let rooms = ["A1", "A2", "B1", "B2", "H1", "H2", "H3", "C1"];
        (0..count)
            .map(|i| {
                let mut prefs: Vec<&str> = Vec::with_capacity(choices);
                while prefs.len() < choices {
                    let room = rooms[rng.gen_range(0..rooms.len())];
                    if !prefs.contains(&room) {
                        prefs.push(room);
                    }
                }
                Participant::dummy(&format!("P{i}"), rng.gen_range(1..=3), &prefs)
            })
            .collect()
    }

    fn reseal(artifact: &mut PublicArtifact) {
        artifact.digest = compute_artifact_digest(artifact);
    }

    #[test]
    fn reloaded_artifacts_replay_exactly() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for round in 0..40 {
            let config = BallotConfig {
                max_rooms: (round % 3 == 0).then_some(4),
                desirable_prefixes: vec!["H".into()],
                ..BallotConfig::default()
            };
            let count = rng.gen_range(2..=9);
            let artifact = publish(random_people(&mut rng, count, 3), &config, round);
            let reloaded = artifact_from_json(&artifact_to_json(&artifact).unwrap()).unwrap();

            let report = replay_allocation(&reloaded).unwrap();
            assert!(report.is_consistent(), "round {round}: {report:?}");
            assert_eq!(report.rows, count);
        }
    }

    #[test]
    fn swapped_outcomes_are_flagged() {
        let people = vec![
            Participant::dummy("Ann", 1, &["A", "B"]),
            Participant::dummy("Bob", 1, &["A", "C"]),
            Participant::dummy("Cat", 2, &["B", "A"]),
            Participant::dummy("Dan", 3, &["A", "B"]),
        ];
        let mut artifact = publish(people, &BallotConfig::default(), 1);
        let kicked = artifact
            .rows
            .iter()
            .position(|r| r.outcome == constants::KICKED_LABEL)
            .unwrap();
        let placed = artifact
            .rows
            .iter()
            .position(|r| r.outcome != constants::KICKED_LABEL)
            .unwrap();
        let (a, b) = (artifact.rows[kicked].clone(), artifact.rows[placed].clone());
        artifact.rows[kicked].outcome = b.outcome;
        artifact.rows[kicked].rank = b.rank;
        artifact.rows[placed].outcome = a.outcome;
        artifact.rows[placed].rank = a.rank;
        reseal(&mut artifact);

        let report = replay_allocation(&artifact).unwrap();
        assert!(!report.is_consistent());
        assert!(report.mismatched.contains(&PublicationIndex(kicked)));
        assert!(report.mismatched.contains(&PublicationIndex(placed)));
    }

    #[test]
    fn inflated_total_is_flagged() {
        let people = vec![
            Participant::dummy("Ann", 1, &["A", "B"]),
            Participant::dummy("Bob", 2, &["A", "B"]),
        ];
        let mut artifact = publish(people, &BallotConfig::default(), 2);
        artifact.total_cost += 0.5;
        reseal(&mut artifact);

        let report = replay_allocation(&artifact).unwrap();
        assert!(report.mismatched.is_empty());
        assert!(!report.cost_matches());
        assert!(!report.is_consistent());
    }

    #[test]
    fn duplicate_positions_rejected() {
        let people = vec![
            Participant::dummy("Ann", 1, &["A"]),
            Participant::dummy("Bob", 1, &["B"]),
        ];
        let mut artifact = publish(people, &BallotConfig::default(), 3);
        artifact.rows[1].ballot_position = artifact.rows[0].ballot_position;
        assert!(matches!(
            replay_allocation(&artifact),
            Err(BallotError::ArtifactTampered)
        ));
    }
}
