//! Collusion scan over the raw ballot.
//!
//! Read-only: nothing here feeds back into costs or matching.
//!
//! Two detectors:
//! - **prefix clusters**: participants whose first `k` choices coincide
//!   (as a set or as a sequence, see [`PrefixPolicy`]). Any group with more
//!   than one member is reported.
//! - **overlaps**: pairs whose full preference lists share at least
//!   `min_shared` rooms.
//!
//! Members are reported as indices into the participant slice, never names.

use std::collections::{BTreeMap, BTreeSet};

use roomballot_types::{BallotError, CollusionConfig, Participant, PrefixPolicy, Result, RoomId};

/// A group of participants sharing the same leading preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollusionCluster {
    pub prefix_len: usize,
    /// The shared prefix. Sorted when grouping by set.
    pub prefix: Vec<RoomId>,
    /// Indices into the scanned slice, ascending.
    pub members: Vec<usize>,
}

/// Two participants with heavily overlapping preference lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapPair {
    pub first: usize,
    pub second: usize,
    pub shared: usize,
}

/// Everything one [`scan`] found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollusionReport {
    pub clusters: Vec<CollusionCluster>,
    pub overlaps: Vec<OverlapPair>,
}

impl CollusionReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.clusters.is_empty() && self.overlaps.is_empty()
    }
}

/// Group participants by their first `k` choices.
///
/// Clusters come back ordered by prefix key, which keeps output stable
/// across runs regardless of hash seeds.
///
/// # Errors
/// Returns `InvalidPrefixLength` if `k` is zero or longer than the shared
/// preference length.
pub fn find_prefix_clusters(
    participants: &[Participant],
    k: usize,
    policy: PrefixPolicy,
) -> Result<Vec<CollusionCluster>> {
    let choices = participants.first().map_or(0, |p| p.preferences.len());
    if k == 0 || k > choices {
        return Err(BallotError::InvalidPrefixLength {
            requested: k,
            choices,
        });
    }

    let mut groups: BTreeMap<Vec<RoomId>, Vec<usize>> = BTreeMap::new();
    for (i, p) in participants.iter().enumerate() {
        let mut key = p.prefix(k).to_vec();
        if policy == PrefixPolicy::PrefixSet {
            key.sort();
        }
        groups.entry(key).or_default().push(i);
    }

    Ok(groups
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(prefix, members)| CollusionCluster {
            prefix_len: k,
            prefix,
            members,
        })
        .collect())
}

/// Every pair sharing at least `min_shared` rooms anywhere in their lists.
#[must_use]
pub fn find_overlaps(participants: &[Participant], min_shared: usize) -> Vec<OverlapPair> {
    let sets: Vec<BTreeSet<&RoomId>> = participants
        .iter()
        .map(|p| p.preferences.iter().collect())
        .collect();

    let mut pairs = Vec::new();
    for (first, a) in sets.iter().enumerate() {
        for (second, b) in sets.iter().enumerate().skip(first + 1) {
            let shared = a.intersection(b).count();
            if shared >= min_shared {
                pairs.push(OverlapPair {
                    first,
                    second,
                    shared,
                });
            }
        }
    }
    pairs
}

/// Run every detector `config` enables.
///
/// # Errors
/// Propagates `InvalidPrefixLength` from [`find_prefix_clusters`].
pub fn scan(participants: &[Participant], config: &CollusionConfig) -> Result<CollusionReport> {
    let mut report = CollusionReport::default();
    for &k in &config.prefix_lengths {
        report
            .clusters
            .extend(find_prefix_clusters(participants, k, config.policy)?);
    }
    if let Some(min_shared) = config.overlap_threshold {
        report.overlaps = find_overlaps(participants, min_shared);
    }

    if report.is_clean() {
        tracing::info!(participants = participants.len(), "Collusion scan clean");
    } else {
        tracing::warn!(
            clusters = report.clusters.len(),
            largest = report.clusters.iter().map(|c| c.members.len()).max().unwrap_or(0),
            overlaps = report.overlaps.len(),
            "Suspected collusion"
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ballot() -> Vec<Participant> {
        vec![
            Participant::dummy("Ann", 1, &["A", "B", "C", "D"]),
            Participant::dummy("Bob", 1, &["A", "B", "C", "E"]),
            Participant::dummy("Cat", 2, &["A", "B", "C", "F"]),
            Participant::dummy("Dan", 2, &["A", "B", "D", "C"]),
        ]
    }

    #[test]
    fn identical_prefix_of_three_reported() {
        let clusters = find_prefix_clusters(&ballot(), 3, PrefixPolicy::PrefixSequence).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members, vec![0, 1, 2]);
        assert_eq!(clusters[0].prefix_len, 3);
    }

    #[test]
    fn set_policy_ignores_order() {
        let people = vec![
            Participant::dummy("Ann", 1, &["A", "B", "C"]),
            Participant::dummy("Bob", 1, &["C", "A", "B"]),
            Participant::dummy("Cat", 1, &["B", "C", "D"]),
        ];
        let by_set = find_prefix_clusters(&people, 3, PrefixPolicy::PrefixSet).unwrap();
        assert_eq!(by_set.len(), 1);
        assert_eq!(by_set[0].members, vec![0, 1]);

        let by_seq = find_prefix_clusters(&people, 3, PrefixPolicy::PrefixSequence).unwrap();
        assert!(by_seq.is_empty());
    }

    #[test]
    fn singletons_not_reported() {
        let people = vec![
            Participant::dummy("Ann", 1, &["A", "B"]),
            Participant::dummy("Bob", 1, &["B", "C"]),
        ];
        assert!(
            find_prefix_clusters(&people, 2, PrefixPolicy::PrefixSet)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn bad_prefix_length_rejected() {
        assert!(matches!(
            find_prefix_clusters(&ballot(), 0, PrefixPolicy::PrefixSet),
            Err(BallotError::InvalidPrefixLength { requested: 0, .. })
        ));
        assert!(matches!(
            find_prefix_clusters(&ballot(), 5, PrefixPolicy::PrefixSet),
            Err(BallotError::InvalidPrefixLength {
                requested: 5,
                choices: 4
            })
        ));
    }

    #[test]
    fn overlap_pairs_above_threshold() {
        let pairs = find_overlaps(&ballot(), 4);
        // Ann and Dan list the same four rooms.
        assert_eq!(
            pairs,
            vec![OverlapPair {
                first: 0,
                second: 3,
                shared: 4
            }]
        );
        assert_eq!(find_overlaps(&ballot(), 3).len(), 6);
    }

    #[test]
    fn scan_combines_detectors() {
        let config = CollusionConfig {
            prefix_lengths: vec![2, 3],
            policy: PrefixPolicy::PrefixSequence,
            overlap_threshold: Some(4),
        };
        let report = scan(&ballot(), &config).unwrap();
        // k = 2: everyone shares [A, B]; k = 3: Ann, Bob, Cat.
        assert_eq!(report.clusters.len(), 2);
        assert_eq!(report.clusters[0].members, vec![0, 1, 2, 3]);
        assert_eq!(report.overlaps.len(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn default_config_scans_nothing() {
        let report = scan(&ballot(), &CollusionConfig::default()).unwrap();
        assert!(report.is_clean());
    }
}
