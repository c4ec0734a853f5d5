//! Self-verification against a published artifact.
//!
//! Every failure, whatever its cause, is the same
//! [`BallotError::VerificationFailed`]. A caller learns nothing about which
//! part of a claim was wrong.

use roomballot_types::{BallotError, PublicArtifact, PublicationIndex, Result, VerifiedOutcome};

use crate::pad::{pad_name, xor};

/// What a participant presents: their row index, their pad, and their name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub index: PublicationIndex,
    pub pad: String,
    pub name: String,
}

/// Check `claim` against the row it points at.
///
/// Recovers the padded name as `secret XOR pad` and compares it with the
/// claimed name padded to the artifact's width.
///
/// # Errors
/// Returns `VerificationFailed` on any mismatch.
pub fn verify_claim(artifact: &PublicArtifact, claim: &Claim) -> Result<VerifiedOutcome> {
    let outcome = check_claim(artifact, claim).ok_or(BallotError::VerificationFailed);
    tracing::info!(verified = outcome.is_ok(), "Claim checked");
    outcome
}

fn check_claim(artifact: &PublicArtifact, claim: &Claim) -> Option<VerifiedOutcome> {
    let row = artifact.row(claim.index)?;
    let secret = hex::decode(&row.secret_identity).ok()?;
    if claim.pad.len() != secret.len() {
        return None;
    }
    let expected = pad_name(claim.index.0, &claim.name, artifact.name_width).ok()?;
    (xor(&secret, claim.pad.as_bytes()) == expected).then(|| VerifiedOutcome::from(row))
}

/// Look a row up by its hex secret identity alone.
///
/// # Errors
/// Returns `VerificationFailed` if no row carries that secret.
pub fn verify_secret(artifact: &PublicArtifact, secret_hex: &str) -> Result<VerifiedOutcome> {
    let wanted = secret_hex.trim().to_ascii_lowercase();
    let outcome = artifact
        .rows
        .iter()
        .find(|row| !wanted.is_empty() && row.secret_identity == wanted)
        .map(VerifiedOutcome::from)
        .ok_or(BallotError::VerificationFailed);
    tracing::info!(verified = outcome.is_ok(), "Secret looked up");
    outcome
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use roomballot_types::{
        Allocation, AllocationParams, AllocationRow, Participant, Placement, RoomId,
    };

    use super::*;
    use crate::{Anonymizer, Publication};

    fn publication() -> (Publication, Vec<String>) {
        let names = vec!["Ann".to_string(), "Bob".to_string()];
        let rows = names
            .iter()
            .enumerate()
            .map(|(i, n)| AllocationRow {
                participant: Participant::dummy(n, 2, &["A"]),
                ballot_position: i,
                placement: Placement::Room {
                    room: RoomId::from("A"),
                    rank: 0,
                },
                cost: 0.0,
            })
            .collect();
        let allocation = Allocation {
            rows,
            rooms: vec![RoomId::from("A")],
            choices: 1,
            total_cost: 0.0,
            dimension: 0,
            allocation_root: [0; 32],
            params: AllocationParams::default(),
        };
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let publication = Anonymizer::default().anonymize(&allocation, &mut rng).unwrap();
        (publication, names)
    }

    fn claim(publication: &Publication, who: usize) -> Claim {
        let token = &publication.tokens[who];
        Claim {
            index: token.index,
            pad: token.pad.clone(),
            name: token.name.clone(),
        }
    }

    #[test]
    fn genuine_claim_verifies() {
        let (publication, _) = publication();
        let outcome = verify_claim(&publication.artifact, &claim(&publication, 1)).unwrap();
        assert_eq!(outcome.index, publication.tokens[1].index);
        assert_eq!(outcome.priority, 2);
        assert_eq!(outcome.outcome, "A");
        assert_eq!(outcome.rank, Some(0));
    }

    #[test]
    fn every_wrong_part_fails_the_same_way() {
        let (publication, names) = publication();
        let good = claim(&publication, 0);

        let wrong_name = Claim {
            name: names[1].clone(),
            ..good.clone()
        };
        let wrong_index = Claim {
            index: publication.tokens[1].index,
            ..good.clone()
        };
        let out_of_range = Claim {
            index: PublicationIndex(99),
            ..good.clone()
        };
        let short_pad = Claim {
            pad: good.pad[..4].to_string(),
            ..good.clone()
        };
        let wrong_pad = Claim {
            pad: claim(&publication, 1).pad,
            ..good.clone()
        };
        let overlong_name = Claim {
            name: "x".repeat(64),
            ..good
        };

        for bad in [
            wrong_name,
            wrong_index,
            out_of_range,
            short_pad,
            wrong_pad,
            overlong_name,
        ] {
            let err = verify_claim(&publication.artifact, &bad).unwrap_err();
            assert!(matches!(err, BallotError::VerificationFailed));
            assert_eq!(err.to_string(), "RB_ERR_600: Verification failed");
        }
    }

    #[test]
    fn lookup_by_secret() {
        let (publication, _) = publication();
        let row = &publication.artifact.rows[1];
        let upper = row.secret_identity.to_ascii_uppercase();
        let outcome = verify_secret(&publication.artifact, &upper).unwrap();
        assert_eq!(outcome.index, row.index);

        assert!(verify_secret(&publication.artifact, "").is_err());
        assert!(verify_secret(&publication.artifact, "deadbeef").is_err());
    }
}
