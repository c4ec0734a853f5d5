//! Publication order and the public artifact's integrity digest.
//!
//! The order rows appear in is:
//! 1. a stable sort by padded name, which erases input order
//! 2. a shuffle driven by `ChaCha20` seeded with
//!    `SHA-256(sorted padded names concatenated)`
//!
//! Nobody can predict the order without every name, yet anyone holding the
//! full name list can recompute it exactly.

use rand::{SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha20Rng;
use roomballot_types::{
    AllocationParams, BallotError, PrivateToken, PublicArtifact, Result, constants,
};
use sha2::{Digest, Sha256};

use crate::pad::pad_name;

/// Seed for the publication shuffle, from names already in sorted order.
pub fn publication_seed<'a>(sorted_names: impl IntoIterator<Item = &'a [u8]>) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for name in sorted_names {
        hasher.update(name);
    }
    hasher.finalize().into()
}

/// The row index published at each position: `order[pos] = i`.
#[must_use]
pub fn publication_order(padded_names: &[Vec<u8>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..padded_names.len()).collect();
    order.sort_by(|&a, &b| padded_names[a].cmp(&padded_names[b]));

    let seed = publication_seed(order.iter().map(|&i| padded_names[i].as_slice()));
    let mut rng = ChaCha20Rng::from_seed(seed);
    order.shuffle(&mut rng);
    order
}

/// Recompute the publication order from a token list and compare it with
/// the indices the tokens carry.
///
/// Names are compared rather than token positions, so participants with
/// identical names cannot cause a false mismatch.
///
/// # Errors
/// Returns `NameTooLong` if a token name does not fit `name_width`.
pub fn audit_publication_order(tokens: &[PrivateToken], name_width: usize) -> Result<bool> {
    let padded = tokens
        .iter()
        .enumerate()
        .map(|(i, t)| pad_name(i, &t.name, name_width))
        .collect::<Result<Vec<_>>>()?;

    let mut by_index: Vec<Option<&[u8]>> = vec![None; tokens.len()];
    for (token, name) in tokens.iter().zip(&padded) {
        let Some(slot) = by_index.get_mut(token.index.0) else {
            return Ok(false);
        };
        if slot.is_some() {
            return Ok(false);
        }
        *slot = Some(name.as_slice());
    }

    let order = publication_order(&padded);
    let consistent = order
        .iter()
        .enumerate()
        .all(|(pos, &i)| by_index[pos] == Some(padded[i].as_slice()));

    tracing::info!(tokens = tokens.len(), consistent, "Publication order audited");
    Ok(consistent)
}

/// SHA-256 over everything in the artifact except the timestamp and the
/// digest itself.
#[must_use]
pub fn compute_artifact_digest(artifact: &PublicArtifact) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"roomballot:artifact:v2:");
    hasher.update(artifact.version.to_le_bytes());
    hasher.update((artifact.name_width as u64).to_le_bytes());
    hasher.update((artifact.choices as u64).to_le_bytes());
    hasher.update(artifact.total_cost.to_bits().to_le_bytes());
    update_params(&mut hasher, &artifact.params);

    hasher.update((artifact.rooms.len() as u64).to_le_bytes());
    for room in &artifact.rooms {
        update_str(&mut hasher, room.as_str());
    }

    hasher.update((artifact.rows.len() as u64).to_le_bytes());
    for row in &artifact.rows {
        hasher.update((row.index.0 as u64).to_le_bytes());
        hasher.update((row.ballot_position as u64).to_le_bytes());
        update_str(&mut hasher, &row.secret_identity);
        hasher.update(row.priority.to_le_bytes());
        hasher.update((row.preferences.len() as u64).to_le_bytes());
        for room in &row.preferences {
            update_str(&mut hasher, room.as_str());
        }
        match row.rank {
            Some(rank) => {
                hasher.update([1u8]);
                hasher.update((rank as u64).to_le_bytes());
            }
            None => hasher.update([0u8]),
        }
        update_str(&mut hasher, &row.outcome);
    }

    hex::encode(hasher.finalize())
}

fn update_params(hasher: &mut Sha256, params: &AllocationParams) {
    match params.max_rooms {
        Some(cap) => {
            hasher.update([1u8]);
            hasher.update((cap as u64).to_le_bytes());
        }
        None => hasher.update([0u8]),
    }
    hasher.update((params.desirable_prefixes.len() as u64).to_le_bytes());
    for prefix in &params.desirable_prefixes {
        update_str(hasher, prefix);
    }
    let cost = &params.cost;
    for value in [
        cost.cut,
        cost.unwanted_cost,
        cost.kick_cost,
        cost.kick_priority_weight,
        cost.category_bias,
    ] {
        hasher.update(value.to_bits().to_le_bytes());
    }
}

fn update_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

/// Check the stored digest and the row numbering.
///
/// # Errors
/// Returns `ArtifactTampered` on any mismatch.
pub fn verify_artifact_digest(artifact: &PublicArtifact) -> Result<()> {
    let numbered = artifact
        .rows
        .iter()
        .enumerate()
        .all(|(i, row)| row.index.0 == i);
    if !numbered || compute_artifact_digest(artifact) != artifact.digest {
        return Err(BallotError::ArtifactTampered);
    }
    Ok(())
}

/// Parse and check a public artifact.
///
/// # Errors
/// - `Serialization` for malformed JSON or an unknown version
/// - `ArtifactTampered` if the digest does not match
pub fn artifact_from_json(json: &str) -> Result<PublicArtifact> {
    let artifact: PublicArtifact = serde_json::from_str(json)?;
    if artifact.version != constants::ARTIFACT_VERSION {
        return Err(BallotError::Serialization(format!(
            "unsupported artifact version {}",
            artifact.version
        )));
    }
    verify_artifact_digest(&artifact)?;
    Ok(artifact)
}

/// Pretty-printed JSON.
///
/// # Errors
/// Returns `Serialization` if encoding fails.
pub fn artifact_to_json(artifact: &PublicArtifact) -> Result<String> {
    Ok(serde_json::to_string_pretty(artifact)?)
}
