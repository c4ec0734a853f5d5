//! Anonymizer: turns an identified [`Allocation`] into a publishable form.
//!
//! Every name is padded first, so a name that is too long aborts the run
//! before any secret material exists. Each participant then gets a fresh
//! one-time pad, rows are put into publication order, and the artifact is
//! sealed with its digest.

use chrono::Utc;
use rand::{CryptoRng, Rng};
use roomballot_types::{
    Allocation, BallotError, PrivateToken, PublicArtifact, PublicationIndex, PublishedRow, Result,
    constants,
};

use crate::{
    pad::{SecretRecord, pad_name},
    publish::{compute_artifact_digest, publication_order},
};

/// Public artifact plus the private tokens that unlock it.
#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    pub artifact: PublicArtifact,
    /// One per allocation row, in allocation row order.
    pub tokens: Vec<PrivateToken>,
}

#[derive(Debug, Clone, Copy)]
pub struct Anonymizer {
    name_width: usize,
}

impl Default for Anonymizer {
    fn default() -> Self {
        Self::new(constants::NAME_WIDTH)
    }
}

impl Anonymizer {
    #[must_use]
    pub fn new(name_width: usize) -> Self {
        Self { name_width }
    }

    #[must_use]
    pub fn name_width(&self) -> usize {
        self.name_width
    }

    /// Build the publication for `allocation`.
    ///
    /// `rng` must be entropy-backed in production; it is the only source of
    /// the one-time pads.
    ///
    /// # Errors
    /// Returns `NameTooLong` before generating anything if a name does not fit.
    pub fn anonymize<R: Rng + CryptoRng>(
        &self,
        allocation: &Allocation,
        rng: &mut R,
    ) -> Result<Publication> {
        if self.name_width == 0 {
            return Err(BallotError::InvalidConfig {
                reason: "name_width must be positive".into(),
            });
        }

        let padded = allocation
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| pad_name(i, &row.participant.name, self.name_width))
            .collect::<Result<Vec<_>>>()?;

        let order = publication_order(&padded);
        let records: Vec<SecretRecord> = padded
            .into_iter()
            .map(|name| SecretRecord::new(name, rng))
            .collect();

        let mut position = vec![0usize; order.len()];
        let rows = order
            .iter()
            .enumerate()
            .map(|(pos, &i)| {
                position[i] = pos;
                let row = &allocation.rows[i];
                PublishedRow {
                    index: PublicationIndex(pos),
                    ballot_position: row.ballot_position,
                    secret_identity: records[i].secret_hex(),
                    priority: row.participant.priority,
                    preferences: row.participant.preferences.clone(),
                    rank: row.placement.rank(),
                    outcome: row.placement.to_string(),
                }
            })
            .collect();

        let tokens = allocation
            .rows
            .iter()
            .zip(records)
            .zip(&position)
            .map(|((row, record), &pos)| PrivateToken {
                name: row.participant.name.clone(),
                id: row.participant.id.clone(),
                index: PublicationIndex(pos),
                pad: record.pad,
            })
            .collect();

        let mut artifact = PublicArtifact {
            version: constants::ARTIFACT_VERSION,
            generated_at: Utc::now(),
            name_width: self.name_width,
            choices: allocation.choices,
            rooms: allocation.rooms.clone(),
            params: allocation.params.clone(),
            total_cost: allocation.total_cost,
            rows,
            digest: String::new(),
        };
        artifact.digest = compute_artifact_digest(&artifact);

        tracing::info!(
            rows = artifact.rows.len(),
            name_width = self.name_width,
            digest = %artifact.digest,
            "Publication prepared"
        );

        Ok(Publication { artifact, tokens })
    }
}
