//! Output files: results CSV, private token CSV, public artifact JSON.

use std::{fs, io, path::Path};

use anyhow::{Context, Result};
use roomballot_secrets::artifact_to_json;
use roomballot_types::{PrivateToken, PublicArtifact};
use serde::Serialize;

#[derive(Serialize)]
struct ResultRecord<'a> {
    secret_identity: &'a str,
    priority: u32,
    rank: Option<usize>,
    room: &'a str,
}

/// One row per participant, in publication order.
pub fn write_results_to<W: io::Write>(out: W, artifact: &PublicArtifact) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for row in &artifact.rows {
        writer.serialize(ResultRecord {
            secret_identity: &row.secret_identity,
            priority: row.priority,
            rank: row.rank,
            room: &row.outcome,
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_tokens_to<W: io::Write>(out: W, tokens: &[PrivateToken]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for token in tokens {
        writer.serialize(token)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_results(path: &Path, artifact: &PublicArtifact) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create results file: {}", path.display()))?;
    write_results_to(file, artifact)
}

pub fn write_tokens(path: &Path, tokens: &[PrivateToken]) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create token file: {}", path.display()))?;
    write_tokens_to(file, tokens)
}

pub fn write_public(path: &Path, artifact: &PublicArtifact) -> Result<()> {
    let json = artifact_to_json(artifact)?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write public artifact: {}", path.display()))
}
