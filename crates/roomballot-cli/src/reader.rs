//! CSV input: `name,id,priority,choice_1..choice_k`.
//!
//! Rows are read flexibly so that a short row surfaces as a ballot
//! `RaggedPreferences` error instead of a CSV parse error.

use std::{fs::File, io, path::Path};

use anyhow::{Context, Result};
use roomballot_types::{BallotError, Participant, PrivateToken, RoomId};

pub fn read_people(path: &Path) -> Result<Vec<Participant>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open people file: {}", path.display()))?;
    read_people_from(file).with_context(|| format!("Failed to read people from {}", path.display()))
}

pub fn read_people_from<R: io::Read>(input: R) -> Result<Vec<Participant>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut people = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let field = |idx: usize, name: &'static str| {
            record
                .get(idx)
                .filter(|v| !v.is_empty())
                .ok_or(BallotError::MissingField {
                    participant: i,
                    field: name,
                })
        };

        let name = field(0, "name")?.to_string();
        let id = field(1, "id")?.to_string();
        let raw_priority = field(2, "priority")?;
        let priority = raw_priority
            .parse::<u32>()
            .map_err(|_| BallotError::InvalidPriority {
                participant: i,
                value: raw_priority.to_string(),
            })?;
        let preferences = record
            .iter()
            .skip(3)
            .filter(|c| !c.is_empty())
            .map(RoomId::from)
            .collect();

        people.push(Participant {
            name,
            id,
            priority,
            preferences,
        });
    }

    tracing::debug!(rows = people.len(), "Read people");
    Ok(people)
}

pub fn read_tokens(path: &Path) -> Result<Vec<PrivateToken>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open token file: {}", path.display()))?;
    read_tokens_from(file).with_context(|| format!("Failed to read tokens from {}", path.display()))
}

pub fn read_tokens_from<R: io::Read>(input: R) -> Result<Vec<PrivateToken>> {
    let mut reader = csv::Reader::from_reader(input);
    let tokens = reader
        .deserialize()
        .collect::<std::result::Result<Vec<PrivateToken>, _>>()?;
    Ok(tokens)
}
